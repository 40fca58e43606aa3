/// Failures of a single projection request.
///
/// Every variant is terminal for the call that produced it; the engine keeps
/// no state that would need rolling back.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("empty historical sample: {0}")]
    EmptySample(String),

    #[error("no current record for team {0:?}")]
    TeamNotFound(String),

    #[error("store read failed: {0:#}")]
    Store(anyhow::Error),
}

impl ProjectionError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ProjectionError::InvalidParameter(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
