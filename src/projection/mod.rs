pub mod distribution;
pub mod engine;
pub mod error;
pub mod fit;
pub mod prior;
pub mod sensitivity;
pub mod store;

pub use distribution::WinProjection;
pub use engine::ProjectionEngine;
pub use error::ProjectionError;
pub use prior::{BetaPrior, PriorSpec};
pub use store::{HistoricalStore, StandingsStore};
