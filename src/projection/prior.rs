//! Beta priors over a team's true win probability.
//!
//! A prior is built one of two ways: from a point estimate plus a confidence
//! weight, or empirically from historical standings (see [`super::fit`]).
//! Both paths produce the same immutable [`BetaPrior`].

use serde::{Deserialize, Serialize};

use super::error::{ProjectionError, Result};

/// Beta(alpha, beta) belief over a win probability. Both parameters are > 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BetaPrior {
    alpha: f64,
    beta: f64,
}

impl BetaPrior {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ProjectionError::invalid(format!("alpha must be positive, got {alpha}")));
        }
        if !(beta.is_finite() && beta > 0.0) {
            return Err(ProjectionError::invalid(format!("beta must be positive, got {beta}")));
        }
        Ok(BetaPrior { alpha, beta })
    }

    /// Moment-matching shortcut: `alpha = p * strength`, `beta = (1 - p) * strength`.
    ///
    /// Not a likelihood fit. Meant for callers that already know the mean they
    /// want and only need to choose how heavily it should weigh.
    pub fn from_point_estimate(p: f64, strength: f64) -> Result<Self> {
        if !(p > 0.0 && p < 1.0) {
            return Err(ProjectionError::invalid(format!(
                "point estimate must lie in (0, 1), got {p}"
            )));
        }
        check_strength(strength)?;
        BetaPrior::new(p * strength, (1.0 - p) * strength)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Implied mean win probability.
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Prior strength (`alpha + beta`), measured in game equivalents.
    pub fn strength(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Same mean, new concentration.
    pub fn rescaled(&self, target_strength: f64) -> Result<Self> {
        let (alpha, beta) = rescale(self.alpha, self.beta, target_strength)?;
        BetaPrior::new(alpha, beta)
    }

    /// Conjugate Beta-Binomial update: each win adds one to alpha, each loss
    /// one to beta. The counts are not reweighted against the prior strength.
    pub fn observe(&self, wins: u32, losses: u32) -> Result<Self> {
        BetaPrior::new(self.alpha + f64::from(wins), self.beta + f64::from(losses))
    }
}

/// Rescale a Beta pair to `target_strength` total mass, keeping `alpha / (alpha + beta)`.
pub fn rescale(alpha: f64, beta: f64, target_strength: f64) -> Result<(f64, f64)> {
    if !(alpha > 0.0 && beta > 0.0) {
        return Err(ProjectionError::invalid(format!(
            "cannot rescale Beta({alpha}, {beta}): parameters must be positive"
        )));
    }
    check_strength(target_strength)?;
    let scale = target_strength / (alpha + beta);
    Ok((alpha * scale, beta * scale))
}

pub(crate) fn check_strength(strength: f64) -> Result<()> {
    if strength.is_finite() && strength > 0.0 {
        Ok(())
    } else {
        Err(ProjectionError::invalid(format!(
            "prior strength must be positive, got {strength}"
        )))
    }
}

/// The two ways a caller can ask for a prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorSpec {
    /// Known mean win probability with a chosen strength.
    PointEstimate { p: f64, strength: f64 },
    /// Fitted to historical teams inside a percentile band, then rescaled.
    Empirical {
        min_percentile: f64,
        max_percentile: f64,
        strength: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_estimate_matches_mean_and_strength() {
        for &(p, n) in &[(0.15, 30.0), (0.5, 1.0), (0.73, 82.0), (0.01, 500.0)] {
            let prior = BetaPrior::from_point_estimate(p, n).unwrap();
            assert_relative_eq!(prior.mean(), p, epsilon = 1e-12);
            assert_relative_eq!(prior.strength(), n, epsilon = 1e-9);
        }
    }

    #[test]
    fn point_estimate_rejects_out_of_range() {
        assert!(matches!(
            BetaPrior::from_point_estimate(0.0, 10.0),
            Err(ProjectionError::InvalidParameter(_))
        ));
        assert!(matches!(
            BetaPrior::from_point_estimate(1.0, 10.0),
            Err(ProjectionError::InvalidParameter(_))
        ));
        assert!(matches!(
            BetaPrior::from_point_estimate(0.5, 0.0),
            Err(ProjectionError::InvalidParameter(_))
        ));
        assert!(BetaPrior::from_point_estimate(f64::NAN, 10.0).is_err());
    }

    #[test]
    fn rescale_preserves_mean() {
        let (a, b) = rescale(28.2, 18.8, 20.0).unwrap();
        assert_relative_eq!(a + b, 20.0, epsilon = 1e-12);
        assert_relative_eq!(a / (a + b), 28.2 / 47.0, epsilon = 1e-12);

        let (a, b) = rescale(0.3, 0.9, 500.0).unwrap();
        assert_relative_eq!(a + b, 500.0, epsilon = 1e-9);
        assert_relative_eq!(a / (a + b), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn rescale_rejects_non_positive_inputs() {
        assert!(rescale(0.0, 1.0, 10.0).is_err());
        assert!(rescale(1.0, -1.0, 10.0).is_err());
        assert!(rescale(1.0, 1.0, 0.0).is_err());
        assert!(rescale(1.0, 1.0, -3.0).is_err());
    }

    #[test]
    fn new_rejects_non_positive_mass() {
        assert!(BetaPrior::new(0.0, 1.0).is_err());
        assert!(BetaPrior::new(1.0, 0.0).is_err());
        assert!(BetaPrior::new(f64::INFINITY, 1.0).is_err());
        assert!(BetaPrior::new(2.0, 3.0).is_ok());
    }

    #[test]
    fn observe_adds_raw_counts() {
        let prior = BetaPrior::new(12.0, 8.0).unwrap();
        let post = prior.observe(41, 10).unwrap();
        assert_relative_eq!(post.alpha(), 53.0);
        assert_relative_eq!(post.beta(), 18.0);
        // the receiver is unchanged
        assert_relative_eq!(prior.alpha(), 12.0);
    }

    #[test]
    fn prior_spec_serializes_with_kind_tag() {
        let spec = PriorSpec::PointEstimate { p: 0.6, strength: 20.0 };
        let json = serde_json::to_value(spec).unwrap();
        assert_eq!(json["kind"], "point_estimate");
    }
}
