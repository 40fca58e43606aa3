//! Maximum-likelihood Beta fit over historical win percentages.
//!
//! Support is fixed to [0, 1] (no location/scale shift), so the likelihood
//! equations reduce to
//!
//!   ψ(α) − ψ(α+β) = mean(ln x)
//!   ψ(β) − ψ(α+β) = mean(ln(1 − x))
//!
//! solved with Newton's method from a method-of-moments starting point.

use statrs::function::gamma::digamma;
use tracing::debug;

use super::error::{ProjectionError, Result};
use super::prior::{check_strength, BetaPrior};

/// Observations at exactly 0 or 1 have zero likelihood under any Beta, so
/// they are pulled this far inside the support before taking logs.
const EDGE_EPS: f64 = 1e-6;
const MAX_ITERS: usize = 200;
const TOLERANCE: f64 = 1e-10;
const MAX_HALVINGS: usize = 64;

/// Fit Beta parameters to `sample` and rescale them to `prior_strength`.
///
/// The returned prior carries the fitted mean with the caller's confidence
/// weight. A sample with no spread has no finite MLE; its mean is used
/// directly since the concentration is replaced by the rescale anyway.
pub fn fit_beta(sample: &[f64], prior_strength: f64) -> Result<BetaPrior> {
    check_strength(prior_strength)?;
    if sample.is_empty() {
        return Err(ProjectionError::EmptySample(
            "no observations to fit".to_string(),
        ));
    }
    if let Some(bad) = sample.iter().find(|x| !(0.0..=1.0).contains(*x)) {
        return Err(ProjectionError::invalid(format!(
            "win percentage {bad} outside [0, 1]"
        )));
    }

    let (alpha, beta) = match fit_mle(sample)? {
        Some(fitted) => fitted,
        None => {
            let mean = sample.iter().sum::<f64>() / sample.len() as f64;
            let mean = mean.clamp(EDGE_EPS, 1.0 - EDGE_EPS);
            return BetaPrior::from_point_estimate(mean, prior_strength);
        }
    };
    debug!(n = sample.len(), alpha, beta, "fitted beta prior");

    BetaPrior::new(alpha, beta)?.rescaled(prior_strength)
}

/// Raw MLE. `Ok(None)` when the sample has zero variance.
fn fit_mle(sample: &[f64]) -> Result<Option<(f64, f64)>> {
    let n = sample.len() as f64;
    let clipped: Vec<f64> = sample
        .iter()
        .map(|x| x.clamp(EDGE_EPS, 1.0 - EDGE_EPS))
        .collect();

    let mean = clipped.iter().sum::<f64>() / n;
    let var = clipped.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    if var <= f64::EPSILON {
        return Ok(None);
    }

    let ln_x = clipped.iter().map(|x| x.ln()).sum::<f64>() / n;
    let ln_1mx = clipped.iter().map(|x| (1.0 - x).ln()).sum::<f64>() / n;

    // Method of moments is only valid while var < mean * (1 - mean).
    let common = mean * (1.0 - mean) / var - 1.0;
    let (mut a, mut b) = if common > 0.0 {
        (mean * common, (1.0 - mean) * common)
    } else {
        (mean, 1.0 - mean)
    };

    for _ in 0..MAX_ITERS {
        let psi_ab = digamma(a + b);
        let f1 = digamma(a) - psi_ab - ln_x;
        let f2 = digamma(b) - psi_ab - ln_1mx;
        if f1.abs() < TOLERANCE && f2.abs() < TOLERANCE {
            return Ok(Some((a, b)));
        }

        let t_ab = trigamma(a + b);
        let j11 = trigamma(a) - t_ab;
        let j22 = trigamma(b) - t_ab;
        let j12 = -t_ab;
        let det = j11 * j22 - j12 * j12;
        if !det.is_finite() || det == 0.0 {
            break;
        }
        let da = -(j22 * f1 - j12 * f2) / det;
        let db = -(j11 * f2 - j12 * f1) / det;
        let Some((next_a, next_b)) = damped_step(a, b, da, db) else {
            break;
        };
        a = next_a;
        b = next_b;
    }

    Err(ProjectionError::invalid(format!(
        "beta fit did not converge over {} observations",
        sample.len()
    )))
}

/// Take the Newton step, halving it until both parameters stay positive.
/// `None` when the step is not finite or cannot be shrunk enough.
fn damped_step(a: f64, b: f64, mut da: f64, mut db: f64) -> Option<(f64, f64)> {
    if !(da.is_finite() && db.is_finite()) {
        return None;
    }
    for _ in 0..MAX_HALVINGS {
        let (next_a, next_b) = (a + da, b + db);
        if next_a > 0.0 && next_b > 0.0 {
            return (next_a.is_finite() && next_b.is_finite()).then_some((next_a, next_b));
        }
        da *= 0.5;
        db *= 0.5;
    }
    None
}

/// ψ₁(x): recurrence up to x ≥ 10, then the asymptotic series.
fn trigamma(x: f64) -> f64 {
    let mut x = x;
    let mut acc = 0.0;
    while x < 10.0 {
        acc += 1.0 / (x * x);
        x += 1.0;
    }
    let inv = 1.0 / x;
    let inv2 = inv * inv;
    acc + inv + 0.5 * inv2 + inv * inv2 * (1.0 / 6.0 - inv2 * (1.0 / 30.0 - inv2 / 42.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statrs::distribution::{Beta, Continuous};

    #[test]
    fn damped_step_rejects_runaway_steps() {
        assert_eq!(damped_step(2.0, 3.0, f64::NEG_INFINITY, 1.0), None);
        assert_eq!(damped_step(2.0, 3.0, 0.5, f64::NAN), None);
        // halved until positive: 2 - 4 -> 2 - 2 -> 2 - 1
        assert_eq!(damped_step(2.0, 3.0, -4.0, 0.0), Some((1.0, 3.0)));
        // never positive within the halving budget
        assert_eq!(damped_step(0.0, 3.0, -1.0, 0.0), None);
    }

    #[test]
    fn trigamma_known_values() {
        let pi2 = std::f64::consts::PI * std::f64::consts::PI;
        assert_relative_eq!(trigamma(1.0), pi2 / 6.0, epsilon = 1e-9);
        assert_relative_eq!(trigamma(0.5), pi2 / 2.0, epsilon = 1e-9);
        assert_relative_eq!(trigamma(2.0), pi2 / 6.0 - 1.0, epsilon = 1e-9);
    }

    #[test]
    fn fit_rescales_to_requested_strength() {
        let sample = [0.60, 0.65, 0.55, 0.70, 0.50];
        let prior = fit_beta(&sample, 20.0).unwrap();
        assert_relative_eq!(prior.strength(), 20.0, epsilon = 1e-9);
        assert!((prior.mean() - 0.60).abs() < 0.01, "mean {}", prior.mean());
    }

    #[test]
    fn mle_beats_nearby_parameters_on_likelihood() {
        let sample = [0.31, 0.45, 0.52, 0.38, 0.61, 0.49, 0.42, 0.57, 0.35, 0.50];
        let (a, b) = fit_mle(&sample).unwrap().unwrap();
        let loglik = |a: f64, b: f64| {
            let d = Beta::new(a, b).unwrap();
            sample.iter().map(|x| d.ln_pdf(*x)).sum::<f64>()
        };
        let best = loglik(a, b);
        for (da, db) in [(0.5, 0.0), (-0.5, 0.0), (0.0, 0.5), (0.0, -0.5), (0.3, 0.3)] {
            assert!(best >= loglik(a + da, b + db));
        }
    }

    #[test]
    fn recovers_parameters_of_a_wide_sample() {
        // Quantile grid of Beta(2, 5): MLE should land near the generator.
        let source = Beta::new(2.0, 5.0).unwrap();
        let sample: Vec<f64> = (1..400)
            .map(|i| {
                use statrs::distribution::ContinuousCDF;
                source.inverse_cdf(i as f64 / 400.0)
            })
            .collect();
        let (a, b) = fit_mle(&sample).unwrap().unwrap();
        assert!((a - 2.0).abs() < 0.2, "alpha {a}");
        assert!((b - 5.0).abs() < 0.5, "beta {b}");
    }

    #[test]
    fn empty_sample_is_rejected() {
        assert!(matches!(
            fit_beta(&[], 20.0),
            Err(ProjectionError::EmptySample(_))
        ));
    }

    #[test]
    fn non_positive_strength_is_rejected() {
        assert!(matches!(
            fit_beta(&[0.5, 0.6], 0.0),
            Err(ProjectionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn out_of_range_observation_is_rejected() {
        assert!(fit_beta(&[0.5, 1.2], 10.0).is_err());
    }

    #[test]
    fn constant_sample_uses_its_mean() {
        let prior = fit_beta(&[0.5, 0.5, 0.5], 30.0).unwrap();
        assert_relative_eq!(prior.mean(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(prior.strength(), 30.0, epsilon = 1e-9);

        let single = fit_beta(&[0.72], 10.0).unwrap();
        assert_relative_eq!(single.mean(), 0.72, epsilon = 1e-12);
    }
}
