//! How a projection reacts to the choice of prior.
//!
//! Sweeps a grid of prior means and prior strengths (in game equivalents),
//! updates each point-estimate prior with the team's record, and reports the
//! chance of finishing with at least a threshold number of wins.

use serde::{Deserialize, Serialize};

use super::distribution::compute_distribution;
use super::error::{ProjectionError, Result};
use super::prior::BetaPrior;
use crate::db::models::TeamRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCell {
    /// Prior expected win percentage.
    pub prior_pct: f64,
    /// Prior strength in game equivalents.
    pub strength: f64,
    /// Chance (percent) of reaching the threshold.
    pub probability_pct: f64,
}

/// Largest number of points accepted on either axis of the grid.
pub const MAX_GRID_STEPS: usize = 200;

/// One cell per `(pct, strength)` pair, pcts varying slowest.
pub fn sensitivity_grid(
    record: TeamRecord,
    threshold: u32,
    pcts: &[f64],
    strengths: &[f64],
    total_games: u32,
) -> Result<Vec<SensitivityCell>> {
    if pcts.is_empty() || strengths.is_empty() {
        return Err(ProjectionError::invalid(
            "sensitivity grid needs at least one prior mean and one strength",
        ));
    }

    check_axis_len(pcts.len())?;
    check_axis_len(strengths.len())?;
    let capacity = pcts
        .len()
        .checked_mul(strengths.len())
        .ok_or_else(|| ProjectionError::invalid("sensitivity grid is too large"))?;

    let mut cells = Vec::with_capacity(capacity);
    for &prior_pct in pcts {
        for &strength in strengths {
            let posterior = BetaPrior::from_point_estimate(prior_pct, strength)?
                .observe(record.wins, record.losses)?;
            let projection = compute_distribution(
                posterior.alpha(),
                posterior.beta(),
                record.wins,
                record.losses,
                total_games,
            )?;
            cells.push(SensitivityCell {
                prior_pct,
                strength,
                probability_pct: projection.at_least(threshold),
            });
        }
    }
    Ok(cells)
}

fn check_axis_len(steps: usize) -> Result<()> {
    if (1..=MAX_GRID_STEPS).contains(&steps) {
        Ok(())
    } else {
        Err(ProjectionError::invalid(format!(
            "grid axis needs between 1 and {MAX_GRID_STEPS} steps, got {steps}"
        )))
    }
}

/// `linspace` for one grid axis, refusing step counts outside
/// `1..=MAX_GRID_STEPS` before anything is allocated.
pub fn grid_axis(start: f64, end: f64, steps: usize) -> Result<Vec<f64>> {
    check_axis_len(steps)?;
    Ok(linspace(start, end, steps))
}

/// Evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (steps - 1) as f64;
            (0..steps).map(|i| start + step * i as f64).collect()
        }
    }
}
