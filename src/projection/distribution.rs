use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF};

use super::error::{ProjectionError, Result};

/// Full season length, and the historical checkpoint priors are fitted at.
pub const DEFAULT_TOTAL_GAMES: u32 = 82;

/// One row of a projection: chance (in percent) of finishing with at least
/// `wins` wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedTotal {
    pub wins: u32,
    pub probability_pct: f64,
}

/// Ordered by ascending win total; probabilities never increase along it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WinProjection {
    entries: Vec<ProjectedTotal>,
}

impl WinProjection {
    pub fn entries(&self) -> &[ProjectedTotal] {
        &self.entries
    }

    /// Probability (percent) of ending with at least `wins` wins. Totals
    /// already banked are certain; totals past the schedule are impossible.
    pub fn at_least(&self, wins: u32) -> f64 {
        let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) else {
            return 0.0;
        };
        if wins <= first.wins {
            100.0
        } else if wins > last.wins {
            0.0
        } else {
            self.entries[(wins - first.wins) as usize].probability_pct
        }
    }
}

/// Survival distribution over final win totals for the rest of the season.
///
/// For each additional win count `w` in `0..=remaining`, the probability is
/// `P(p >= w / remaining)` under Beta(alpha, beta), rounded to four decimals
/// and expressed as a percentage. With nothing left to play the single entry
/// is evaluated at 0.
pub fn compute_distribution(
    alpha: f64,
    beta: f64,
    current_wins: u32,
    current_losses: u32,
    total_games: u32,
) -> Result<WinProjection> {
    if !(alpha > 0.0 && beta > 0.0) {
        return Err(ProjectionError::invalid(format!(
            "Beta({alpha}, {beta}) needs positive parameters"
        )));
    }
    let played = current_wins
        .checked_add(current_losses)
        .ok_or_else(|| ProjectionError::invalid("record overflows u32"))?;
    let remaining = total_games.checked_sub(played).ok_or_else(|| {
        ProjectionError::invalid(format!(
            "record {current_wins}-{current_losses} exceeds a {total_games}-game season"
        ))
    })?;

    let dist = Beta::new(alpha, beta)
        .map_err(|e| ProjectionError::invalid(format!("Beta({alpha}, {beta}): {e}")))?;

    let entries = (0..=remaining)
        .map(|w| {
            let remaining_pct = if remaining == 0 {
                0.0
            } else {
                f64::from(w) / f64::from(remaining)
            };
            let prob = dist.sf(remaining_pct).clamp(0.0, 1.0);
            ProjectedTotal {
                wins: current_wins + w,
                probability_pct: round4(prob) * 100.0,
            }
        })
        .collect();

    Ok(WinProjection { entries })
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
