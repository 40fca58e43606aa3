use anyhow::Result;

use crate::db::models::{CurrentStanding, TeamRecord};

/// Read access to ranked historical team-seasons.
pub trait HistoricalStore: Send + Sync {
    /// Win percentages of every team whose percentile rank at `game` games
    /// falls inside `[min_percentile, max_percentile]` (both on a 0–100 scale).
    fn win_pcts_in_band(
        &self,
        min_percentile: f64,
        max_percentile: f64,
        game: u32,
    ) -> Result<Vec<f64>>;
}

/// Read access to the latest current-season standings.
pub trait StandingsStore: Send + Sync {
    /// Current record for `team` (short code), or `None` if unknown.
    fn current_record(&self, team: &str) -> Result<Option<TeamRecord>>;

    fn list_teams(&self) -> Result<Vec<CurrentStanding>>;
}
