//! Loading standings snapshots from JSON into the store.
//!
//! ```json
//! {
//!   "seasons": [{ "year": 2016, "teams": [{ "team": "...", "short": "GSW",
//!                 "games": [{ "game": 1, "wins": 1, "losses": 0 }] }] }],
//!   "current": [{ "short": "GSW", "team": "...", "name": "...",
//!                 "wins": 41, "losses": 10, "ppg": 117.1, "papg": 104.4 }]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::models::{CurrentStanding, TeamSeason};
use super::Database;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonImport {
    pub year: i32,
    pub teams: Vec<TeamSeason>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub seasons: Vec<SeasonImport>,
    #[serde(default)]
    pub current: Vec<CurrentStanding>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub seasons_added: usize,
    pub historical_rows: usize,
    pub current_rows: usize,
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
}

impl Database {
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        for season in &snapshot.seasons {
            let rows = self.import_season(season.year, &season.teams)?;
            if rows > 0 {
                summary.seasons_added += 1;
                summary.historical_rows += rows;
            }
        }
        summary.current_rows = self.record_current(&snapshot.current)?;
        info!(
            "Imported {} season(s) ({} rows), {} current standing(s)",
            summary.seasons_added, summary.historical_rows, summary.current_rows
        );
        Ok(summary)
    }
}
