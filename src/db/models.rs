use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cumulative record of one team after its `game`-th game of a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLog {
    pub game: u32,
    pub wins: u32,
    pub losses: u32,
}

/// Game-by-game log of one team over one season, as handed to ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSeason {
    /// Lower-snake-case team name, e.g. "golden_state_warriors"
    pub team: String,
    /// Three-letter code, e.g. "GSW"
    pub short: String,
    pub games: Vec<GameLog>,
}

/// A ranked row of the `historical` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub year: i32,
    pub team: String,
    pub short: String,
    pub game: u32,
    pub wins: u32,
    pub losses: u32,
    /// wins / game
    pub pct: f64,
    /// Rank within the (year, game) cohort, best team lowest, on a 0–100 scale
    pub percentile: f64,
}

/// One team's line in a current-standings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentStanding {
    pub short: String,
    pub team: String,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    /// Points per game
    pub ppg: Option<f64>,
    /// Points allowed per game
    pub papg: Option<f64>,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl CurrentStanding {
    pub fn record(&self) -> TeamRecord {
        TeamRecord {
            wins: self.wins,
            losses: self.losses,
        }
    }
}

/// Current (wins, losses) of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
}

impl TeamRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.losses
    }
}
