use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

pub mod import;
pub mod models;
use models::*;

use crate::projection::{HistoricalStore, StandingsStore};

/// Thread-safe SQLite connection pool (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        self.lock()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    // ── Historical ───────────────────────────────────────────────────────────

    /// Seasons already present in the historical table
    pub fn seasons(&self) -> Result<Vec<i32>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT year FROM historical ORDER BY year")?;
        let years = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i32>>>()?;
        Ok(years)
    }

    /// Rank and store one season of game logs. A season that is already
    /// stored is left untouched. Returns the number of rows inserted.
    pub fn import_season(&self, year: i32, teams: &[TeamSeason]) -> Result<usize> {
        if self.seasons()?.contains(&year) {
            info!("Season {} already stored, skipping", year);
            return Ok(0);
        }

        let mut rows = Vec::new();
        for season in teams {
            for log in &season.games {
                if log.game == 0 {
                    anyhow::bail!("{} {}: game numbers start at 1", year, season.short);
                }
                if log.wins.checked_add(log.losses) != Some(log.game) {
                    anyhow::bail!(
                        "{} {} game {}: record {}-{} does not add up to the games played",
                        year,
                        season.short,
                        log.game,
                        log.wins,
                        log.losses
                    );
                }
                rows.push(HistoricalRecord {
                    year,
                    team: season.team.clone(),
                    short: season.short.clone(),
                    game: log.game,
                    wins: log.wins,
                    losses: log.losses,
                    pct: f64::from(log.wins) / f64::from(log.game),
                    percentile: 0.0,
                });
            }
        }
        rank_percentiles(&mut rows);

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO historical (year, team, short, game, wins, losses, pct, percentile)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
            )?;
            for r in &rows {
                stmt.execute(params![
                    r.year,
                    r.team,
                    r.short,
                    r.game,
                    r.wins,
                    r.losses,
                    r.pct,
                    r.percentile,
                ])?;
            }
        }
        tx.commit()?;
        info!("Stored season {}: {} team-game rows", year, rows.len());
        Ok(rows.len())
    }

    // ── Current standings ────────────────────────────────────────────────────

    /// Append a standings snapshot. Teams whose record is unchanged since
    /// their latest snapshot are skipped. Returns the number of rows inserted.
    pub fn record_current(&self, standings: &[CurrentStanding]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        for s in standings {
            let latest: Option<(u32, u32)> = tx
                .query_row(
                    "SELECT wins, losses FROM current_standings WHERE short = ?1
                     ORDER BY recorded_at DESC, id DESC LIMIT 1",
                    params![s.short],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            if latest == Some((s.wins, s.losses)) {
                debug!("{} unchanged at {}-{}", s.short, s.wins, s.losses);
                continue;
            }
            let games = s
                .wins
                .checked_add(s.losses)
                .ok_or_else(|| anyhow!("{}: record {}-{} overflows", s.short, s.wins, s.losses))?;
            tx.execute(
                "INSERT INTO current_standings (short, team, name, wins, losses, games, ppg, papg, recorded_at)
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
                params![
                    s.short,
                    s.team,
                    s.name,
                    s.wins,
                    s.losses,
                    games,
                    s.ppg,
                    s.papg,
                    s.recorded_at,
                ],
            )?;
            inserted += 1;
        }
        tx.commit()?;
        Ok(inserted)
    }
}

impl HistoricalStore for Database {
    fn win_pcts_in_band(
        &self,
        min_percentile: f64,
        max_percentile: f64,
        game: u32,
    ) -> Result<Vec<f64>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT pct FROM historical WHERE percentile BETWEEN ?1 AND ?2 AND game = ?3",
        )?;
        let pcts = stmt
            .query_map(params![min_percentile, max_percentile, game], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<f64>>>()?;
        Ok(pcts)
    }
}

impl StandingsStore for Database {
    fn current_record(&self, team: &str) -> Result<Option<TeamRecord>> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT wins, losses FROM current_standings WHERE short = ?1
                 ORDER BY recorded_at DESC, id DESC LIMIT 1",
                params![team],
                |row| {
                    Ok(TeamRecord {
                        wins: row.get(0)?,
                        losses: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn list_teams(&self) -> Result<Vec<CurrentStanding>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT c.short, c.team, c.name, c.wins, c.losses, c.ppg, c.papg, c.recorded_at
             FROM current_standings c
             WHERE c.id = (SELECT id FROM current_standings WHERE short = c.short
                           ORDER BY recorded_at DESC, id DESC LIMIT 1)
             ORDER BY c.short",
        )?;
        let teams = stmt
            .query_map([], map_current)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(teams)
    }
}

// ── Ranking ──────────────────────────────────────────────────────────────────

/// Rank every row by `pct` within its (year, game) cohort, best first, and
/// store `rank / cohort_size` as a 0–100 percentile. Ties keep input order.
pub fn rank_percentiles(rows: &mut [HistoricalRecord]) {
    let mut cohorts: BTreeMap<(i32, u32), Vec<usize>> = BTreeMap::new();
    for (i, r) in rows.iter().enumerate() {
        cohorts.entry((r.year, r.game)).or_default().push(i);
    }
    for mut members in cohorts.into_values() {
        // stable sort keeps first-encountered order among equal pcts
        members.sort_by(|&a, &b| rows[b].pct.total_cmp(&rows[a].pct));
        let n = members.len() as f64;
        for (rank, i) in members.into_iter().enumerate() {
            rows[i].percentile = (rank + 1) as f64 / n * 100.0;
        }
    }
}

// ── SQL helpers ──────────────────────────────────────────────────────────────

fn map_current(row: &rusqlite::Row) -> rusqlite::Result<CurrentStanding> {
    Ok(CurrentStanding {
        short: row.get(0)?,
        team: row.get(1)?,
        name: row.get(2)?,
        wins: row.get(3)?,
        losses: row.get(4)?,
        ppg: row.get(5)?,
        papg: row.get(6)?,
        recorded_at: row.get(7)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS historical (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    year        INTEGER NOT NULL,
    team        TEXT    NOT NULL,
    short       TEXT    NOT NULL,
    game        INTEGER NOT NULL,
    wins        INTEGER NOT NULL,
    losses      INTEGER NOT NULL,
    pct         REAL    NOT NULL,
    percentile  REAL    NOT NULL
);

CREATE TABLE IF NOT EXISTS current_standings (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    short       TEXT    NOT NULL,
    team        TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    wins        INTEGER NOT NULL,
    losses      INTEGER NOT NULL,
    games       INTEGER NOT NULL,
    ppg         REAL,
    papg        REAL,
    recorded_at TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_historical_game_pctl ON historical(game, percentile);
CREATE INDEX IF NOT EXISTS idx_historical_year ON historical(year);
CREATE INDEX IF NOT EXISTS idx_current_short ON current_standings(short, recorded_at);
"#;
