use std::sync::Arc;

use tracing::debug;

use super::distribution::{compute_distribution, WinProjection, DEFAULT_TOTAL_GAMES};
use super::error::{ProjectionError, Result};
use super::fit::fit_beta;
use super::prior::{BetaPrior, PriorSpec};
use super::sensitivity::{sensitivity_grid, SensitivityCell};
use super::store::{HistoricalStore, StandingsStore};
use crate::db::models::{CurrentStanding, TeamRecord};

/// Projects season win totals from an empirical prior and a current record.
///
/// Holds only store handles and the season length: every call re-fetches
/// and re-fits, so clones can serve requests concurrently.
#[derive(Clone)]
pub struct ProjectionEngine {
    historical: Arc<dyn HistoricalStore>,
    standings: Arc<dyn StandingsStore>,
    total_games: u32,
}

impl ProjectionEngine {
    pub fn new(historical: Arc<dyn HistoricalStore>, standings: Arc<dyn StandingsStore>) -> Self {
        ProjectionEngine {
            historical,
            standings,
            total_games: DEFAULT_TOTAL_GAMES,
        }
    }

    pub fn with_total_games(mut self, total_games: u32) -> Self {
        self.total_games = total_games;
        self
    }

    /// Fit a prior to historical teams ranked inside the percentile band.
    pub fn empirical_prior(
        &self,
        min_percentile: f64,
        max_percentile: f64,
        strength: f64,
    ) -> Result<BetaPrior> {
        check_band(min_percentile, max_percentile)?;
        let sample = self
            .historical
            .win_pcts_in_band(min_percentile, max_percentile, self.total_games)
            .map_err(ProjectionError::Store)?;
        debug!(
            min_percentile,
            max_percentile,
            n = sample.len(),
            "fetched historical sample"
        );
        if sample.is_empty() {
            return Err(ProjectionError::EmptySample(format!(
                "no {}-game records between the {min_percentile} and {max_percentile} percentiles",
                self.total_games
            )));
        }
        fit_beta(&sample, strength)
    }

    pub fn prior(&self, spec: &PriorSpec) -> Result<BetaPrior> {
        match *spec {
            PriorSpec::PointEstimate { p, strength } => BetaPrior::from_point_estimate(p, strength),
            PriorSpec::Empirical {
                min_percentile,
                max_percentile,
                strength,
            } => self.empirical_prior(min_percentile, max_percentile, strength),
        }
    }

    pub fn lookup_current(&self, team: &str) -> Result<TeamRecord> {
        self.standings
            .current_record(team)
            .map_err(ProjectionError::Store)?
            .ok_or_else(|| ProjectionError::TeamNotFound(team.to_string()))
    }

    /// An explicit record wins over a lookup; otherwise `team` is looked up.
    pub fn resolve_record(
        &self,
        team: Option<&str>,
        wins: Option<u32>,
        losses: Option<u32>,
    ) -> Result<TeamRecord> {
        match (wins, losses, team) {
            (Some(wins), Some(losses), _) => Ok(TeamRecord { wins, losses }),
            (None, None, Some(team)) => self.lookup_current(team),
            _ => Err(ProjectionError::invalid(
                "give either both wins and losses, or a team code",
            )),
        }
    }

    pub fn list_teams(&self) -> Result<Vec<CurrentStanding>> {
        self.standings.list_teams().map_err(ProjectionError::Store)
    }

    /// Empirical prior for the band, updated with the team's record.
    ///
    /// Wins and losses are added to alpha and beta as raw pseudo-counts.
    pub fn project(
        &self,
        min_percentile: f64,
        max_percentile: f64,
        strength: f64,
        team: &str,
    ) -> Result<WinProjection> {
        let prior = self.empirical_prior(min_percentile, max_percentile, strength)?;
        let record = self.lookup_current(team)?;
        let posterior = prior.observe(record.wins, record.losses)?;
        debug!(
            team,
            prior_alpha = prior.alpha(),
            prior_beta = prior.beta(),
            alpha = posterior.alpha(),
            beta = posterior.beta(),
            "updated prior with current record"
        );
        compute_distribution(
            posterior.alpha(),
            posterior.beta(),
            record.wins,
            record.losses,
            self.total_games,
        )
    }

    /// Point-estimate prior applied straight to `record`, without the
    /// pseudo-count update.
    pub fn custom_projection(
        &self,
        p: f64,
        strength: f64,
        record: TeamRecord,
    ) -> Result<WinProjection> {
        let prior = BetaPrior::from_point_estimate(p, strength)?;
        compute_distribution(
            prior.alpha(),
            prior.beta(),
            record.wins,
            record.losses,
            self.total_games,
        )
    }

    pub fn sensitivity(
        &self,
        team: &str,
        threshold: u32,
        pcts: &[f64],
        strengths: &[f64],
    ) -> Result<Vec<SensitivityCell>> {
        let record = self.lookup_current(team)?;
        sensitivity_grid(record, threshold, pcts, strengths, self.total_games)
    }
}

fn check_band(min_percentile: f64, max_percentile: f64) -> Result<()> {
    let in_range = |x: f64| (0.0..=100.0).contains(&x);
    if !in_range(min_percentile) || !in_range(max_percentile) || min_percentile > max_percentile {
        return Err(ProjectionError::invalid(format!(
            "percentile band [{min_percentile}, {max_percentile}] must satisfy 0 <= min <= max <= 100"
        )));
    }
    Ok(())
}
