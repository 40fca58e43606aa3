use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::projection::sensitivity::MAX_GRID_STEPS;

pub const DEFAULT_MIN_PERCENTILE: f64 = 40.0;
pub const DEFAULT_MAX_PERCENTILE: f64 = 60.0;
pub const DEFAULT_PRIOR_STRENGTH: f64 = 20.0;

/// Season win-total projections from historical standings
#[derive(Parser, Debug, Clone)]
#[command(name = "win-projector", version, about)]
pub struct Config {
    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "nba.db", global = true)]
    pub database_path: String,

    /// Games in a full season; also the historical checkpoint priors are fitted at
    #[arg(long, env = "TOTAL_GAMES", default_value = "82", global = true)]
    pub total_games: u32,

    /// Print results as JSON instead of a table
    #[arg(long, env = "OUTPUT_JSON", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Project a team from an empirical prior and its current record
    Project {
        /// Team short code, e.g. GSW
        team: String,

        /// Lower bound of the historical percentile band (0–100)
        #[arg(long, default_value_t = DEFAULT_MIN_PERCENTILE)]
        min_percentile: f64,

        /// Upper bound of the historical percentile band (0–100)
        #[arg(long, default_value_t = DEFAULT_MAX_PERCENTILE)]
        max_percentile: f64,

        /// Prior strength in game equivalents (alpha + beta)
        #[arg(long, default_value_t = DEFAULT_PRIOR_STRENGTH)]
        strength: f64,
    },

    /// Show the Beta prior for a point estimate (--p) or a percentile band
    Prior {
        /// Prior win probability; when absent the prior is fitted to the band
        #[arg(long, conflicts_with_all = ["min_percentile", "max_percentile"])]
        p: Option<f64>,

        #[arg(long, default_value_t = DEFAULT_MIN_PERCENTILE)]
        min_percentile: f64,

        #[arg(long, default_value_t = DEFAULT_MAX_PERCENTILE)]
        max_percentile: f64,

        #[arg(long, default_value_t = DEFAULT_PRIOR_STRENGTH)]
        strength: f64,
    },

    /// Project from a chosen win probability and strength, without the record update
    Custom {
        /// Prior win probability, strictly between 0 and 1
        #[arg(long)]
        p: f64,

        /// Prior strength in game equivalents
        #[arg(long, default_value_t = DEFAULT_PRIOR_STRENGTH)]
        strength: f64,

        /// Look the current record up by team code
        #[arg(long)]
        team: Option<String>,

        #[arg(long, requires = "losses")]
        wins: Option<u32>,

        #[arg(long, requires = "wins")]
        losses: Option<u32>,
    },

    /// Chance of reaching a win threshold across a grid of priors
    Sensitivity {
        team: String,

        /// Win total to reach
        #[arg(long)]
        threshold: u32,

        #[arg(long, default_value = "0.2")]
        pct_min: f64,

        #[arg(long, default_value = "0.8")]
        pct_max: f64,

        #[arg(long, default_value = "13")]
        pct_steps: usize,

        #[arg(long, default_value = "5")]
        strength_min: f64,

        #[arg(long, default_value = "80")]
        strength_max: f64,

        #[arg(long, default_value = "16")]
        strength_steps: usize,
    },

    /// List teams in the latest standings snapshot
    Teams,

    /// Load a JSON standings snapshot into the database
    Import { path: PathBuf },

    /// Serve the JSON API
    Serve {
        /// Listen address
        #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8080")]
        addr: String,
    },
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.total_games == 0 {
            anyhow::bail!("total_games must be positive");
        }
        match &self.command {
            Command::Project {
                min_percentile,
                max_percentile,
                strength,
                ..
            } => {
                validate_band(*min_percentile, *max_percentile)?;
                validate_strength(*strength)?;
            }
            Command::Prior {
                p,
                min_percentile,
                max_percentile,
                strength,
            } => {
                match p {
                    Some(p) if !(*p > 0.0 && *p < 1.0) => {
                        anyhow::bail!("p must be strictly between 0 and 1")
                    }
                    Some(_) => {}
                    None => validate_band(*min_percentile, *max_percentile)?,
                }
                validate_strength(*strength)?;
            }
            Command::Custom {
                p,
                strength,
                team,
                wins,
                ..
            } => {
                if !(*p > 0.0 && *p < 1.0) {
                    anyhow::bail!("p must be strictly between 0 and 1");
                }
                validate_strength(*strength)?;
                if team.is_none() && wins.is_none() {
                    anyhow::bail!("custom projection needs --team or --wins/--losses");
                }
            }
            Command::Sensitivity {
                pct_min,
                pct_max,
                pct_steps,
                strength_min,
                strength_max,
                strength_steps,
                ..
            } => {
                if !(*pct_min > 0.0 && *pct_max < 1.0 && pct_min <= pct_max) {
                    anyhow::bail!("prior pct range must satisfy 0 < min <= max < 1");
                }
                validate_strength(*strength_min)?;
                if strength_min > strength_max {
                    anyhow::bail!("strength_min must not exceed strength_max");
                }
                let steps = 1..=MAX_GRID_STEPS;
                if !steps.contains(pct_steps) || !steps.contains(strength_steps) {
                    anyhow::bail!("grid steps must be between 1 and {}", MAX_GRID_STEPS);
                }
            }
            Command::Teams | Command::Import { .. } | Command::Serve { .. } => {}
        }
        Ok(())
    }
}

fn validate_band(min: f64, max: f64) -> anyhow::Result<()> {
    if !(0.0..=100.0).contains(&min) || !(0.0..=100.0).contains(&max) {
        anyhow::bail!("percentiles must be between 0 and 100");
    }
    if min > max {
        anyhow::bail!("min_percentile must not exceed max_percentile");
    }
    Ok(())
}

fn validate_strength(strength: f64) -> anyhow::Result<()> {
    if !(strength > 0.0) {
        anyhow::bail!("prior strength must be positive");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["win-projector"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn project_defaults() {
        let config = parse(&["project", "GSW"]);
        assert_eq!(config.total_games, 82);
        match config.command {
            Command::Project {
                ref team,
                min_percentile,
                max_percentile,
                strength,
            } => {
                assert_eq!(team, "GSW");
                assert_eq!(min_percentile, 40.0);
                assert_eq!(max_percentile, 60.0);
                assert_eq!(strength, 20.0);
            }
            ref other => panic!("unexpected command {other:?}"),
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_band() {
        let config = parse(&[
            "project",
            "GSW",
            "--min-percentile",
            "70",
            "--max-percentile",
            "30",
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn custom_needs_a_record_source() {
        assert!(parse(&["custom", "--p", "0.6"]).validate().is_err());
        assert!(parse(&["custom", "--p", "0.6", "--team", "GSW"]).validate().is_ok());
        assert!(parse(&["custom", "--p", "0.6", "--wins", "3", "--losses", "1"])
            .validate()
            .is_ok());
        assert!(parse(&["custom", "--p", "1.0", "--team", "GSW"]).validate().is_err());
        // --wins without --losses is a parse error
        assert!(Config::try_parse_from(["win-projector", "custom", "--p", "0.5", "--wins", "3"]).is_err());
    }

    #[test]
    fn sensitivity_grid_bounds() {
        assert!(parse(&["sensitivity", "GSW", "--threshold", "50"]).validate().is_ok());
        assert!(parse(&["sensitivity", "GSW", "--threshold", "50", "--pct-min", "0"])
            .validate()
            .is_err());
        assert!(parse(&["sensitivity", "GSW", "--threshold", "50", "--strength-steps", "0"])
            .validate()
            .is_err());
        assert!(parse(&["sensitivity", "GSW", "--threshold", "50", "--pct-steps", "100000"])
            .validate()
            .is_err());
    }

    #[test]
    fn prior_point_estimate_conflicts_with_band() {
        assert!(parse(&["prior", "--p", "0.55"]).validate().is_ok());
        assert!(parse(&["prior"]).validate().is_ok());
        assert!(
            Config::try_parse_from(["win-projector", "prior", "--p", "0.5", "--min-percentile", "10"])
                .is_err()
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let config = parse(&["teams", "--json", "--total-games", "72"]);
        assert!(config.json);
        assert_eq!(config.total_games, 72);
    }
}
