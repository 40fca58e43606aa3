use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod db;
mod projection;
mod report;

use api::AppState;
use config::{Command, Config};
use db::Database;
use projection::sensitivity::grid_axis;
use projection::{PriorSpec, ProjectionEngine};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    config.validate()?;

    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    // Both store roles are served by the same SQLite handle
    let store = Arc::new(db.clone());
    let engine =
        ProjectionEngine::new(store.clone(), store).with_total_games(config.total_games);

    let output = match config.command.clone() {
        Command::Project {
            team,
            min_percentile,
            max_percentile,
            strength,
        } => {
            let proj = engine.project(min_percentile, max_percentile, strength, &team)?;
            if config.json {
                report::to_json(&proj)?
            } else {
                report::projection_table(&proj)
            }
        }
        Command::Prior {
            p,
            min_percentile,
            max_percentile,
            strength,
        } => {
            let spec = match p {
                Some(p) => PriorSpec::PointEstimate { p, strength },
                None => PriorSpec::Empirical {
                    min_percentile,
                    max_percentile,
                    strength,
                },
            };
            let prior = engine.prior(&spec)?;
            if config.json {
                report::to_json(&report::PriorSummary::new(spec, &prior))?
            } else {
                report::prior_table(&prior)
            }
        }
        Command::Custom {
            p,
            strength,
            team,
            wins,
            losses,
        } => {
            let record = engine.resolve_record(team.as_deref(), wins, losses)?;
            let proj = engine.custom_projection(p, strength, record)?;
            if config.json {
                report::to_json(&proj)?
            } else {
                report::projection_table(&proj)
            }
        }
        Command::Sensitivity {
            team,
            threshold,
            pct_min,
            pct_max,
            pct_steps,
            strength_min,
            strength_max,
            strength_steps,
        } => {
            let pcts = grid_axis(pct_min, pct_max, pct_steps)?;
            let strengths = grid_axis(strength_min, strength_max, strength_steps)?;
            let cells = engine.sensitivity(&team, threshold, &pcts, &strengths)?;
            if config.json {
                report::to_json(&cells)?
            } else {
                report::sensitivity_table(&cells)
            }
        }
        Command::Teams => {
            let teams = engine.list_teams()?;
            if config.json {
                report::to_json(&teams)?
            } else {
                report::teams_table(&teams)
            }
        }
        Command::Import { path } => {
            let snapshot = db::import::load_snapshot(&path)?;
            let summary = db.import_snapshot(&snapshot)?;
            if config.json {
                report::to_json(&summary)?
            } else {
                report::import_summary(&summary)
            }
        }
        Command::Serve { addr } => {
            let app = api::router(AppState { engine });
            let addr: SocketAddr = addr.parse()?;
            info!("API listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
            return Ok(());
        }
    };

    print!("{output}");
    if config.json {
        println!();
    }
    Ok(())
}
