use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::config::{DEFAULT_MAX_PERCENTILE, DEFAULT_MIN_PERCENTILE, DEFAULT_PRIOR_STRENGTH};
use crate::db::models::CurrentStanding;
use crate::projection::sensitivity::{grid_axis, SensitivityCell};
use crate::projection::{ProjectionEngine, ProjectionError, WinProjection};

#[derive(Clone)]
pub struct AppState {
    pub engine: ProjectionEngine,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Build the Axum router for the JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/teams", get(teams_handler))
        .route("/api/projection", get(projection_handler))
        .route("/api/custom-projection", get(custom_projection_handler))
        .route("/api/sensitivity", get(sensitivity_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn default_min_percentile() -> f64 {
    DEFAULT_MIN_PERCENTILE
}

fn default_max_percentile() -> f64 {
    DEFAULT_MAX_PERCENTILE
}

fn default_strength() -> f64 {
    DEFAULT_PRIOR_STRENGTH
}

#[derive(Debug, Deserialize)]
pub struct ProjectionQuery {
    pub team: String,
    #[serde(default = "default_min_percentile")]
    pub min_percentile: f64,
    #[serde(default = "default_max_percentile")]
    pub max_percentile: f64,
    #[serde(default = "default_strength")]
    pub strength: f64,
}

#[derive(Debug, Deserialize)]
pub struct CustomQuery {
    pub p: f64,
    #[serde(default = "default_strength")]
    pub strength: f64,
    pub team: Option<String>,
    pub wins: Option<u32>,
    pub losses: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SensitivityQuery {
    pub team: String,
    pub threshold: u32,
    #[serde(default = "SensitivityQuery::default_pct_min")]
    pub pct_min: f64,
    #[serde(default = "SensitivityQuery::default_pct_max")]
    pub pct_max: f64,
    #[serde(default = "SensitivityQuery::default_pct_steps")]
    pub pct_steps: usize,
    #[serde(default = "SensitivityQuery::default_strength_min")]
    pub strength_min: f64,
    #[serde(default = "SensitivityQuery::default_strength_max")]
    pub strength_max: f64,
    #[serde(default = "SensitivityQuery::default_strength_steps")]
    pub strength_steps: usize,
}

impl SensitivityQuery {
    fn default_pct_min() -> f64 {
        0.2
    }
    fn default_pct_max() -> f64 {
        0.8
    }
    fn default_pct_steps() -> usize {
        13
    }
    fn default_strength_min() -> f64 {
        5.0
    }
    fn default_strength_max() -> f64 {
        80.0
    }
    fn default_strength_steps() -> usize {
        16
    }
}

/// Map engine failures onto HTTP statuses.
fn error_response(err: ProjectionError) -> (StatusCode, String) {
    let status = match err {
        ProjectionError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        ProjectionError::EmptySample(_) | ProjectionError::TeamNotFound(_) => StatusCode::NOT_FOUND,
        ProjectionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("Rejected API request ({}): {}", status, err);
    (status, err.to_string())
}

/// Engine calls block on SQLite, so they run off the async workers.
async fn run_blocking<T, F>(state: Arc<AppState>, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&ProjectionEngine) -> Result<T, ProjectionError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state.engine))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map(Json)
        .map_err(error_response)
}

/// GET /api/teams
async fn teams_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<CurrentStanding>> {
    run_blocking(state, |engine| engine.list_teams()).await
}

/// GET /api/projection?team=GSW&min_percentile=40&max_percentile=60&strength=20
async fn projection_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ProjectionQuery>,
) -> ApiResult<WinProjection> {
    run_blocking(state, move |engine| {
        engine.project(q.min_percentile, q.max_percentile, q.strength, &q.team)
    })
    .await
}

/// GET /api/custom-projection?p=0.6&strength=20&team=GSW
async fn custom_projection_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CustomQuery>,
) -> ApiResult<WinProjection> {
    run_blocking(state, move |engine| {
        let record = engine.resolve_record(q.team.as_deref(), q.wins, q.losses)?;
        engine.custom_projection(q.p, q.strength, record)
    })
    .await
}

/// GET /api/sensitivity?team=GSW&threshold=60&pct_steps=13&strength_steps=16
async fn sensitivity_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SensitivityQuery>,
) -> ApiResult<Vec<SensitivityCell>> {
    run_blocking(state, move |engine| {
        let pcts = grid_axis(q.pct_min, q.pct_max, q.pct_steps)?;
        let strengths = grid_axis(q.strength_min, q.strength_max, q.strength_steps)?;
        engine.sensitivity(&q.team, q.threshold, &pcts, &strengths)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::import::{SeasonImport, Snapshot};
    use crate::db::models::{GameLog, TeamSeason};
    use crate::db::Database;

    fn state() -> Arc<AppState> {
        let db = Database::open(":memory:").unwrap();
        let pcts = [0.70, 0.65, 0.62, 0.60, 0.58, 0.55, 0.50, 0.45, 0.40, 0.30];
        let teams = pcts
            .iter()
            .enumerate()
            .map(|(i, pct)| TeamSeason {
                team: format!("team_{i}"),
                short: format!("T{i:02}"),
                games: vec![GameLog {
                    game: 82,
                    wins: (pct * 82.0_f64).round() as u32,
                    losses: 82 - (pct * 82.0_f64).round() as u32,
                }],
            })
            .collect();
        let snapshot: Snapshot = Snapshot {
            seasons: vec![SeasonImport { year: 2016, teams }],
            current: serde_json::from_str(
                r#"[{ "short": "GSW", "team": "golden_state_warriors",
                      "name": "Golden State Warriors", "wins": 41, "losses": 10,
                      "ppg": null, "papg": null }]"#,
            )
            .unwrap(),
        };
        db.import_snapshot(&snapshot).unwrap();
        let store = Arc::new(db);
        Arc::new(AppState {
            engine: ProjectionEngine::new(store.clone(), store),
        })
    }

    #[tokio::test]
    async fn projection_endpoint_returns_full_schedule() {
        let q = ProjectionQuery {
            team: "GSW".into(),
            min_percentile: 20.0,
            max_percentile: 80.0,
            strength: 20.0,
        };
        let Json(proj) = projection_handler(State(state()), Query(q)).await.unwrap();
        assert_eq!(proj.entries().len(), 32);
        assert_eq!(proj.entries()[0].wins, 41);
    }

    #[tokio::test]
    async fn unknown_team_is_404() {
        let q = ProjectionQuery {
            team: "XXX".into(),
            min_percentile: 20.0,
            max_percentile: 80.0,
            strength: 20.0,
        };
        let (status, body) = projection_handler(State(state()), Query(q)).await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("XXX"));
    }

    #[tokio::test]
    async fn bad_band_is_400() {
        let q = ProjectionQuery {
            team: "GSW".into(),
            min_percentile: 90.0,
            max_percentile: 10.0,
            strength: 20.0,
        };
        let (status, _) = projection_handler(State(state()), Query(q)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn custom_projection_with_explicit_record() {
        let q = CustomQuery {
            p: 0.5,
            strength: 10.0,
            team: None,
            wins: Some(70),
            losses: Some(10),
        };
        let Json(proj) = custom_projection_handler(State(state()), Query(q)).await.unwrap();
        assert_eq!(proj.entries().len(), 3);
    }

    #[tokio::test]
    async fn teams_and_sensitivity() {
        let state = state();
        let Json(teams) = teams_handler(State(state.clone())).await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].short, "GSW");

        let q: SensitivityQuery = serde_json::from_str(r#"{ "team": "GSW", "threshold": 60, "pct_steps": 4, "strength_steps": 3 }"#).unwrap();
        let Json(cells) = sensitivity_handler(State(state), Query(q)).await.unwrap();
        assert_eq!(cells.len(), 12);
    }

    #[tokio::test]
    async fn oversized_sensitivity_grid_is_400() {
        let q: SensitivityQuery =
            serde_json::from_str(r#"{ "team": "GSW", "threshold": 60, "pct_steps": 100000 }"#)
                .unwrap();
        let (status, body) = sensitivity_handler(State(state()), Query(q)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("100000"));

        let q: SensitivityQuery = serde_json::from_str(
            r#"{ "team": "GSW", "threshold": 60, "strength_steps": 18446744073709551615 }"#,
        )
        .unwrap();
        let (status, _) = sensitivity_handler(State(state()), Query(q)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_are_500() {
        let (status, _) = error_response(ProjectionError::Store(anyhow::anyhow!("boom")));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let (status, _) = error_response(ProjectionError::EmptySample("none".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
