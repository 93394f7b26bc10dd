//! HTTP surface: health/status probes and manual job triggers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use hotdeal_core::{AppConfig, DealSource};

use crate::jobs;
use crate::scheduler::{DealScheduler, SchedulerStatus};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub scheduler: Arc<tokio::sync::Mutex<DealScheduler>>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    fn internal(error: &anyhow::Error) -> Self {
        tracing::error!(error = %error, "request failed");
        Self::new("internal_error", "request failed")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "bad_request" => StatusCode::BAD_REQUEST,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(status))
        .route("/jobs/expiry", post(trigger_expiry))
        .route("/jobs/report", post(trigger_report))
        .route("/jobs/crawl", post(trigger_crawl))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

async fn healthz(State(state): State<AppState>) -> Result<Json<HealthData>, ApiError> {
    match hotdeal_db::ping(&state.pool).await {
        Ok(()) => Ok(Json(HealthData {
            status: "ok",
            database: "ok",
        })),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            Err(ApiError::new("unavailable", "database unreachable"))
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusData {
    env: String,
    active_deals: i64,
    scheduler: SchedulerStatus,
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusData>, ApiError> {
    let active_deals = hotdeal_db::count_active_deals(&state.pool)
        .await
        .map_err(|e| ApiError::internal(&e.into()))?;
    let scheduler = state.scheduler.lock().await.status().await;
    Ok(Json(StatusData {
        env: state.config.env.to_string(),
        active_deals,
        scheduler,
    }))
}

async fn trigger_expiry(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    jobs::run_expiry_job(&state.pool, &state.config)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal(&e))
}

async fn trigger_report(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    jobs::run_report_job(&state.pool)
        .await
        .map(Json)
        .map_err(|e| ApiError::internal(&e))
}

#[derive(Debug, Deserialize)]
struct CrawlParams {
    /// Limit the run to one source tag; all registered sources otherwise.
    source: Option<String>,
}

#[derive(Debug, Serialize)]
struct CrawlSourceResult {
    source: DealSource,
    total_crawled: Option<u64>,
    new_deals: Option<u64>,
    updated_deals: Option<u64>,
    errors: Option<u64>,
    error: Option<String>,
}

async fn trigger_crawl(
    State(state): State<AppState>,
    Query(params): Query<CrawlParams>,
) -> Result<Json<Vec<CrawlSourceResult>>, ApiError> {
    let source = match params.source.as_deref() {
        Some(tag) => Some(
            tag.parse::<DealSource>()
                .map_err(|e| ApiError::new("bad_request", e))?,
        ),
        None => None,
    };

    let results = jobs::run_crawl_job(&state.pool, &state.config, source)
        .await
        .map_err(|e| ApiError::internal(&e))?;

    Ok(Json(
        results
            .into_iter()
            .map(|(source, outcome)| match outcome {
                Ok(stats) => CrawlSourceResult {
                    source,
                    total_crawled: Some(stats.total_crawled),
                    new_deals: Some(stats.new_deals),
                    updated_deals: Some(stats.updated_deals),
                    errors: Some(stats.errors),
                    error: None,
                },
                Err(e) => CrawlSourceResult {
                    source,
                    total_crawled: None,
                    new_deals: None,
                    updated_deals: None,
                    errors: None,
                    error: Some(e.to_string()),
                },
            })
            .collect(),
    ))
}
