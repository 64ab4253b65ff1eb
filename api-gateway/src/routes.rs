//! HTTP routes
//!
//! - `GET /billing`: consolidated cost report across all configured accounts
//! - `GET /health`: liveness and configured account count

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, Method},
    response::Json,
    routing::get,
    Router,
};
use cloudbill_common::{BillingRequest, VERSION};
use cloudbill_core::{CostAggregator, ReportEntry};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, instrument};

use crate::error::ApiError;

/// How long browsers may cache a preflight response
const CORS_MAX_AGE: Duration = Duration::from_secs(3_628_800);

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    aggregator: CostAggregator,
}

impl AppState {
    pub fn new(aggregator: CostAggregator) -> Self {
        Self { aggregator }
    }
}

/// Build the gateway router
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS, Method::PUT, Method::DELETE])
        .allow_headers(Any)
        .expose_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            header::AUTHORIZATION,
            header::REFERER,
            header::USER_AGENT,
        ])
        .max_age(CORS_MAX_AGE);

    Router::new()
        .route("/health", get(health_check))
        .route("/billing", get(get_billing))
        // Middleware
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": VERSION,
        "accounts": state.aggregator.registry().len(),
    }))
}

/// Query every account and return the consolidated report.
///
/// Parameters are validated before any account is queried. Dropping this
/// future (client disconnect, timeout) drops the in-flight upstream call.
#[instrument(skip(state, params))]
async fn get_billing(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<ReportEntry>>, ApiError> {
    let request = BillingRequest::from_pairs(&params)?;
    info!(
        sort = %request.sort,
        granularity = %request.query.granularity,
        dimension = %request.query.dimension,
        metrics = ?request.query.metrics,
        start = %request.query.time_range.start,
        end = %request.query.time_range.end,
        "GET /billing"
    );

    let report = state.aggregator.aggregate(&request).await?;
    let entries = report.into_entries();

    info!(entries = entries.len(), "Billing report served");
    Ok(Json(entries))
}
