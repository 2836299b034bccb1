//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use tower_http::trace::TraceLayer;

use crate::feed::FeedSource;

use super::dto::*;
use super::state::AppState;

/// Shortest accepted station search term.
const MIN_SEARCH_LEN: usize = 2;

/// Create the application router.
pub fn create_router<S: FeedSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(index::<S>))
        .route("/api/arrivals", get(arrivals::<S>))
        .route("/api/arrivals/raw", get(raw_arrivals::<S>))
        .route("/api/stations", get(search_stations::<S>))
        .route("/api/station/:id", get(station::<S>))
        .route("/api/config", get(config::<S>))
        .route("/api/health", get(health::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Service description and row summary.
async fn index<S: FeedSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<IndexResponse> {
    Json(IndexResponse::from_config(state.board.config()))
}

/// Arrivals for every row, trimmed for display.
async fn arrivals<S: FeedSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<ArrivalsResponse> {
    let board = state.board.arrivals().await;
    let direction = state.board.config().direction;
    Json(ArrivalsResponse::new(board, direction))
}

/// Every upcoming arrival for every row, plus per-feed status.
async fn raw_arrivals<S: FeedSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<RawArrivalsResponse> {
    Json(RawArrivalsResponse::from(state.board.raw_arrivals().await))
}

/// Search stations by name.
async fn search_stations<S: FeedSource + 'static>(
    State(state): State<AppState<S>>,
    Query(req): Query<StationSearchRequest>,
) -> Result<Json<Vec<crate::stations::StationMatch>>, AppError> {
    if req.search.chars().count() < MIN_SEARCH_LEN {
        return Err(AppError::BadRequest {
            message: format!("Search term must be at least {MIN_SEARCH_LEN} characters"),
        });
    }

    Ok(Json(state.board.search_stations(&req.search)))
}

/// Station name for a stop ID.
async fn station<S: FeedSource + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Json<StationResponse> {
    let name = state.board.resolve_station(&id);
    Json(StationResponse { id, name })
}

/// Configuration for the display client.
async fn config<S: FeedSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<ConfigResponse> {
    Json(ConfigResponse::from(state.board.config()))
}

/// Health check with feed status.
async fn health<S: FeedSource + 'static>(
    State(state): State<AppState<S>>,
) -> Json<HealthResponse> {
    let feeds = state.board.feed_set().await;

    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().timestamp_millis(),
        cache_age: u64::try_from(feeds.age().as_millis()).unwrap_or(u64::MAX),
        fetched_at: feeds.fetched_at().timestamp_millis(),
        feeds: feeds.health(),
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
        };

        tracing::debug!(%status, %message, "Request rejected");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
