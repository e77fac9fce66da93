/// API route modules
pub mod export;
pub mod formats;
pub mod health;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the application router
///
/// Request bodies are capped at `max_upload_bytes` from the state.
pub fn router(app_state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health::health))
        .route("/formats", get(formats::list_formats))
        .route("/export", post(export::export_track))
        .route("/source", post(export::load_source).get(export::get_source))
        .route("/source/export", post(export::export_source));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(app_state.max_upload_bytes))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
