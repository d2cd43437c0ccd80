//! Router assembly: JSON API, static SPA, CORS and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router:
/// - JSON API under `/api/v1/...`
/// - static SPA from the configured directory, falling back to `index.html`
/// - permissive CORS
/// - per-request trace spans (method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    let exercise_routes = Router::new()
        .route("/", get(http::http_list_exercises))
        .route("/:kind", get(http::http_get_exercise))
        .route("/:kind/topic", post(http::http_select_topic))
        .route("/:kind/generate", post(http::http_generate))
        .route("/:kind/answers", put(http::http_put_answers))
        .route("/:kind/submit", post(http::http_submit))
        .route("/:kind/retry", post(http::http_retry))
        .route("/:kind/reset", post(http::http_reset))
        .route("/:kind/show_answers", post(http::http_show_answers))
        .route("/:kind/drill/check", post(http::http_drill_check))
        .route("/:kind/drill/skip", post(http::http_drill_skip))
        .route("/:kind/drill/next", post(http::http_drill_next))
        .route("/:kind/drill/compare", post(http::http_drill_compare));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/topics", get(http::http_topics))
        .nest("/api/v1/exercises", exercise_routes)
        .route("/api/v1/tasks/:task_id", get(http::http_task_detail))
        .route("/api/v1/settings/status", get(http::http_settings_status))
        .route("/api/v1/settings/get", get(http::http_settings_get))
        .route("/api/v1/settings/save", post(http::http_settings_save))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}
