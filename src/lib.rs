//! IELTS practice service.
//!
//! Generates exercises through an upstream task API, keeps one in-progress
//! session per exercise type (mirrored to a local JSON cache), grades reading
//! answers and sentence drills locally, forwards everything else for remote
//! grading, and serves the practice SPA.

pub mod api_client;
pub mod cache;
pub mod checker;
pub mod config;
pub mod domain;
pub mod error;
pub mod exercise;
pub mod protocol;
pub mod questions;
pub mod routes;
pub mod session;
pub mod state;
pub mod task_service;
pub mod telemetry;
pub mod util;

use std::sync::Arc;

use axum::Router;

pub use config::AppConfig;
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    routes::build_router(state)
}
