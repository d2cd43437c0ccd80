//! Shared application state handed to every handler.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::api_client::ApiClient;
use crate::cache::TaskCache;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::exercise::Exercises;
use crate::task_service::TaskService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tasks: TaskService,
    pub exercises: Arc<Exercises>,
}

impl AppState {
    /// Wire the upstream client, cache and orchestrator; restore cached sessions.
    #[instrument(level = "info", skip_all)]
    pub async fn new(config: AppConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(config.upstream.base_url.clone(), config.upstream.timeout())?;
        info!(
            target: "ielts_practice",
            base_url = %api.base_url(),
            timeout = ?config.upstream.timeout(),
            cache_dir = %config.cache.dir.display(),
            language = %config.practice.language,
            "Upstream task API configured"
        );
        let tasks = TaskService::new(api);
        let cache = TaskCache::new(config.cache.dir.clone());
        let exercises = Exercises::new(tasks.clone(), cache, config.practice.language.clone());
        exercises.restore_all().await;

        Ok(Self { config: Arc::new(config), tasks, exercises: Arc::new(exercises) })
    }
}
