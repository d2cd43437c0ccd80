#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::Router;
use ielts_practice::api_client::ApiClient;
use ielts_practice::cache::TaskCache;
use ielts_practice::config::AppConfig;
use ielts_practice::exercise::Exercises;
use ielts_practice::task_service::TaskService;
use ielts_practice::AppState;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port; returns its base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock upstream crashed");
    });
    format!("http://{}", addr)
}

/// Unique, initially absent cache directory.
pub fn temp_cache_dir() -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("ielts_practice_test_{}_{}", std::process::id(), id));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

pub fn task_service(base_url: &str) -> TaskService {
    TaskService::new(ApiClient::new(base_url, None).expect("client"))
}

pub fn exercises(base_url: &str, cache_dir: &PathBuf) -> Arc<Exercises> {
    Arc::new(Exercises::new(task_service(base_url), TaskCache::new(cache_dir.clone()), "zh"))
}

pub async fn app_state(base_url: &str, cache_dir: &PathBuf) -> Arc<AppState> {
    let mut config = AppConfig::default();
    config.upstream.base_url = base_url.to_string();
    config.cache.dir = cache_dir.clone();
    config.server.static_dir = cache_dir.join("static");
    Arc::new(AppState::new(config).await.expect("app state"))
}

pub fn ok(data: Value) -> Value {
    json!({ "code": 0, "data": data })
}

pub fn reading1_content() -> Value {
    json!({
        "passage_title": "Urban Beekeeping",
        "passage": "City rooftops now host thousands of hives...",
        "questions": {
            "fill_in_the_blanks": [
                { "id": 1, "question": "Rooftop hives produce []", "answer": "honey", "explanation": "Paragraph 2" }
            ],
            "true_false_not_given": [
                { "id": 2, "statement": "Urban bees are healthier than rural bees", "answer": "NOT GIVEN", "explanation": "Not discussed" },
                { "id": 3, "statement": "Hives are kept on rooftops", "answer": "TRUE", "explanation": "Paragraph 1" }
            ]
        }
    })
}

pub fn translation_content() -> Value {
    json!([
        { "en": "I go to school.", "cn": "我去上学。", "difficulty": 1 },
        { "en": "She reads every day.", "cn": "她每天读书。", "difficulty": 1 }
    ])
}
