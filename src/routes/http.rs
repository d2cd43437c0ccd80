//! HTTP endpoint handlers. Thin wrappers over the exercise orchestrator and the task service.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::domain::ExerciseType;
use crate::error::{ExerciseError, SessionError, TaskError};
use crate::exercise::GenerateOptions;
use crate::protocol::*;
use crate::state::AppState;
use crate::task_service::{SaveOutcome, SettingsSnapshot, SettingsStatus};

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

/// Errors as they leave the HTTP surface: a status and a `{message}` body.
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Unauthorized(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            HttpError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            HttpError::Conflict(m) => (StatusCode::CONFLICT, m),
            HttpError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m),
            HttpError::Internal(m) => {
                error!(target: "http", error = %m, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

impl From<SessionError> for HttpError {
    fn from(e: SessionError) -> Self {
        let message = e.to_string();
        match e {
            SessionError::EmptyTopic
            | SessionError::NoTopic
            | SessionError::NothingToGenerate(_)
            | SessionError::MissingAnswers(_)
            | SessionError::NotADrill(_)
            | SessionError::NotSubmittable(_) => HttpError::BadRequest(message),
            SessionError::NotReady
            | SessionError::Busy
            | SessionError::AlreadySubmitted
            | SessionError::Stale
            | SessionError::DrillFinished
            | SessionError::NothingToRetry => HttpError::Conflict(message),
        }
    }
}

impl From<TaskError> for HttpError {
    fn from(e: TaskError) -> Self {
        warn!(target: "http", error = %e, "Upstream task API failed");
        HttpError::BadGateway(e.to_string())
    }
}

impl From<ExerciseError> for HttpError {
    fn from(e: ExerciseError) -> Self {
        match e {
            ExerciseError::Session(e) => e.into(),
            ExerciseError::Task(e) => e.into(),
            ExerciseError::Content(e) => {
                warn!(target: "http", error = %e, "Generated content rejected");
                HttpError::BadGateway(e.to_string())
            }
        }
    }
}

fn parse_exercise(raw: &str) -> Result<ExerciseType, HttpError> {
    raw.parse().map_err(|e: crate::domain::UnknownExercise| HttpError::BadRequest(e.to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

type ViewResult = Result<Json<SessionView>, HttpError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
    Json(HealthOut { ok: true, version: env!("CARGO_PKG_VERSION") })
}

#[instrument(level = "info")]
pub async fn http_list_exercises() -> impl IntoResponse {
    let list: Vec<ExerciseInfo> = ExerciseType::ALL.into_iter().map(ExerciseInfo::from).collect();
    Json(list)
}

#[instrument(level = "info", skip(state))]
pub async fn http_topics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(TopicsOut { topics: state.config.practice.topics.clone() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_exercise(State(state): State<Arc<AppState>>, Path(kind): Path<String>) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let session = state.exercises.view(exercise).await;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn http_select_topic(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(body): Json<TopicIn>,
) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let session = state.exercises.select_topic(exercise, &body.topic, body.question_type).await?;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_generate(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    body: Option<Json<GenerateIn>>,
) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let opts = GenerateOptions { language: body.language, subdomain: body.subdomain };
    let session = state.exercises.generate(exercise, opts).await?;
    info!(target: "http", %exercise, phase = ?session.phase(), "Exercise generated");
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state, body), fields(count = body.answers.len()))]
pub async fn http_put_answers(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(body): Json<AnswersIn>,
) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let session = state.exercises.set_answers(exercise, body.answers).await?;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_submit(State(state): State<Arc<AppState>>, Path(kind): Path<String>) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let session = state.exercises.submit(exercise).await?;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_retry(State(state): State<Arc<AppState>>, Path(kind): Path<String>) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let session = state.exercises.retry(exercise).await?;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_reset(State(state): State<Arc<AppState>>, Path(kind): Path<String>) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let session = state.exercises.reset(exercise).await;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state, body), fields(show = body.show))]
pub async fn http_show_answers(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(body): Json<ShowAnswersIn>,
) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let session = state.exercises.set_show_answers(exercise, body.show).await;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state, body), fields(words = body.words.len()))]
pub async fn http_drill_check(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(body): Json<WordsIn>,
) -> Result<Json<CheckOut>, HttpError> {
    let exercise = parse_exercise(&kind)?;
    let (check, session) = state.exercises.check_sentence(exercise, &body.words).await?;
    info!(target: "http", %exercise, correct = check.correct, "Drill sentence checked");
    Ok(Json(CheckOut { check, session: SessionView::from(&session) }))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_drill_skip(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    body: Option<Json<SkipIn>>,
) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let session = state.exercises.skip_sentence(exercise, &body.partial).await?;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_drill_next(State(state): State<Arc<AppState>>, Path(kind): Path<String>) -> ViewResult {
    let exercise = parse_exercise(&kind)?;
    let session = state.exercises.next_sentence(exercise).await?;
    Ok(Json(SessionView::from(&session)))
}

#[instrument(level = "info", skip(state, body), fields(transcript_len = body.transcript.len()))]
pub async fn http_drill_compare(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(body): Json<TranscriptIn>,
) -> Result<Json<CompareOut>, HttpError> {
    let exercise = parse_exercise(&kind)?;
    let (alignment, session) = state.exercises.compare_transcript(exercise, &body.transcript).await?;
    Ok(Json(CompareOut { alignment, session: SessionView::from(&session) }))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_task_detail(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, HttpError> {
    let token = bearer_token(&headers).ok_or_else(|| HttpError::Unauthorized("missing bearer token".into()))?;
    let doc = state.exercises.task_detail(&task_id, token).await?;
    Ok(Json(doc))
}

#[instrument(level = "info", skip(state))]
pub async fn http_settings_status(State(state): State<Arc<AppState>>) -> Result<Json<SettingsStatus>, HttpError> {
    Ok(Json(state.tasks.settings_status().await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_settings_get(State(state): State<Arc<AppState>>) -> Result<Json<SettingsSnapshot>, HttpError> {
    Ok(Json(state.tasks.settings_get().await?))
}

#[instrument(level = "info", skip(state, body), fields(base_url = %body.base_url))]
pub async fn http_settings_save(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SettingsSaveIn>,
) -> Result<Json<SaveOutcome>, HttpError> {
    if body.openai_api_key.trim().is_empty() {
        return Err(HttpError::BadRequest("openai_api_key must not be empty".into()));
    }
    Ok(Json(state.tasks.settings_save(&body.openai_api_key, &body.base_url).await?))
}
