//! Task service: exercise generation, grading, task lookup and upstream settings.
//!
//! Every upstream reply is a `{code, data, msg?}` envelope. A non-zero code is
//! a backend failure even when the HTTP status was 2xx.

use std::collections::BTreeMap;
use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::api_client::ApiClient;
use crate::domain::{ExerciseType, Subtype};
use crate::error::TaskError;

pub const TASK_START: &str = "/task/start";
pub const TASK_CORRECTION: &str = "/task/correction";
pub const TASK_DETAIL: &str = "/api/v1/tasks";
pub const SETTINGS_STATUS: &str = "/api/v1/settings/status";
pub const SETTINGS_GET: &str = "/api/v1/settings/get";
pub const SETTINGS_SAVE: &str = "/api/v1/settings/save";

/// Upstream status code; arrives as `0` or `"0"` depending on the endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseCode {
  Int(i64),
  Text(String),
}

impl ResponseCode {
  pub fn is_success(&self) -> bool {
    match self {
      ResponseCode::Int(n) => *n == 0,
      ResponseCode::Text(s) => s.trim() == "0",
    }
  }
}

impl fmt::Display for ResponseCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResponseCode::Int(n) => write!(f, "{}", n),
      ResponseCode::Text(s) => f.write_str(s),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
  pub code: ResponseCode,
  #[serde(default = "Option::default")]
  pub data: Option<T>,
  #[serde(default, alias = "message")]
  pub msg: Option<String>,
}

impl<T> Envelope<T> {
  pub fn into_data(self) -> Result<T, TaskError> {
    if !self.code.is_success() {
      return Err(TaskError::Backend {
        code: self.code.to_string(),
        message: self.msg.unwrap_or_default(),
      });
    }
    self.data.ok_or(TaskError::MissingData)
  }
}

#[derive(Debug, Serialize)]
struct StartRequest<'a> {
  #[serde(rename = "type")]
  exercise: ExerciseType,
  subtype: Subtype,
  language: &'a str,
  domain: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  subdomain: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  question_type: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct CorrectionRequest<'a> {
  #[serde(rename = "type")]
  exercise: ExerciseType,
  subtype: Subtype,
  language: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  original_article: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  question_type: Option<&'a str>,
  answers: &'a BTreeMap<String, String>,
}

/// Arguments of `TaskService::start`.
#[derive(Clone, Debug)]
pub struct StartParams {
  pub exercise: ExerciseType,
  pub language: String,
  pub topic: String,
  pub subdomain: Option<String>,
  pub question_type: Option<String>,
}

/// Arguments of `TaskService::submit`.
#[derive(Clone, Debug)]
pub struct SubmitParams {
  pub exercise: ExerciseType,
  pub language: String,
  pub original_article: Option<String>,
  pub answers: BTreeMap<String, String>,
  pub question_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SettingsStatus {
  #[serde(default)] pub ready: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SettingsSnapshot {
  #[serde(default)] pub configured: bool,
  #[serde(default)] pub openai_api_key: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SaveOutcome {
  #[serde(default)] pub ok: bool,
}

#[derive(Serialize)]
struct SaveSettingsRequest<'a> {
  openai_api_key: &'a str,
  base_url: &'a str,
}

#[derive(Clone, Debug)]
pub struct TaskService {
  api: ApiClient,
}

impl TaskService {
  pub fn new(api: ApiClient) -> Self {
    Self { api }
  }

  pub fn api(&self) -> &ApiClient {
    &self.api
  }

  async fn post_envelope<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, TaskError> {
    let env: Envelope<T> = self.api.post_json(path, body).await?;
    env.into_data()
  }

  async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> Result<T, TaskError> {
    let env: Envelope<T> = self.api.get_with_params(path, &[]).await?;
    env.into_data()
  }

  /// Ask upstream to generate a new exercise. Returns the opaque generated content.
  #[instrument(level = "info", skip(self, p), fields(exercise = %p.exercise, topic = %p.topic, language = %p.language))]
  pub async fn start(&self, p: &StartParams) -> Result<Value, TaskError> {
    let req = StartRequest {
      exercise: p.exercise,
      subtype: Subtype::Start,
      language: &p.language,
      domain: &p.topic,
      subdomain: p.subdomain.as_deref(),
      question_type: p.question_type.as_deref(),
    };
    let start = std::time::Instant::now();
    let result = self.post_envelope::<_, Value>(TASK_START, &req).await;
    match &result {
      Ok(_) => info!(target: "task", elapsed = ?start.elapsed(), "Exercise generated"),
      Err(e) => warn!(target: "task", elapsed = ?start.elapsed(), error = %e, "Exercise generation failed"),
    }
    result
  }

  /// Send answers for grading. Returns the opaque feedback.
  #[instrument(level = "info", skip(self, p), fields(exercise = %p.exercise, answers = p.answers.len()))]
  pub async fn submit(&self, p: &SubmitParams) -> Result<Value, TaskError> {
    let req = CorrectionRequest {
      exercise: p.exercise,
      subtype: Subtype::Correction,
      language: &p.language,
      original_article: p.original_article.as_deref(),
      question_type: p.question_type.as_deref(),
      answers: &p.answers,
    };
    let start = std::time::Instant::now();
    let result = self.post_envelope::<_, Value>(TASK_CORRECTION, &req).await;
    match &result {
      Ok(_) => info!(target: "task", elapsed = ?start.elapsed(), "Answers graded"),
      Err(e) => warn!(target: "task", elapsed = ?start.elapsed(), error = %e, "Grading failed"),
    }
    result
  }

  /// Fetch a previously generated task by id. Returns the raw document.
  #[instrument(level = "info", skip(self, token))]
  pub async fn get_task_data_detail(&self, task_id: &str, token: &str) -> Result<Value, TaskError> {
    let path = format!("{}/{}", TASK_DETAIL, task_id);
    Ok(self.api.get_with_bearer(&path, token).await?)
  }

  #[instrument(level = "info", skip(self))]
  pub async fn settings_status(&self) -> Result<SettingsStatus, TaskError> {
    self.get_envelope(SETTINGS_STATUS).await
  }

  #[instrument(level = "info", skip(self))]
  pub async fn settings_get(&self) -> Result<SettingsSnapshot, TaskError> {
    self.get_envelope(SETTINGS_GET).await
  }

  #[instrument(level = "info", skip(self, openai_api_key), fields(key_len = openai_api_key.len()))]
  pub async fn settings_save(&self, openai_api_key: &str, base_url: &str) -> Result<SaveOutcome, TaskError> {
    let req = SaveSettingsRequest { openai_api_key, base_url };
    self.post_envelope(SETTINGS_SAVE, &req).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn envelope_accepts_numeric_and_text_codes() {
    let a: Envelope<Value> = serde_json::from_value(json!({"code": 0, "data": {"x": 1}})).unwrap();
    assert_eq!(a.into_data().unwrap(), json!({"x": 1}));
    let b: Envelope<SaveOutcome> = serde_json::from_value(json!({"code": "0", "data": {"ok": true}})).unwrap();
    assert!(b.into_data().unwrap().ok);
  }

  #[test]
  fn non_zero_code_is_a_backend_error() {
    let e: Envelope<Value> = serde_json::from_value(json!({"code": "500", "msg": "model busy"})).unwrap();
    match e.into_data() {
      Err(TaskError::Backend { code, message }) => {
        assert_eq!(code, "500");
        assert_eq!(message, "model busy");
      }
      other => panic!("unexpected: {:?}", other),
    }
  }

  #[test]
  fn success_without_data_is_reported() {
    let e: Envelope<Value> = serde_json::from_value(json!({"code": 0})).unwrap();
    assert!(matches!(e.into_data(), Err(TaskError::MissingData)));
  }

  #[test]
  fn start_request_omits_absent_optionals() {
    let req = StartRequest {
      exercise: ExerciseType::Reading1,
      subtype: Subtype::Start,
      language: "zh",
      domain: "daily-life",
      subdomain: None,
      question_type: None,
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v, json!({"type": "reading1", "subtype": "start", "language": "zh", "domain": "daily-life"}));
  }
}
