//! Shared error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::ExerciseType;

/// Errors emitted by `ApiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
  #[error("could not build HTTP client: {0}")]
  Client(#[source] reqwest::Error),
  #[error("request to {url} failed: {source}")]
  Network {
    url: String,
    #[source]
    source: reqwest::Error,
  },
  #[error("request failed: HTTP {status} - {body}")]
  Http { status: reqwest::StatusCode, body: String },
  #[error("could not decode response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },
}

/// Errors emitted by `TaskService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TaskError {
  #[error(transparent)]
  Api(#[from] ApiError),
  #[error("task API reported code {code}: {message}")]
  Backend { code: String, message: String },
  #[error("task API returned success without data")]
  MissingData,
}

/// Errors emitted by `TaskCache`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
  #[error("invalid cache key '{0}'")]
  InvalidKey(String),
  #[error(transparent)]
  Io(#[from] std::io::Error),
  #[error(transparent)]
  Encode(#[from] serde_json::Error),
}

/// Generated content that does not have the shape an exercise expects.
#[derive(Debug, Error)]
#[error("{exercise} content has an unexpected shape: {source}")]
pub struct ContentError {
  pub exercise: ExerciseType,
  #[source]
  pub source: serde_json::Error,
}

/// State-machine violations of an exercise session.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
  #[error("topic must not be empty")]
  EmptyTopic,
  #[error("select a topic before generating")]
  NoTopic,
  #[error("{0} does not generate content")]
  NothingToGenerate(ExerciseType),
  #[error("no exercise has been generated yet")]
  NotReady,
  #[error("another request for this exercise is still running")]
  Busy,
  #[error("answers were already submitted")]
  AlreadySubmitted,
  #[error("please answer every question before submitting: missing {}", .0.join(", "))]
  MissingAnswers(Vec<String>),
  #[error("response belongs to a request that is no longer current")]
  Stale,
  #[error("{0} is not a sentence drill")]
  NotADrill(ExerciseType),
  #[error("the drill is finished")]
  DrillFinished,
  #[error("{0} is practised sentence by sentence and has no submit")]
  NotSubmittable(ExerciseType),
  #[error("there is no failed action to retry")]
  NothingToRetry,
}

/// Errors surfaced by the exercise orchestrator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExerciseError {
  #[error(transparent)]
  Session(#[from] SessionError),
  #[error(transparent)]
  Task(#[from] TaskError),
  #[error(transparent)]
  Content(#[from] ContentError),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
  #[error("invalid value for {0}: {1}")]
  InvalidValue(String, String),
}
