//! Service configuration: defaults, an optional TOML file, then env overrides.
//!
//! TOML schema (every section and key optional):
//!
//! ```toml
//! [server]
//! port = 3000
//! static_dir = "./static"
//!
//! [upstream]
//! base_url = "http://127.0.0.1:8000"
//! request_timeout_secs = 60
//!
//! [cache]
//! dir = "./.task-cache"
//!
//! [practice]
//! language = "zh"
//! topics = ["daily-life", "education"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ConfigError;

pub const CONFIG_PATH_ENV: &str = "IELTS_CONFIG_PATH";

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
  pub server: ServerConfig,
  pub upstream: UpstreamConfig,
  pub cache: CacheConfig,
  pub practice: PracticeConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub port: u16,
  pub static_dir: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { port: 3000, static_dir: PathBuf::from("./static") }
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
  pub base_url: String,
  /// No timeout when absent.
  pub request_timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self { base_url: "http://127.0.0.1:8000".into(), request_timeout_secs: None }
  }
}

impl UpstreamConfig {
  pub fn timeout(&self) -> Option<Duration> {
    self.request_timeout_secs.map(Duration::from_secs)
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
  pub dir: PathBuf,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { dir: PathBuf::from("./.task-cache") }
  }
}

/// A topic offered by the topic picker.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Topic {
  pub id: String,
  #[serde(default)]
  pub label: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PracticeConfig {
  pub language: String,
  #[serde(deserialize_with = "topics_from_toml")]
  pub topics: Vec<Topic>,
}

impl Default for PracticeConfig {
  fn default() -> Self {
    Self { language: "zh".into(), topics: default_topics() }
  }
}

fn default_topics() -> Vec<Topic> {
  [
    ("daily-life", "Daily life"),
    ("education", "Education"),
    ("technology", "Technology"),
    ("environment", "Environment"),
    ("health", "Health"),
    ("work", "Work & careers"),
    ("culture", "Culture & arts"),
    ("science", "Science"),
    ("travel", "Travel & tourism"),
    ("society", "Society"),
  ]
  .into_iter()
  .map(|(id, label)| Topic { id: id.into(), label: label.into() })
  .collect()
}

/// Topics may be bare ids or `{ id, label }` tables.
fn topics_from_toml<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Vec<Topic>, D::Error> {
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Entry {
    Id(String),
    Full(Topic),
  }
  let entries = Vec::<Entry>::deserialize(d)?;
  Ok(
    entries
      .into_iter()
      .map(|e| match e {
        Entry::Id(id) => Topic { label: id.clone(), id },
        Entry::Full(mut t) => {
          if t.label.is_empty() {
            t.label = t.id.clone();
          }
          t
        }
      })
      .collect(),
  )
}

impl AppConfig {
  pub fn from_toml_str(s: &str, path: &Path) -> Result<Self, ConfigError> {
    toml::from_str(s).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    Self::from_toml_str(&s, path)
  }

  /// Apply env overrides read through `lookup` (the process env in `load`).
  pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = get("PORT") {
      self.server.port = v.parse().map_err(|_| ConfigError::InvalidValue("PORT".into(), v))?;
    }
    if let Some(v) = get("STATIC_DIR") {
      self.server.static_dir = PathBuf::from(v);
    }
    if let Some(v) = get("IELTS_API_BASE_URL") {
      self.upstream.base_url = v;
    }
    if let Some(v) = get("IELTS_REQUEST_TIMEOUT_SECS") {
      let secs = v
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue("IELTS_REQUEST_TIMEOUT_SECS".into(), v))?;
      self.upstream.request_timeout_secs = (secs > 0).then_some(secs);
    }
    if let Some(v) = get("IELTS_CACHE_DIR") {
      self.cache.dir = PathBuf::from(v);
    }
    if let Some(v) = get("IELTS_LANGUAGE") {
      self.practice.language = v;
    }
    Ok(())
  }

  /// Build the config from the process environment. A missing or broken TOML
  /// file is logged and defaults are used; a bad override is an error.
  pub fn load() -> Result<Self, ConfigError> {
    let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
      Ok(path) => {
        let path = PathBuf::from(path);
        match Self::from_file(&path) {
          Ok(cfg) => {
            info!(target: "ielts_practice", path = %path.display(), "Loaded config (TOML)");
            cfg
          }
          Err(e) => {
            error!(target: "ielts_practice", path = %path.display(), error = %e, "Falling back to default config");
            Self::default()
          }
        }
      }
      Err(_) => Self::default(),
    };
    cfg.apply_overrides(|k| std::env::var(k).ok())?;
    Ok(cfg)
  }
}
