//! Thin JSON-over-HTTP client for the upstream task API.
//!
//! One attempt per call: no retry, no backoff. A timeout is applied only when
//! configured. Non-2xx responses become `ApiError::Http` with the status and
//! the response text; bodies that do not decode become `ApiError::Decode`.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::ApiError;
use crate::util::{join_url, trunc_for_log};

const CLIENT_UA: &str = concat!("ielts-practice/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug)]
pub struct ApiClient {
  client: reqwest::Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeout {
      builder = builder.timeout(t);
    }
    let client = builder.build().map_err(ApiError::Client)?;
    Ok(Self { client, base_url: base_url.into() })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn url(&self, path: &str) -> String {
    join_url(&self.base_url, path)
  }

  /// POST `body` as JSON and decode the JSON response.
  #[instrument(level = "debug", skip(self, body))]
  pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let url = self.url(path);
    let res = self.client.post(&url)
      .header(USER_AGENT, CLIENT_UA)
      .header(ACCEPT, "application/json")
      .json(body)
      .send().await
      .map_err(|source| ApiError::Network { url: url.clone(), source })?;
    decode(url, res).await
  }

  /// GET with `params` encoded as a query string.
  #[instrument(level = "debug", skip(self, params), fields(params = params.len()))]
  pub async fn get_with_params<T: DeserializeOwned>(
    &self,
    path: &str,
    params: &[(&str, &str)],
  ) -> Result<T, ApiError> {
    let url = self.url(path);
    let res = self.client.get(&url)
      .header(USER_AGENT, CLIENT_UA)
      .header(ACCEPT, "application/json")
      .query(params)
      .send().await
      .map_err(|source| ApiError::Network { url: url.clone(), source })?;
    decode(url, res).await
  }

  /// GET with `Authorization: Bearer <token>`.
  #[instrument(level = "debug", skip(self, token))]
  pub async fn get_with_bearer<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
    let url = self.url(path);
    let res = self.client.get(&url)
      .header(USER_AGENT, CLIENT_UA)
      .header(ACCEPT, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", token))
      .send().await
      .map_err(|source| ApiError::Network { url: url.clone(), source })?;
    decode(url, res).await
  }
}

async fn decode<T: DeserializeOwned>(url: String, res: reqwest::Response) -> Result<T, ApiError> {
  let status = res.status();
  let body = res.text().await.map_err(|source| ApiError::Network { url: url.clone(), source })?;

  if !status.is_success() {
    warn!(target: "upstream", %url, %status, body = %trunc_for_log(&body, 200), "Upstream returned an error status");
    return Err(ApiError::Http { status, body });
  }

  debug!(target: "upstream", %url, %status, bytes = body.len(), "Upstream response received");
  serde_json::from_str::<T>(&body).map_err(|source| ApiError::Decode { url, source })
}
