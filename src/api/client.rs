use crate::api::api_types::ApiCharacterPage;
use crate::api::types::{Character, CharacterQuery};
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Errors raised while talking to the remote API
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("JSON parsing error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Invalid endpoint URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl FetchError {
  /// True when the failure came from connectivity rather than the response
  pub fn is_transport(&self) -> bool {
    match self {
      FetchError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
      FetchError::Io(_) => true,
      _ => false,
    }
  }
}

/// A response the server actually answered
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResponse<T> {
  /// 2xx with a decoded body
  Success(T),
  /// Non-2xx status (the API answers 404 when a filter matches nothing)
  Rejected { status: u16 },
}

/// Remote source of character records.
///
/// Implemented by [`ApiClient`] and by scripted fakes in tests.
pub trait CharacterSource: Send + Sync + 'static {
  /// Fetch one page of the character listing with optional filters
  fn fetch_page(
    &self,
    page: u32,
    query: &CharacterQuery,
  ) -> impl Future<Output = Result<RemoteResponse<ApiCharacterPage>, FetchError>> + Send;

  /// Fetch a single character by id
  fn fetch_character(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<RemoteResponse<Character>, FetchError>> + Send;
}

/// Rick and Morty API client
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let mut base = config.api.base_url.clone();
    // Url::join drops the last path segment unless it ends with a slash
    if !base.ends_with('/') {
      base.push('/');
    }
    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid API base URL {}: {}", base, e))?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  async fn get<T: serde::de::DeserializeOwned>(
    &self,
    url: Url,
  ) -> Result<RemoteResponse<T>, FetchError> {
    debug!(%url, "GET");
    let resp = self.http.get(url).send().await?;

    let status = resp.status();
    if !status.is_success() {
      debug!(status = status.as_u16(), "request rejected");
      return Ok(RemoteResponse::Rejected {
        status: status.as_u16(),
      });
    }

    let body = resp.text().await?;
    Ok(RemoteResponse::Success(serde_json::from_str(&body)?))
  }
}

impl CharacterSource for ApiClient {
  async fn fetch_page(
    &self,
    page: u32,
    query: &CharacterQuery,
  ) -> Result<RemoteResponse<ApiCharacterPage>, FetchError> {
    let mut url = self.base_url.join("character")?;
    {
      let mut pairs = url.query_pairs_mut();
      pairs.append_pair("page", &page.to_string());
      for (key, value) in query.params() {
        pairs.append_pair(key, value);
      }
    }
    self.get(url).await
  }

  async fn fetch_character(&self, id: i64) -> Result<RemoteResponse<Character>, FetchError> {
    let url = self.base_url.join(&format!("character/{}", id))?;
    self.get(url).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config_with_base(base_url: &str) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config
  }

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let client = ApiClient::new(&config_with_base("https://example.test/api")).unwrap();
    assert_eq!(client.base_url().as_str(), "https://example.test/api/");
    assert_eq!(
      client.base_url().join("character").unwrap().as_str(),
      "https://example.test/api/character"
    );
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(ApiClient::new(&config_with_base("not a url")).is_err());
  }

  #[tokio::test]
  async fn test_unreachable_host_is_transport_error() {
    // Port 9 (discard) on localhost is closed on any sane test machine
    let client = ApiClient::new(&config_with_base("http://127.0.0.1:9/api/")).unwrap();
    let err = client
      .fetch_page(1, &CharacterQuery::default())
      .await
      .unwrap_err();
    assert!(err.is_transport(), "unexpected error kind: {err}");
  }
}
