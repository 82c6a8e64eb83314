//! Incremental page loader: one page per request, remote first, store kept warm.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::{Character, CharacterQuery, CharacterSource, FetchError, RemoteResponse};
use crate::store::RecordStore;

use super::state::{refresh_key, PagingState};

/// Page number as understood by the list endpoint
pub type PageKey = u32;

/// Key used when no key is given
pub const INITIAL_KEY: PageKey = 1;

/// Why a load attempt failed. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
  #[error("Network unavailable: {0}")]
  Transport(String),

  #[error("Load failed: {0}")]
  Unexpected(String),
}

impl From<FetchError> for LoadError {
  fn from(err: FetchError) -> Self {
    if err.is_transport() {
      LoadError::Transport(err.to_string())
    } else {
      LoadError::Unexpected(err.to_string())
    }
  }
}

/// Outcome of a single load attempt
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult<T> {
  Page {
    data: Vec<T>,
    prev_key: Option<PageKey>,
    next_key: Option<PageKey>,
  },
  Error(LoadError),
}

impl<T> LoadResult<T> {
  /// A valid page with nothing before or after it
  pub fn empty_terminal() -> Self {
    LoadResult::Page {
      data: Vec::new(),
      prev_key: None,
      next_key: None,
    }
  }
}

/// Loads character pages for one query.
///
/// Successful pages are written through to the record store. A rejected
/// request (the API answers 404 when nothing matches) becomes an empty
/// terminal page. Any other failure is returned as [`LoadResult::Error`];
/// cached records are never substituted for a failed page.
pub struct PageLoader<R, S> {
  source: Arc<R>,
  store: Arc<S>,
  query: CharacterQuery,
}

impl<R: CharacterSource, S: RecordStore> PageLoader<R, S> {
  pub fn new(source: Arc<R>, store: Arc<S>, query: CharacterQuery) -> Self {
    Self {
      source,
      store,
      query,
    }
  }

  pub fn query(&self) -> &CharacterQuery {
    &self.query
  }

  #[cfg(test)]
  pub(crate) fn source(&self) -> &R {
    &self.source
  }

  /// Load the page for `key` (page 1 when `None`).
  ///
  /// Always yields exactly one outcome; failures, including a panic inside
  /// the source or store, come back as [`LoadResult::Error`].
  pub async fn load(&self, key: Option<PageKey>) -> LoadResult<Character> {
    let page = key.unwrap_or(INITIAL_KEY);
    debug!(page, query = %self.query, "loading page");

    let attempt = AssertUnwindSafe(self.try_load(page)).catch_unwind().await;
    match attempt {
      Ok(Ok(result)) => result,
      Ok(Err(err)) => {
        warn!(page, query = %self.query, error = %err, "page load failed");
        LoadResult::Error(err)
      }
      Err(_) => {
        warn!(page, query = %self.query, "page load panicked");
        LoadResult::Error(LoadError::Unexpected("page load panicked".to_string()))
      }
    }
  }

  async fn try_load(&self, page: PageKey) -> Result<LoadResult<Character>, LoadError> {
    let response = self.source.fetch_page(page, &self.query).await?;

    let body = match response {
      RemoteResponse::Success(body) => body,
      RemoteResponse::Rejected { status } => {
        debug!(page, status, query = %self.query, "no matches, ending listing");
        return Ok(LoadResult::empty_terminal());
      }
    };

    if !body.results.is_empty() {
      self
        .store
        .upsert_many(&body.results)
        .map_err(|e| LoadError::Unexpected(format!("Failed to cache page {}: {}", page, e)))?;
    }

    Ok(LoadResult::Page {
      prev_key: page.checked_sub(1).filter(|prev| *prev >= INITIAL_KEY),
      next_key: body
        .info
        .has_next()
        .then(|| page.checked_add(1))
        .flatten(),
      data: body.results,
    })
  }

  /// Key to resume from when the loaded set is invalidated.
  pub fn refresh_key(&self, state: &PagingState<'_, Character>) -> Option<PageKey> {
    refresh_key(state)
  }
}
