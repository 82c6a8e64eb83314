//! Character repository: page streams per query plus local lookups.

use color_eyre::{eyre::eyre, Result};
use futures::Stream;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::{Character, CharacterQuery, CharacterSource, RemoteResponse};
use crate::paging::{LoadResult, PageKey, PageLoader, Pager, PagingConfig};
use crate::store::RecordStore;

/// Entry point for character data.
///
/// Listings go through the remote source and keep the store warm; single
/// lookups read the store only.
pub struct CharacterRepository<R, S> {
  source: Arc<R>,
  store: Arc<S>,
  config: PagingConfig,
}

impl<R, S> Clone for CharacterRepository<R, S> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
      store: Arc::clone(&self.store),
      config: self.config,
    }
  }
}

impl<R: CharacterSource, S: RecordStore> CharacterRepository<R, S> {
  pub fn new(source: Arc<R>, store: Arc<S>, config: PagingConfig) -> Self {
    Self {
      source,
      store,
      config,
    }
  }

  fn loader(&self, query: CharacterQuery) -> PageLoader<R, S> {
    PageLoader::new(Arc::clone(&self.source), Arc::clone(&self.store), query)
  }

  /// Page sequence for `query`, backed by its own loader.
  ///
  /// Nothing is fetched until the pager is started.
  pub fn pages_for(&self, query: CharacterQuery) -> Pager<R, S> {
    debug!(
      %query,
      page_size = self.config.page_size,
      placeholders = self.config.enable_placeholders,
      "new pager"
    );
    Pager::new(self.loader(query), self.config)
  }

  /// Forward-only stream of pages for `query`.
  ///
  /// Ends after the terminal page or right after the first error.
  pub fn page_stream(
    &self,
    query: CharacterQuery,
  ) -> impl Stream<Item = LoadResult<Character>> + Send + 'static {
    let loader = Arc::new(self.loader(query));

    // Outer None ends the stream; inner None requests the initial page
    futures::stream::unfold(Some(None::<PageKey>), move |next| {
      let loader = Arc::clone(&loader);
      async move {
        let key = next?;
        let result = loader.load(key).await;
        let following = match &result {
          LoadResult::Page {
            next_key: Some(k), ..
          } => Some(Some(*k)),
          _ => None,
        };
        Some((result, following))
      }
    })
  }

  /// Stored record for `id`, without touching the network.
  pub fn by_id(&self, id: i64) -> Result<Option<Character>> {
    let cached = self.store.get_by_id::<Character>(id)?;
    if let Some(c) = &cached {
      debug!(id, cached_at = %c.cached_at, "cache hit");
    }
    Ok(cached.map(|c| c.entity))
  }

  /// Fetch one record from the remote source and store it.
  ///
  /// Returns `None` when the API does not know the id.
  pub async fn refresh_by_id(&self, id: i64) -> Result<Option<Character>> {
    let response = self
      .source
      .fetch_character(id)
      .await
      .map_err(|e| eyre!("Failed to fetch character {}: {}", id, e))?;

    match response {
      RemoteResponse::Success(character) => {
        self.store.upsert_one(&character)?;
        Ok(Some(character))
      }
      RemoteResponse::Rejected { status } => {
        debug!(id, status, "character lookup rejected");
        Ok(None)
      }
    }
  }

  /// Stored records matching `query`, for offline listing.
  pub fn cached(&self, query: &CharacterQuery) -> Result<Vec<Character>> {
    // Narrow in SQL by one exact field when there is one, then filter the rest
    let exact = [
      ("status", &query.status),
      ("species", &query.species),
      ("gender", &query.gender),
    ]
    .into_iter()
    .find_map(|(field, value)| value.as_deref().map(|v| (field, v)));

    let mut records = match exact {
      Some((field, value)) => self.store.scan_where::<Character>(field, value)?,
      None => self.store.scan_all::<Character>()?,
    };
    records.retain(|c| query.matches(c));
    Ok(records)
  }

  /// Drop every stored record.
  pub fn clear_cache(&self) -> Result<usize> {
    let removed = self.store.delete_all::<Character>()?;
    info!(removed, "character cache cleared");
    Ok(removed)
  }
}
