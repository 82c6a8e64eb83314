//! Pager: the lazily loaded, restartable page sequence for one query.
//!
//! Loads run as tokio tasks and report back over a channel, following the
//! same fetch/poll shape as [`crate::query::Query`]:
//!
//! ```ignore
//! let mut pager = repository.pages_for(query);
//! pager.start();
//!
//! // In event loop tick
//! if pager.poll() {
//!     // Pages arrived or a load failed, trigger re-render
//! }
//!
//! // When the user scrolls
//! pager.access(selected_index);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{Character, CharacterQuery, CharacterSource};
use crate::store::RecordStore;

use super::source::{LoadError, LoadResult, PageKey, PageLoader, INITIAL_KEY};
use super::state::{LoadedPage, PagingConfig, PagingState};

/// Which edge of the loaded set a load is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadType {
  Refresh,
  Prepend,
  Append,
}

/// Progress of loads in one direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
  NotLoading { end_reached: bool },
  Loading,
  Error(LoadError),
}

impl LoadState {
  pub fn is_loading(&self) -> bool {
    matches!(self, LoadState::Loading)
  }

  pub fn error(&self) -> Option<&LoadError> {
    match self {
      LoadState::Error(e) => Some(e),
      _ => None,
    }
  }

  fn idle() -> Self {
    LoadState::NotLoading { end_reached: false }
  }
}

struct LoadMessage {
  generation: u64,
  load_type: LoadType,
  key: PageKey,
  result: LoadResult<Character>,
}

/// Page sequence for a single query.
///
/// Pages are slotted by key, so an append and a prepend that finish in
/// either order still assemble correctly. Loaded pages are kept for the
/// pager's lifetime. Dropping the pager aborts in-flight loads.
pub struct Pager<R: CharacterSource, S: RecordStore> {
  loader: Arc<PageLoader<R, S>>,
  config: PagingConfig,
  pages: BTreeMap<PageKey, LoadedPage<Character>>,
  anchor_position: Option<usize>,
  /// Anchor offset inside the page a pending refresh resumes from
  resume_offset: Option<usize>,
  refresh: LoadState,
  prepend: LoadState,
  append: LoadState,
  /// Bumped on refresh; results from older generations are dropped
  generation: u64,
  started: bool,
  tx: mpsc::UnboundedSender<LoadMessage>,
  rx: mpsc::UnboundedReceiver<LoadMessage>,
  in_flight: Vec<JoinHandle<()>>,
}

impl<R: CharacterSource, S: RecordStore> Pager<R, S> {
  pub fn new(loader: PageLoader<R, S>, config: PagingConfig) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      loader: Arc::new(loader),
      config,
      pages: BTreeMap::new(),
      anchor_position: None,
      resume_offset: None,
      refresh: LoadState::idle(),
      prepend: LoadState::idle(),
      append: LoadState::idle(),
      generation: 0,
      started: false,
      tx,
      rx,
      in_flight: Vec::new(),
    }
  }

  pub fn query(&self) -> &CharacterQuery {
    self.loader.query()
  }

  /// Load the initial page. No-op once started.
  pub fn start(&mut self) {
    if self.started {
      return;
    }
    self.started = true;
    self.launch(LoadType::Refresh, None);
  }

  /// Invalidate the loaded set and reload near the current anchor.
  ///
  /// Once the reload lands, the anchor points at the same offset inside the
  /// resumed page.
  pub fn refresh(&mut self) {
    let (key, offset) = {
      let state = self.state();
      let offset = state.anchor_position.and_then(|a| state.offset_in_page(a));
      (self.loader.refresh_key(&state), offset)
    };
    debug!(?key, ?offset, query = %self.query(), "refreshing");
    self.resume_offset = offset;

    self.abort_in_flight();
    self.generation += 1;
    self.started = true;
    self.prepend = LoadState::idle();
    self.append = LoadState::idle();
    self.launch(LoadType::Refresh, key);
  }

  /// Load the page after the last loaded one, if any.
  pub fn append(&mut self) {
    if self.refresh.is_loading() || self.append.is_loading() {
      return;
    }
    let next = match self.pages.last_key_value() {
      Some((_, page)) => page.next_key,
      None => return,
    };
    match next {
      Some(key) => self.launch(LoadType::Append, Some(key)),
      None => self.append = LoadState::NotLoading { end_reached: true },
    }
  }

  /// Load the page before the first loaded one, if any.
  pub fn prepend(&mut self) {
    if self.refresh.is_loading() || self.prepend.is_loading() {
      return;
    }
    let prev = match self.pages.first_key_value() {
      Some((_, page)) => page.prev_key,
      None => return,
    };
    match prev {
      Some(key) => self.launch(LoadType::Prepend, Some(key)),
      None => self.prepend = LoadState::NotLoading { end_reached: true },
    }
  }

  /// Re-issue whichever loads last failed.
  pub fn retry(&mut self) {
    if self.refresh.error().is_some() {
      self.refresh();
      return;
    }
    if self.prepend.error().is_some() {
      self.prepend = LoadState::idle();
      self.prepend();
    }
    if self.append.error().is_some() {
      self.append = LoadState::idle();
      self.append();
    }
  }

  /// Record that the item at `position` was viewed, prefetching past
  /// whichever edge it is close to.
  pub fn access(&mut self, position: usize) {
    self.anchor_position = Some(position);
    let len = self.len();
    if position + self.config.prefetch_distance >= len {
      self.append();
    }
    if position < self.config.prefetch_distance {
      self.prepend();
    }
  }

  /// Apply finished loads. Returns `true` if anything changed.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;
    while let Ok(message) = self.rx.try_recv() {
      if message.generation != self.generation {
        continue;
      }
      self.apply(message);
      changed = true;
    }
    if changed {
      self.in_flight.retain(|handle| !handle.is_finished());
    }
    changed
  }

  /// Position of the most recently accessed item, kept in step with pages
  /// inserted in front of it
  pub fn anchor_position(&self) -> Option<usize> {
    self.anchor_position
  }

  pub fn items(&self) -> impl Iterator<Item = &Character> {
    self.pages.values().flat_map(|page| page.data.iter())
  }

  pub fn get(&self, index: usize) -> Option<&Character> {
    self.items().nth(index)
  }

  pub fn len(&self) -> usize {
    self.pages.values().map(|page| page.data.len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn refresh_state(&self) -> &LoadState {
    &self.refresh
  }

  pub fn prepend_state(&self) -> &LoadState {
    &self.prepend
  }

  pub fn append_state(&self) -> &LoadState {
    &self.append
  }

  pub fn is_loading(&self) -> bool {
    self.refresh.is_loading() || self.prepend.is_loading() || self.append.is_loading()
  }

  /// First error among the load directions, refresh first
  pub fn error(&self) -> Option<&LoadError> {
    self
      .refresh
      .error()
      .or_else(|| self.prepend.error())
      .or_else(|| self.append.error())
  }

  pub fn state(&self) -> PagingState<'_, Character> {
    PagingState {
      pages: self.pages.values().collect(),
      anchor_position: self.anchor_position,
    }
  }

  fn launch(&mut self, load_type: LoadType, key: Option<PageKey>) {
    *self.load_state_mut(load_type) = LoadState::Loading;

    let loader = Arc::clone(&self.loader);
    let tx = self.tx.clone();
    let generation = self.generation;
    let requested = key.unwrap_or(INITIAL_KEY);

    let handle = tokio::spawn(async move {
      let result = loader.load(key).await;
      // Ignore send errors - the pager may have been dropped
      let _ = tx.send(LoadMessage {
        generation,
        load_type,
        key: requested,
        result,
      });
    });
    self.in_flight.push(handle);
  }

  fn apply(&mut self, message: LoadMessage) {
    let LoadMessage {
      load_type,
      key,
      result,
      ..
    } = message;

    let (data, prev_key, next_key) = match result {
      LoadResult::Page {
        data,
        prev_key,
        next_key,
      } => (data, prev_key, next_key),
      LoadResult::Error(err) => {
        *self.load_state_mut(load_type) = LoadState::Error(err);
        return;
      }
    };

    if load_type == LoadType::Refresh {
      self.pages.clear();
      self.anchor_position = self
        .resume_offset
        .take()
        .filter(|_| !data.is_empty())
        .map(|offset| offset.min(data.len() - 1));
      self.prepend = LoadState::NotLoading {
        end_reached: prev_key.is_none(),
      };
      self.append = LoadState::NotLoading {
        end_reached: next_key.is_none(),
      };
    }

    let end_reached = match load_type {
      LoadType::Refresh => false,
      LoadType::Prepend => prev_key.is_none(),
      LoadType::Append => next_key.is_none(),
    };
    *self.load_state_mut(load_type) = LoadState::NotLoading { end_reached };

    // Items landing in front of the first page push the anchor back
    let in_front = self
      .pages
      .first_key_value()
      .is_some_and(|(first, _)| key < *first);
    if in_front {
      if let Some(anchor) = self.anchor_position.as_mut() {
        *anchor += data.len();
      }
    }

    self.pages.insert(
      key,
      LoadedPage {
        key,
        data,
        prev_key,
        next_key,
      },
    );
  }

  fn load_state_mut(&mut self, load_type: LoadType) -> &mut LoadState {
    match load_type {
      LoadType::Refresh => &mut self.refresh,
      LoadType::Prepend => &mut self.prepend,
      LoadType::Append => &mut self.append,
    }
  }

  fn abort_in_flight(&mut self) {
    for handle in self.in_flight.drain(..) {
      handle.abort();
    }
  }
}

impl<R: CharacterSource, S: RecordStore> Drop for Pager<R, S> {
  fn drop(&mut self) {
    self.abort_in_flight();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::SqliteStore;
  use crate::testing::{characters, ScriptedSource};
  use std::time::Duration;

  type TestPager = Pager<ScriptedSource, SqliteStore>;

  fn pager_with(source: ScriptedSource) -> (TestPager, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let loader = PageLoader::new(Arc::new(source), Arc::clone(&store), CharacterQuery::default());
    (Pager::new(loader, PagingConfig::default()), store)
  }

  /// Poll until no load is outstanding
  async fn settle(pager: &mut TestPager) {
    for _ in 0..200 {
      pager.poll();
      if !pager.is_loading() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("pager did not settle");
  }

  fn ids(pager: &TestPager) -> Vec<i64> {
    pager.items().map(|c| c.id).collect()
  }

  #[tokio::test]
  async fn test_start_loads_first_page() {
    let (mut pager, store) =
      pager_with(ScriptedSource::new().with_page(1, characters(1..=20), true));

    pager.start();
    assert!(pager.refresh_state().is_loading());
    settle(&mut pager).await;

    assert_eq!(pager.len(), 20);
    assert_eq!(pager.get(0).unwrap().id, 1);
    assert_eq!(
      *pager.prepend_state(),
      LoadState::NotLoading { end_reached: true }
    );
    assert_eq!(
      *pager.append_state(),
      LoadState::NotLoading { end_reached: false }
    );
    assert_eq!(store.scan_all::<Character>().unwrap().len(), 20);
  }

  #[tokio::test]
  async fn test_access_near_end_appends_until_terminal() {
    let source = ScriptedSource::new()
      .with_page(1, characters(1..=20), true)
      .with_page(2, characters(21..=30), false);
    let (mut pager, _store) = pager_with(source);

    pager.start();
    settle(&mut pager).await;
    pager.access(5);
    settle(&mut pager).await;

    assert_eq!(ids(&pager), (1..=30).collect::<Vec<_>>());
    assert_eq!(
      *pager.append_state(),
      LoadState::NotLoading { end_reached: true }
    );

    // Further appends past the terminal page do nothing
    pager.append();
    assert!(!pager.is_loading());
  }

  #[tokio::test]
  async fn test_out_of_order_completion_is_slotted_by_key() {
    let source = ScriptedSource::new()
      .with_page(1, characters(1..=20), true)
      .with_page(3, characters(41..=60), true)
      .with_delay(3, Duration::from_millis(60));
    let (mut pager, _store) = pager_with(source);

    pager.pages.insert(
      2,
      LoadedPage {
        key: 2,
        data: characters(21..=40),
        prev_key: Some(1),
        next_key: Some(3),
      },
    );
    pager.started = true;

    // Append (slow) is issued before prepend (fast)
    pager.append();
    pager.prepend();
    settle(&mut pager).await;

    assert_eq!(ids(&pager), (1..=60).collect::<Vec<_>>());
  }

  #[tokio::test]
  async fn test_error_then_retry() {
    let source = ScriptedSource::new().with_page(1, characters(1..=20), true);
    let (mut pager, _store) = pager_with(source);
    pager.loader_source().set_offline(true);

    pager.start();
    settle(&mut pager).await;
    assert!(matches!(pager.error(), Some(LoadError::Transport(_))));
    assert!(pager.is_empty());

    pager.loader_source().set_offline(false);
    pager.retry();
    settle(&mut pager).await;
    assert!(pager.error().is_none());
    assert_eq!(pager.len(), 20);
  }

  #[tokio::test]
  async fn test_refresh_resumes_near_anchor() {
    let source = ScriptedSource::new()
      .with_page(1, characters(1..=20), true)
      .with_page(2, characters(21..=40), true)
      .with_page(3, characters(41..=60), true);
    let (mut pager, _store) = pager_with(source);

    pager.start();
    settle(&mut pager).await;
    pager.access(10);
    settle(&mut pager).await;
    pager.access(25);
    settle(&mut pager).await;
    assert_eq!(pager.len(), 60);

    pager.refresh();
    settle(&mut pager).await;

    // Anchor 25 sits in page 2, so the reload starts there
    assert_eq!(ids(&pager), (21..=40).collect::<Vec<_>>());
    assert_eq!(
      *pager.prepend_state(),
      LoadState::NotLoading { end_reached: false }
    );
    assert_eq!(pager.anchor_position(), Some(5));
    assert_eq!(pager.get(5).unwrap().id, 26);
  }

  #[tokio::test]
  async fn test_prepend_shifts_anchor() {
    let source = ScriptedSource::new()
      .with_page(1, characters(1..=20), true)
      .with_page(2, characters(21..=40), true)
      .with_page(3, characters(41..=60), false);
    let (mut pager, _store) = pager_with(source);

    pager.pages.insert(
      2,
      LoadedPage {
        key: 2,
        data: characters(21..=40),
        prev_key: Some(1),
        next_key: Some(3),
      },
    );
    pager.started = true;

    pager.access(4);
    settle(&mut pager).await;

    assert_eq!(ids(&pager), (1..=60).collect::<Vec<_>>());
    assert_eq!(pager.anchor_position(), Some(24));
    assert_eq!(pager.get(24).unwrap().id, 25);
  }

  #[tokio::test]
  async fn test_refresh_without_anchor_leaves_it_unset() {
    let source = ScriptedSource::new().with_page(1, characters(1..=20), true);
    let (mut pager, _store) = pager_with(source);

    pager.start();
    settle(&mut pager).await;
    pager.refresh();
    settle(&mut pager).await;

    assert_eq!(pager.anchor_position(), None);
    assert_eq!(pager.len(), 20);
  }

  #[tokio::test]
  async fn test_stale_generation_results_are_dropped() {
    let source = ScriptedSource::new().with_page(1, characters(1..=20), true);
    let (mut pager, _store) = pager_with(source);

    pager.start();
    // Let the first load finish without applying it
    tokio::time::sleep(Duration::from_millis(30)).await;
    pager.refresh();

    pager.poll();
    assert!(pager.is_empty());
    assert!(pager.refresh_state().is_loading());

    settle(&mut pager).await;
    assert_eq!(pager.len(), 20);
  }

  #[tokio::test]
  async fn test_dropping_pager_cancels_in_flight_load() {
    let source = ScriptedSource::new()
      .with_page(1, characters(1..=20), true)
      .with_delay(1, Duration::from_millis(50));
    let (mut pager, store) = pager_with(source);

    pager.start();
    tokio::time::sleep(Duration::from_millis(5)).await;
    drop(pager);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(store.scan_all::<Character>().unwrap().is_empty());
  }

  impl TestPager {
    fn loader_source(&self) -> &ScriptedSource {
      self.loader.source()
    }
  }
}
