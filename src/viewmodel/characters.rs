use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::api::{CharacterQuery, CharacterSource};
use crate::paging::Pager;
use crate::repository::CharacterRepository;
use crate::store::RecordStore;

use super::debounce::QueryDebouncer;
use super::keywords;
use super::state_cell::StateCell;

/// Change subscriptions on the four query cells
struct CellWatch {
  search_text: watch::Receiver<String>,
  status_filter: watch::Receiver<Option<String>>,
  species_filter: watch::Receiver<Option<String>>,
  gender_filter: watch::Receiver<Option<String>>,
}

impl CellWatch {
  /// True if any cell changed since the last call
  fn take_changed(&mut self) -> bool {
    // Non-short-circuiting so every receiver is marked seen
    seen(&mut self.search_text)
      | seen(&mut self.status_filter)
      | seen(&mut self.species_filter)
      | seen(&mut self.gender_filter)
  }
}

fn seen<T>(rx: &mut watch::Receiver<T>) -> bool {
  let changed = rx.has_changed().unwrap_or(false);
  if changed {
    let _ = rx.borrow_and_update();
  }
  changed
}

/// State behind the character list screen.
///
/// Four cells (search text plus three filters) combine into one query. Edits
/// pass through a debouncer; when it emits, the current pager is dropped and
/// a pager for the new query takes its place.
pub struct CharactersViewModel<R: CharacterSource, S: RecordStore> {
  repository: CharacterRepository<R, S>,
  search_text: StateCell<String>,
  status_filter: StateCell<Option<String>>,
  species_filter: StateCell<Option<String>>,
  gender_filter: StateCell<Option<String>>,
  cells: CellWatch,
  debouncer: QueryDebouncer,
  pager: Pager<R, S>,
}

impl<R: CharacterSource, S: RecordStore> CharactersViewModel<R, S> {
  /// Build the view model and start loading the unfiltered listing.
  pub fn new(repository: CharacterRepository<R, S>, debounce: Duration) -> Self {
    let mut debouncer = QueryDebouncer::new(debounce);
    let initial = CharacterQuery::default();
    debouncer.emit_now(initial.clone());

    let mut pager = repository.pages_for(initial);
    pager.start();

    let search_text: StateCell<String> = StateCell::default();
    let status_filter: StateCell<Option<String>> = StateCell::default();
    let species_filter: StateCell<Option<String>> = StateCell::default();
    let gender_filter: StateCell<Option<String>> = StateCell::default();
    let cells = CellWatch {
      search_text: search_text.subscribe(),
      status_filter: status_filter.subscribe(),
      species_filter: species_filter.subscribe(),
      gender_filter: gender_filter.subscribe(),
    };

    Self {
      repository,
      search_text,
      status_filter,
      species_filter,
      gender_filter,
      cells,
      debouncer,
      pager,
    }
  }

  pub fn search_text(&self) -> String {
    self.search_text.get()
  }

  pub fn status_filter(&self) -> Option<String> {
    self.status_filter.get()
  }

  pub fn species_filter(&self) -> Option<String> {
    self.species_filter.get()
  }

  pub fn gender_filter(&self) -> Option<String> {
    self.gender_filter.get()
  }

  /// Query formed by the current cell values, whether or not it is active yet
  pub fn current_query(&self) -> CharacterQuery {
    CharacterQuery::from_parts(
      &self.search_text.get(),
      self.status_filter.get(),
      self.species_filter.get(),
      self.gender_filter.get(),
    )
  }

  /// Set the search text and apply any recognised filter keywords.
  pub fn update_search_query(&mut self, text: &str) {
    self.search_text.set(text.to_string());

    let hits = keywords::detect(text);
    if let Some(status) = hits.status {
      self.status_filter.set(Some(status.to_string()));
    }
    if let Some(species) = hits.species {
      self.species_filter.set(Some(species.to_string()));
    }
    if let Some(gender) = hits.gender {
      self.gender_filter.set(Some(gender.to_string()));
    }
    if !hits.is_empty() {
      debug!(?hits, "filters set from search text");
    }

    self.feed(Instant::now());
  }

  pub fn update_status_filter(&mut self, status: Option<String>) {
    self.status_filter.set(status);
    self.feed(Instant::now());
  }

  pub fn update_species_filter(&mut self, species: Option<String>) {
    self.species_filter.set(species);
    self.feed(Instant::now());
  }

  pub fn update_gender_filter(&mut self, gender: Option<String>) {
    self.gender_filter.set(gender);
    self.feed(Instant::now());
  }

  /// Reset search text and all filters together.
  pub fn clear_filters(&mut self) {
    self.search_text.set(String::new());
    self.status_filter.set(None);
    self.species_filter.set(None);
    self.gender_filter.set(None);
    self.feed(Instant::now());
  }

  /// True while an edit is waiting out the debounce window
  pub fn is_settling(&self) -> bool {
    self.debouncer.is_pending()
  }

  /// Advance the debouncer and collect finished loads.
  ///
  /// Returns `true` if anything visible changed.
  pub fn tick(&mut self, now: Instant) -> bool {
    self.feed(now);
    let mut changed = false;
    if let Some(query) = self.debouncer.poll(now) {
      self.switch_to(query);
      changed = true;
    }
    changed | self.pager.poll()
  }

  pub fn pager(&self) -> &Pager<R, S> {
    &self.pager
  }

  pub fn pager_mut(&mut self) -> &mut Pager<R, S> {
    &mut self.pager
  }

  pub fn repository(&self) -> &CharacterRepository<R, S> {
    &self.repository
  }

  /// Hand the combined query to the debouncer if any cell changed.
  fn feed(&mut self, now: Instant) {
    if self.cells.take_changed() {
      self.debouncer.observe(self.current_query(), now);
    }
  }

  fn switch_to(&mut self, query: CharacterQuery) {
    info!(%query, "query changed");
    let mut pager = self.repository.pages_for(query);
    pager.start();
    // The old pager aborts its loads when dropped here
    self.pager = pager;
  }
}
