use crate::api::{Character, CharacterSource};
use crate::query::Query;
use crate::repository::CharacterRepository;
use crate::store::RecordStore;

/// State behind the character detail screen.
///
/// Shows the stored record straight away; `refresh` asks the API for a
/// fresh copy and swaps it in when it arrives.
pub struct CharacterDetailViewModel {
  id: i64,
  character: Option<Character>,
  local: Query<Option<Character>>,
  remote: Query<Option<Character>>,
}

impl CharacterDetailViewModel {
  pub fn new<R: CharacterSource, S: RecordStore>(
    repository: CharacterRepository<R, S>,
    id: i64,
  ) -> Self {
    let repo = repository.clone();
    let mut local = Query::new(move || {
      let result = repo.by_id(id).map_err(|e| e.to_string());
      async move { result }
    });
    local.fetch();

    let remote = Query::new(move || {
      let repo = repository.clone();
      async move { repo.refresh_by_id(id).await.map_err(|e| e.to_string()) }
    });

    Self {
      id,
      character: None,
      local,
      remote,
    }
  }

  /// Seed the screen with a record the caller already holds.
  pub fn with_character(mut self, character: Character) -> Self {
    self.character = Some(character);
    self
  }

  pub fn id(&self) -> i64 {
    self.id
  }

  pub fn character(&self) -> Option<&Character> {
    self.character.as_ref()
  }

  /// Fetch the record from the API, keeping the current one on screen.
  pub fn refresh(&mut self) {
    self.remote.refetch();
  }

  pub fn is_loading(&self) -> bool {
    self.local.is_loading() || self.remote.is_loading()
  }

  pub fn error(&self) -> Option<&str> {
    self.remote.error().or_else(|| self.local.error())
  }

  /// True once every lookup finished without finding the record
  pub fn is_missing(&self) -> bool {
    self.character.is_none() && !self.is_loading() && self.error().is_none()
  }

  pub fn tick(&mut self) -> bool {
    let mut changed = false;
    if self.local.poll() {
      changed = true;
      if let Some(Some(found)) = self.local.data() {
        // A fresher remote copy may already be on screen
        if self.remote.data().is_none() {
          self.character = Some(found.clone());
        }
      }
    }
    if self.remote.poll() {
      changed = true;
      if let Some(Some(fresh)) = self.remote.data() {
        self.character = Some(fresh.clone());
      }
    }
    changed
  }
}
