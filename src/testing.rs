//! Test fixtures shared across modules.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{
  ApiCharacterPage, Character, CharacterQuery, CharacterSource, FetchError, PageInfo, Place,
  RemoteResponse, Status,
};

pub fn character(id: i64) -> Character {
  Character {
    id,
    name: format!("Character {}", id),
    status: if id % 2 == 0 { Status::Dead } else { Status::Alive },
    species: if id % 3 == 0 { "Alien" } else { "Human" }.to_string(),
    kind: String::new(),
    gender: if id % 2 == 0 { "Female" } else { "Male" }.to_string(),
    image: format!("https://example.test/avatar/{}.jpeg", id),
    url: format!("https://example.test/api/character/{}", id),
    created: "2017-11-04T18:48:46.250Z".to_string(),
    origin: Place {
      name: "Earth (C-137)".to_string(),
      url: String::new(),
    },
    location: Place::default(),
    episode: vec!["https://example.test/api/episode/1".to_string()],
  }
}

pub fn characters(ids: std::ops::RangeInclusive<i64>) -> Vec<Character> {
  ids.map(character).collect()
}

#[derive(Clone)]
enum Scripted {
  Page { results: Vec<Character>, has_next: bool },
  Rejected(u16),
  Malformed,
}

/// In-memory character source answering from a fixed script.
///
/// Pages that were never scripted panic, which lets tests check that the
/// loader contains failures.
#[derive(Default)]
pub struct ScriptedSource {
  pages: HashMap<u32, Scripted>,
  delays: HashMap<u32, Duration>,
  characters: HashMap<i64, Character>,
  offline: AtomicBool,
  calls: Mutex<Vec<(u32, CharacterQuery)>>,
}

impl ScriptedSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_page(mut self, page: u32, results: Vec<Character>, has_next: bool) -> Self {
    for c in &results {
      self.characters.insert(c.id, c.clone());
    }
    self.pages.insert(page, Scripted::Page { results, has_next });
    self
  }

  pub fn with_rejection(mut self, page: u32, status: u16) -> Self {
    self.pages.insert(page, Scripted::Rejected(status));
    self
  }

  pub fn with_malformed(mut self, page: u32) -> Self {
    self.pages.insert(page, Scripted::Malformed);
    self
  }

  pub fn with_delay(mut self, page: u32, delay: Duration) -> Self {
    self.delays.insert(page, delay);
    self
  }

  pub fn with_character(mut self, character: Character) -> Self {
    self.characters.insert(character.id, character);
    self
  }

  pub fn set_offline(&self, offline: bool) {
    self.offline.store(offline, Ordering::SeqCst);
  }

  /// Page requests seen so far, in arrival order
  pub fn calls(&self) -> Vec<(u32, CharacterQuery)> {
    self.calls.lock().unwrap().clone()
  }

  fn offline_error() -> FetchError {
    FetchError::Io(std::io::Error::new(
      std::io::ErrorKind::NotConnected,
      "network unreachable",
    ))
  }
}

impl CharacterSource for ScriptedSource {
  async fn fetch_page(
    &self,
    page: u32,
    query: &CharacterQuery,
  ) -> Result<RemoteResponse<ApiCharacterPage>, FetchError> {
    self.calls.lock().unwrap().push((page, query.clone()));

    if let Some(delay) = self.delays.get(&page) {
      tokio::time::sleep(*delay).await;
    }
    if self.offline.load(Ordering::SeqCst) {
      return Err(Self::offline_error());
    }

    match self.pages.get(&page).cloned() {
      Some(Scripted::Page { results, has_next }) => Ok(RemoteResponse::Success(ApiCharacterPage {
        info: PageInfo {
          count: results.len() as u64,
          pages: page.saturating_add(u32::from(has_next)),
          next: has_next.then(|| format!("https://example.test/api/character?page={}", u64::from(page) + 1)),
          prev: (page > 1).then(|| format!("https://example.test/api/character?page={}", page - 1)),
        },
        results,
      })),
      Some(Scripted::Rejected(status)) => Ok(RemoteResponse::Rejected { status }),
      Some(Scripted::Malformed) => {
        let err = serde_json::from_str::<ApiCharacterPage>("{not json").unwrap_err();
        Err(FetchError::Json(err))
      }
      None => panic!("page {} was not scripted", page),
    }
  }

  async fn fetch_character(&self, id: i64) -> Result<RemoteResponse<Character>, FetchError> {
    if self.offline.load(Ordering::SeqCst) {
      return Err(Self::offline_error());
    }
    match self.characters.get(&id) {
      Some(c) => Ok(RemoteResponse::Success(c.clone())),
      None => Ok(RemoteResponse::Rejected { status: 404 }),
    }
  }
}
