//! Serde-deserializable types matching the character API responses.
//!
//! The character record itself deserializes directly into the domain type;
//! only the list envelope lives here.

use serde::Deserialize;

use super::types::Character;

/// Pagination metadata returned alongside each list page
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageInfo {
  #[serde(default)]
  pub count: u64,
  #[serde(default)]
  pub pages: u32,
  pub next: Option<String>,
  pub prev: Option<String>,
}

impl PageInfo {
  /// The API omits `next` on the terminal page
  pub fn has_next(&self) -> bool {
    self.next.is_some()
  }
}

/// `GET /character` response envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiCharacterPage {
  #[serde(default)]
  pub info: PageInfo,
  #[serde(default)]
  pub results: Vec<Character>,
}
