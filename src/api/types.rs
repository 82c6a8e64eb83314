use serde::{Deserialize, Serialize};
use std::fmt;

/// Life status reported by the API ("Alive", "Dead", "unknown")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Status {
  Alive,
  Dead,
  #[default]
  #[serde(rename = "unknown")]
  Unknown,
}

impl From<String> for Status {
  fn from(value: String) -> Self {
    match value.to_lowercase().as_str() {
      "alive" => Status::Alive,
      "dead" => Status::Dead,
      _ => Status::Unknown,
    }
  }
}

impl Status {
  /// Value accepted by the `status` query parameter
  pub fn as_filter(&self) -> &'static str {
    match self {
      Status::Alive => "alive",
      Status::Dead => "dead",
      Status::Unknown => "unknown",
    }
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Status::Alive => "Alive",
      Status::Dead => "Dead",
      Status::Unknown => "unknown",
    };
    f.pad(label)
  }
}

/// Named link to another API resource (origin or last known location)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
  pub name: String,
  #[serde(default)]
  pub url: String,
}

/// A single character record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
  pub id: i64,
  pub name: String,
  #[serde(default)]
  pub status: Status,
  #[serde(default)]
  pub species: String,
  #[serde(rename = "type", default)]
  pub kind: String,
  #[serde(default)]
  pub gender: String,
  #[serde(default)]
  pub image: String,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub created: String,
  #[serde(default)]
  pub origin: Place,
  #[serde(default)]
  pub location: Place,
  #[serde(default)]
  pub episode: Vec<String>,
}

/// Filter tuple identifying one logical character listing.
///
/// `None` leaves a field unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CharacterQuery {
  pub name: Option<String>,
  pub status: Option<String>,
  pub species: Option<String>,
  pub gender: Option<String>,
}

impl CharacterQuery {
  /// Build a query from raw search text and filter selections.
  /// Blank search text means no name constraint.
  pub fn from_parts(
    search_text: &str,
    status: Option<String>,
    species: Option<String>,
    gender: Option<String>,
  ) -> Self {
    let name = search_text.trim();
    Self {
      name: (!name.is_empty()).then(|| name.to_string()),
      status,
      species,
      gender,
    }
  }

  pub fn is_unconstrained(&self) -> bool {
    self.name.is_none() && self.status.is_none() && self.species.is_none() && self.gender.is_none()
  }

  /// Whether a record satisfies this query the way the API filters:
  /// name is a case-insensitive substring, the rest match exactly.
  pub fn matches(&self, character: &Character) -> bool {
    let exact = |filter: &Option<String>, value: &str| {
      filter
        .as_deref()
        .map_or(true, |f| f.eq_ignore_ascii_case(value))
    };
    let name_ok = self.name.as_deref().map_or(true, |name| {
      character
        .name
        .to_lowercase()
        .contains(&name.to_lowercase())
    });

    name_ok
      && exact(&self.status, character.status.as_filter())
      && exact(&self.species, &character.species)
      && exact(&self.gender, &character.gender)
  }

  /// Query parameters for the character list endpoint, in a stable order
  pub fn params(&self) -> Vec<(&'static str, &str)> {
    let fields = [
      ("name", &self.name),
      ("status", &self.status),
      ("species", &self.species),
      ("gender", &self.gender),
    ];
    fields
      .into_iter()
      .filter_map(|(k, v)| v.as_deref().map(|v| (k, v)))
      .collect()
  }
}

impl fmt::Display for CharacterQuery {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_unconstrained() {
      return f.write_str("all");
    }
    let parts: Vec<String> = self
      .params()
      .into_iter()
      .map(|(k, v)| format!("{}={}", k, v))
      .collect();
    f.write_str(&parts.join(" "))
  }
}
