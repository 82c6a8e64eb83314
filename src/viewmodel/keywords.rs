//! Keyword heuristics for the search box.
//!
//! Typing a recognised word such as "dead" or "робот" sets the matching
//! filter. Words are compared whole and case-insensitively.

/// Filter values offered by the pickers, in display order
pub const STATUS_OPTIONS: &[&str] = &["alive", "dead", "unknown"];
pub const SPECIES_OPTIONS: &[&str] = &[
  "human",
  "alien",
  "humanoid",
  "poopybutthole",
  "mythological",
  "unknown",
  "animal",
  "disease",
  "robot",
  "cronenberg",
  "planet",
];
pub const GENDER_OPTIONS: &[&str] = &["female", "male", "genderless", "unknown"];

// "unknown" is valid for every field, so it is never inferred from text
const STATUS_KEYWORDS: &[(&str, &str)] = &[
  ("alive", "alive"),
  ("living", "alive"),
  ("живой", "alive"),
  ("живая", "alive"),
  ("живые", "alive"),
  ("dead", "dead"),
  ("мертвый", "dead"),
  ("мёртвый", "dead"),
  ("мертвая", "dead"),
  ("мёртвая", "dead"),
  ("мертвые", "dead"),
  ("мёртвые", "dead"),
];

const SPECIES_KEYWORDS: &[(&str, &str)] = &[
  ("human", "human"),
  ("humans", "human"),
  ("человек", "human"),
  ("люди", "human"),
  ("alien", "alien"),
  ("aliens", "alien"),
  ("пришелец", "alien"),
  ("инопланетянин", "alien"),
  ("humanoid", "humanoid"),
  ("гуманоид", "humanoid"),
  ("robot", "robot"),
  ("робот", "robot"),
  ("animal", "animal"),
  ("животное", "animal"),
  ("cronenberg", "cronenberg"),
  ("кроненберг", "cronenberg"),
];

const GENDER_KEYWORDS: &[(&str, &str)] = &[
  ("female", "female"),
  ("woman", "female"),
  ("женщина", "female"),
  ("женский", "female"),
  ("male", "male"),
  ("man", "male"),
  ("мужчина", "male"),
  ("мужской", "male"),
  ("genderless", "genderless"),
  ("бесполый", "genderless"),
];

/// Filter values inferred from free text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordHits {
  pub status: Option<&'static str>,
  pub species: Option<&'static str>,
  pub gender: Option<&'static str>,
}

impl KeywordHits {
  pub fn is_empty(&self) -> bool {
    self.status.is_none() && self.species.is_none() && self.gender.is_none()
  }
}

/// Scan `text` word by word; the first hit per field wins.
pub fn detect(text: &str) -> KeywordHits {
  let mut hits = KeywordHits::default();
  for word in text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
  {
    let word = word.to_lowercase();
    hits.status = hits.status.or_else(|| lookup(STATUS_KEYWORDS, &word));
    hits.species = hits.species.or_else(|| lookup(SPECIES_KEYWORDS, &word));
    hits.gender = hits.gender.or_else(|| lookup(GENDER_KEYWORDS, &word));
  }
  hits
}

fn lookup(table: &[(&str, &'static str)], word: &str) -> Option<&'static str> {
  table
    .iter()
    .find(|(keyword, _)| *keyword == word)
    .map(|(_, value)| *value)
}
