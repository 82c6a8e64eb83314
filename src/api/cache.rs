//! Record store integration for API types.

use crate::store::Cacheable;

use super::types::Character;

impl Cacheable for Character {
  fn cache_id(&self) -> i64 {
    self.id
  }

  fn entity_type() -> &'static str {
    "character"
  }
}
