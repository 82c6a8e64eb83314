//! Core traits and types for the record store.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Trait for entities that can be stored.
///
/// Implementors provide a unique integer id; storing the same id again
/// overwrites the previous record.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Unique identifier for this entity
  fn cache_id(&self) -> i64;

  /// Entity type name for storage organization (e.g., "character")
  fn entity_type() -> &'static str;
}

/// A single stored entity.
#[derive(Debug, Clone)]
pub struct CachedEntity<T> {
  /// The stored entity
  pub entity: T,
  /// When the entity was last written
  pub cached_at: DateTime<Utc>,
}
