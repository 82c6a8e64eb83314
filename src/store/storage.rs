//! Record store trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use super::traits::{CachedEntity, Cacheable};

/// Trait for record store backends.
///
/// Writes are expected to be serialized by the backend itself; callers do
/// no locking of their own.
pub trait RecordStore: Send + Sync + 'static {
  /// Insert or replace a batch of entities in one transaction.
  fn upsert_many<T: Cacheable>(&self, entities: &[T]) -> Result<()>;

  /// Insert or replace a single entity.
  fn upsert_one<T: Cacheable>(&self, entity: &T) -> Result<()> {
    self.upsert_many(std::slice::from_ref(entity))
  }

  /// Get a single entity by id.
  fn get_by_id<T: Cacheable>(&self, id: i64) -> Result<Option<CachedEntity<T>>>;

  /// All stored entities of a type, ordered by id.
  fn scan_all<T: Cacheable>(&self) -> Result<Vec<T>>;

  /// Stored entities whose top-level `field` equals `value` (case-insensitive).
  fn scan_where<T: Cacheable>(&self, field: &str, value: &str) -> Result<Vec<T>>;

  /// Remove every stored entity of a type, returning how many were removed.
  fn delete_all<T: Cacheable>(&self) -> Result<usize>;
}

/// SQLite-based record store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the store at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let store = Self::with_connection(conn)?;
    info!(path = %path.display(), "opened record store");
    Ok(store)
  }

  /// Open a throwaway store that lives only as long as this value.
  pub fn open_in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;
    Ok(store)
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Run database migrations for the record table.
  fn run_migrations(&self) -> Result<()> {
    self
      .lock()?
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  /// Deserialize rows, skipping any that no longer match the entity's shape.
  fn decode_rows<T: Cacheable>(rows: Vec<String>) -> Vec<T> {
    rows
      .into_iter()
      .filter_map(|data| match serde_json::from_str(&data) {
        Ok(entity) => Some(entity),
        Err(e) => {
          warn!(entity_type = T::entity_type(), error = %e, "skipping undecodable cached row");
          None
        }
      })
      .collect()
  }
}

/// Schema for the record table.
const STORE_SCHEMA: &str = r#"
-- Generic record table (stores serialized JSON text so json_extract works)
CREATE TABLE IF NOT EXISTS records (
    entity_type TEXT NOT NULL,
    id INTEGER NOT NULL,
    data TEXT NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (entity_type, id)
);
"#;

impl RecordStore for SqliteStore {
  fn upsert_many<T: Cacheable>(&self, entities: &[T]) -> Result<()> {
    let mut conn = self.lock()?;
    let entity_type = T::entity_type();

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    for entity in entities {
      let data =
        serde_json::to_string(entity).map_err(|e| eyre!("Failed to serialize entity: {}", e))?;

      tx.execute(
        "INSERT OR REPLACE INTO records (entity_type, id, data, cached_at)
         VALUES (?, ?, ?, datetime('now'))",
        params![entity_type, entity.cache_id(), data],
      )
      .map_err(|e| eyre!("Failed to store entity: {}", e))?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn get_by_id<T: Cacheable>(&self, id: i64) -> Result<Option<CachedEntity<T>>> {
    let conn = self.lock()?;
    let entity_type = T::entity_type();

    let mut stmt = conn
      .prepare(
        "SELECT data, cached_at FROM records
         WHERE entity_type = ? AND id = ?",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let result: Option<(String, String)> = stmt
      .query_row(params![entity_type, id], |row| Ok((row.get(0)?, row.get(1)?)))
      .optional()
      .map_err(|e| eyre!("Failed to look up entity {}: {}", id, e))?;

    match result {
      Some((data, cached_at_str)) => {
        let entity: T = serde_json::from_str(&data)
          .map_err(|e| eyre!("Failed to deserialize entity: {}", e))?;
        let cached_at = parse_datetime(&cached_at_str)?;
        Ok(Some(CachedEntity { entity, cached_at }))
      }
      None => Ok(None),
    }
  }

  fn scan_all<T: Cacheable>(&self) -> Result<Vec<T>> {
    let conn = self.lock()?;

    let mut stmt = conn
      .prepare("SELECT data FROM records WHERE entity_type = ? ORDER BY id")
      .map_err(|e| eyre!("Failed to prepare scan: {}", e))?;

    let rows: Vec<String> = stmt
      .query_map(params![T::entity_type()], |row| row.get(0))
      .map_err(|e| eyre!("Failed to scan records: {}", e))?
      .collect::<rusqlite::Result<_>>()
      .map_err(|e| eyre!("Failed to read record row: {}", e))?;

    Ok(Self::decode_rows(rows))
  }

  fn scan_where<T: Cacheable>(&self, field: &str, value: &str) -> Result<Vec<T>> {
    let conn = self.lock()?;
    let path = format!("$.{}", field);

    let mut stmt = conn
      .prepare(
        "SELECT data FROM records
         WHERE entity_type = ? AND lower(json_extract(data, ?)) = lower(?)
         ORDER BY id",
      )
      .map_err(|e| eyre!("Failed to prepare scan: {}", e))?;

    let rows: Vec<String> = stmt
      .query_map(params![T::entity_type(), path, value], |row| row.get(0))
      .map_err(|e| eyre!("Failed to scan records by {}: {}", field, e))?
      .collect::<rusqlite::Result<_>>()
      .map_err(|e| eyre!("Failed to read record row: {}", e))?;

    Ok(Self::decode_rows(rows))
  }

  fn delete_all<T: Cacheable>(&self) -> Result<usize> {
    let conn = self.lock()?;

    let removed = conn
      .execute(
        "DELETE FROM records WHERE entity_type = ?",
        params![T::entity_type()],
      )
      .map_err(|e| eyre!("Failed to clear records: {}", e))?;

    info!(entity_type = T::entity_type(), removed, "cleared record store");
    Ok(removed)
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Note {
    id: i64,
    title: String,
    tag: String,
  }

  impl Cacheable for Note {
    fn cache_id(&self) -> i64 {
      self.id
    }

    fn entity_type() -> &'static str {
      "note"
    }
  }

  fn note(id: i64, title: &str, tag: &str) -> Note {
    Note {
      id,
      title: title.to_string(),
      tag: tag.to_string(),
    }
  }

  #[test]
  fn test_upsert_and_get() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .upsert_many(&[note(1, "one", "a"), note(2, "two", "b")])
      .unwrap();

    let cached = store.get_by_id::<Note>(2).unwrap().unwrap();
    assert_eq!(cached.entity, note(2, "two", "b"));
    assert!(store.get_by_id::<Note>(3).unwrap().is_none());
  }

  #[test]
  fn test_upsert_replaces_same_id() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.upsert_one(&note(1, "old", "a")).unwrap();
    store.upsert_one(&note(1, "new", "a")).unwrap();

    let all = store.scan_all::<Note>().unwrap();
    assert_eq!(all, vec![note(1, "new", "a")]);
  }

  #[test]
  fn test_upsert_is_idempotent() {
    let store = SqliteStore::open_in_memory().unwrap();
    let batch = [note(3, "c", "x"), note(1, "a", "x")];
    store.upsert_many(&batch).unwrap();
    let first = store.scan_all::<Note>().unwrap();
    store.upsert_many(&batch).unwrap();
    assert_eq!(store.scan_all::<Note>().unwrap(), first);
    assert_eq!(first[0].id, 1);
  }

  #[test]
  fn test_scan_where_case_insensitive() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .upsert_many(&[note(1, "one", "Alien"), note(2, "two", "Human"), note(3, "three", "alien")])
      .unwrap();

    let aliens = store.scan_where::<Note>("tag", "ALIEN").unwrap();
    let ids: Vec<i64> = aliens.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(store.scan_where::<Note>("missing", "x").unwrap().is_empty());
  }

  #[test]
  fn test_delete_all_only_touches_entity_type() {
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Other {
      id: i64,
    }
    impl Cacheable for Other {
      fn cache_id(&self) -> i64 {
        self.id
      }
      fn entity_type() -> &'static str {
        "other"
      }
    }

    let store = SqliteStore::open_in_memory().unwrap();
    store.upsert_many(&[note(1, "a", "x"), note(2, "b", "y")]).unwrap();
    store.upsert_one(&Other { id: 1 }).unwrap();

    assert_eq!(store.delete_all::<Note>().unwrap(), 2);
    assert!(store.scan_all::<Note>().unwrap().is_empty());
    assert_eq!(store.scan_all::<Other>().unwrap().len(), 1);
  }

  #[test]
  fn test_open_on_disk_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");

    {
      let store = SqliteStore::open(&path).unwrap();
      store.upsert_one(&note(7, "seven", "z")).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let cached = store.get_by_id::<Note>(7).unwrap().unwrap();
    assert_eq!(cached.entity.title, "seven");
  }

  #[test]
  fn test_parse_datetime() {
    let dt = parse_datetime("2024-03-01 12:30:45").unwrap();
    assert_eq!(dt.to_rfc3339(), "2024-03-01T12:30:45+00:00");
    assert!(parse_datetime("yesterday").is_err());
  }
}
