use std::time::{Duration, Instant};

use crate::api::CharacterQuery;

/// Debounce + distinct filter over the combined query.
///
/// Every observed query restarts the quiet period. Once the window passes
/// without a new observation the latest query is emitted, unless it equals
/// the last one emitted.
#[derive(Debug)]
pub struct QueryDebouncer {
  window: Duration,
  pending: Option<(CharacterQuery, Instant)>,
  last_emitted: Option<CharacterQuery>,
}

impl QueryDebouncer {
  pub fn new(window: Duration) -> Self {
    Self {
      window,
      pending: None,
      last_emitted: None,
    }
  }

  /// Record the latest combined query as of `now`.
  pub fn observe(&mut self, query: CharacterQuery, now: Instant) {
    self.pending = Some((query, now));
  }

  /// Emit immediately, bypassing the window (used for the initial query).
  pub fn emit_now(&mut self, query: CharacterQuery) -> Option<CharacterQuery> {
    self.pending = None;
    self.emit(query)
  }

  /// Emit the pending query if its quiet period has elapsed.
  pub fn poll(&mut self, now: Instant) -> Option<CharacterQuery> {
    let ready = matches!(&self.pending, Some((_, at)) if now.saturating_duration_since(*at) >= self.window);
    if !ready {
      return None;
    }
    let (query, _) = self.pending.take()?;
    self.emit(query)
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }

  fn emit(&mut self, query: CharacterQuery) -> Option<CharacterQuery> {
    if self.last_emitted.as_ref() == Some(&query) {
      return None;
    }
    self.last_emitted = Some(query.clone());
    Some(query)
  }
}
