use super::source::{PageKey, INITIAL_KEY};

/// Pager tuning, fixed per listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
  /// Records per page
  pub page_size: usize,
  /// Never enabled: unloaded positions are simply absent
  pub enable_placeholders: bool,
  /// How close to either edge an access must land to trigger the next load
  pub prefetch_distance: usize,
}

impl PagingConfig {
  pub fn new(page_size: usize) -> Self {
    Self {
      page_size,
      enable_placeholders: false,
      prefetch_distance: page_size,
    }
  }
}

impl Default for PagingConfig {
  fn default() -> Self {
    Self::new(20)
  }
}

/// One loaded page, stored under the key it was requested with
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage<T> {
  pub key: PageKey,
  pub data: Vec<T>,
  pub prev_key: Option<PageKey>,
  pub next_key: Option<PageKey>,
}

/// Snapshot of the loaded page set, used to compute a refresh key
#[derive(Debug)]
pub struct PagingState<'a, T> {
  /// Loaded pages in key order
  pub pages: Vec<&'a LoadedPage<T>>,
  /// Most recently accessed item position, if any
  pub anchor_position: Option<usize>,
}

impl<'a, T> PagingState<'a, T> {
  /// Find the page holding `position`, clamping to the last page when the
  /// position is past the loaded items.
  pub fn closest_page_to_position(&self, position: usize) -> Option<&'a LoadedPage<T>> {
    let mut remaining = position;
    for page in self.pages.iter().copied() {
      if remaining < page.data.len() {
        return Some(page);
      }
      remaining -= page.data.len();
    }
    self.pages.last().copied()
  }

  /// Offset of `position` within the page that holds it, clamped the same
  /// way as [`Self::closest_page_to_position`].
  pub fn offset_in_page(&self, position: usize) -> Option<usize> {
    let mut remaining = position;
    for page in &self.pages {
      if remaining < page.data.len() {
        return Some(remaining);
      }
      remaining -= page.data.len();
    }
    self.pages.last().map(|page| page.data.len().saturating_sub(1))
  }
}

/// Key to restart loading from after the page set is invalidated.
///
/// Resumes at the page closest to the anchor so the user keeps their place;
/// `None` restarts from the initial page.
pub fn refresh_key<T>(state: &PagingState<'_, T>) -> Option<PageKey> {
  let anchor = state.anchor_position?;
  let page = state.closest_page_to_position(anchor)?;
  page
    .prev_key
    .and_then(|prev| prev.checked_add(1))
    .or_else(|| page.next_key.and_then(|next| next.checked_sub(1)))
    .filter(|key| *key >= INITIAL_KEY)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn page(key: PageKey, len: usize, prev: Option<PageKey>, next: Option<PageKey>) -> LoadedPage<u32> {
    LoadedPage {
      key,
      data: (0..len as u32).collect(),
      prev_key: prev,
      next_key: next,
    }
  }

  fn state<'a>(pages: &'a [LoadedPage<u32>], anchor: Option<usize>) -> PagingState<'a, u32> {
    PagingState {
      pages: pages.iter().collect(),
      anchor_position: anchor,
    }
  }

  #[test]
  fn test_closest_page_by_cumulative_position() {
    let pages = [
      page(1, 20, None, Some(2)),
      page(2, 20, Some(1), Some(3)),
      page(3, 5, Some(2), None),
    ];
    let state = state(&pages, None);
    assert_eq!(state.closest_page_to_position(0).unwrap().key, 1);
    assert_eq!(state.closest_page_to_position(19).unwrap().key, 1);
    assert_eq!(state.closest_page_to_position(20).unwrap().key, 2);
    assert_eq!(state.closest_page_to_position(44).unwrap().key, 3);
    // Past the end clamps to the last page
    assert_eq!(state.closest_page_to_position(500).unwrap().key, 3);
  }

  #[test]
  fn test_offset_in_page() {
    let pages = [
      page(1, 20, None, Some(2)),
      page(2, 20, Some(1), Some(3)),
      page(3, 5, Some(2), None),
    ];
    let state = state(&pages, None);
    assert_eq!(state.offset_in_page(3), Some(3));
    assert_eq!(state.offset_in_page(25), Some(5));
    assert_eq!(state.offset_in_page(44), Some(4));
    assert_eq!(state.offset_in_page(500), Some(4));
    assert_eq!(self::state(&[], None).offset_in_page(0), None);
  }

  #[test]
  fn test_closest_page_without_pages() {
    let state = state(&[], Some(3));
    assert!(state.closest_page_to_position(3).is_none());
    assert_eq!(refresh_key(&state), None);
  }

  #[test]
  fn test_refresh_key_prefers_prev_plus_one() {
    let pages = [page(4, 20, Some(3), Some(5)), page(5, 20, Some(4), Some(6))];
    assert_eq!(refresh_key(&state(&pages, Some(25))), Some(5));
    assert_eq!(refresh_key(&state(&pages, Some(3))), Some(4));
  }

  #[test]
  fn test_refresh_key_falls_back_to_next_minus_one() {
    let pages = [page(1, 20, None, Some(2))];
    assert_eq!(refresh_key(&state(&pages, Some(10))), Some(1));
  }

  #[test]
  fn test_refresh_key_none_when_no_neighbours() {
    let pages = [page(1, 3, None, None)];
    assert_eq!(refresh_key(&state(&pages, Some(1))), None);
  }

  #[test]
  fn test_refresh_key_none_without_anchor() {
    let pages = [page(2, 20, Some(1), Some(3))];
    assert_eq!(refresh_key(&state(&pages, None)), None);
  }

  #[test]
  fn test_config_defaults() {
    let config = PagingConfig::default();
    assert_eq!(config.page_size, 20);
    assert_eq!(config.prefetch_distance, 20);
    assert!(!config.enable_placeholders);
  }
}
