//! One-shot async lookups polled from the UI tick.
//!
//! A `Query<T>` owns a fetcher closure. `fetch()` spawns it on the runtime and
//! `poll()` picks up the outcome without blocking, so render code only ever
//! reads plain state. The last good value survives a refetch, which lets a
//! screen keep showing a record while it is being refreshed.
//!
//! ```ignore
//! let repo = repository.clone();
//! let mut query = Query::new(move || {
//!   let repo = repo.clone();
//!   async move { repo.by_id(1).map_err(|e| e.to_string()) }
//! });
//! query.fetch();
//!
//! // on tick
//! if query.poll() {
//!   // redraw
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryStatus {
  Idle,
  Loading,
  Ready,
  Failed(String),
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

pub struct Query<T> {
  status: QueryStatus,
  data: Option<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Query<T> {
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      status: QueryStatus::Idle,
      data: None,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      task: None,
    }
  }

  /// Last successfully fetched value, kept across refetches and failures.
  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn error(&self) -> Option<&str> {
    match &self.status {
      QueryStatus::Failed(e) => Some(e),
      _ => None,
    }
  }

  /// Start fetching unless a fetch is already running.
  pub fn fetch(&mut self) {
    if self.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Abandon any running fetch and start over.
  pub fn refetch(&mut self) {
    self.cancel();
    self.start_fetch();
  }

  /// Pick up a finished fetch. Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = &mut self.receiver else {
      return false;
    };

    let outcome = match receiver.try_recv() {
      Ok(outcome) => outcome,
      Err(mpsc::error::TryRecvError::Empty) => return false,
      Err(mpsc::error::TryRecvError::Disconnected) => Err("Lookup was cancelled".to_string()),
    };

    match outcome {
      Ok(data) => {
        self.data = Some(data);
        self.status = QueryStatus::Ready;
      }
      Err(error) => self.status = QueryStatus::Failed(error),
    }
    self.receiver = None;
    self.task = None;
    true
  }

  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.status = QueryStatus::Loading;

    let future = (self.fetcher)();
    self.task = Some(tokio::spawn(async move {
      let _ = tx.send(future.await);
    }));
  }

  fn cancel(&mut self) {
    self.receiver = None;
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("status", &self.status)
      .field("data", &self.data)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|| async { Ok::<_, String>(vec![1, 2, 3]) });
    assert!(!query.is_loading());
    assert_eq!(query.data(), None);

    query.fetch();
    assert!(query.is_loading());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.error(), None);
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
    assert!(!query.poll());
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> = Query::new(|| async { Err("no such character".to_string()) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert_eq!(query.error(), Some("no such character"));
    assert_eq!(query.data(), None);
  }

  #[tokio::test]
  async fn test_data_survives_failed_refetch() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let mut query = Query::new(move || {
      let n = counter.fetch_add(1, Ordering::SeqCst);
      async move {
        if n == 0 {
          Ok("Rick".to_string())
        } else {
          Err("offline".to_string())
        }
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    query.refetch();
    assert!(query.is_loading());
    assert_eq!(query.data().map(String::as_str), Some("Rick"));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(query.poll());
    assert_eq!(query.error(), Some("offline"));
    assert_eq!(query.data().map(String::as_str), Some("Rick"));
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let mut query = Query::new(move || {
      counter.fetch_add(1, Ordering::SeqCst);
      async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, String>(42)
      }
    });

    query.fetch();
    query.fetch();
    assert!(query.is_loading());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refetch_discards_pending() {
    let counter = Arc::new(AtomicU32::new(0));
    let clone = Arc::clone(&counter);

    let mut query = Query::new(move || {
      let n = clone.fetch_add(1, Ordering::SeqCst);
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok::<_, String>(n)
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.refetch();
    tokio::time::sleep(Duration::from_millis(100)).await;

    query.poll();
    assert_eq!(query.data(), Some(&1));
  }
}
