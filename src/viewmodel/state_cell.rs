use tokio::sync::watch;

/// Observable value with a single writer.
///
/// Readers either sample it with [`StateCell::get`] or subscribe for change
/// notifications. Writing an equal value notifies nobody.
#[derive(Debug)]
pub struct StateCell<T> {
  tx: watch::Sender<T>,
}

impl<T: Clone + PartialEq> StateCell<T> {
  pub fn new(initial: T) -> Self {
    let (tx, _rx) = watch::channel(initial);
    Self { tx }
  }

  pub fn get(&self) -> T {
    self.tx.borrow().clone()
  }

  /// Replace the value. Returns `true` if it actually changed.
  pub fn set(&self, value: T) -> bool {
    self.tx.send_if_modified(|current| {
      if *current == value {
        false
      } else {
        *current = value;
        true
      }
    })
  }

  pub fn subscribe(&self) -> watch::Receiver<T> {
    self.tx.subscribe()
  }
}

impl<T: Clone + PartialEq + Default> Default for StateCell<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}
