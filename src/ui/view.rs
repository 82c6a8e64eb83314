use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Go back; popping the root view quits
  Pop,
}

/// Screen behaviour.
///
/// Views own their view model and input components, and hand navigation
/// back to the App as a [`ViewAction`]. Async state is advanced from
/// `tick()`, never from `render()`.
pub trait View {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  fn render(&mut self, frame: &mut Frame, area: Rect);

  fn breadcrumb_label(&self) -> String;

  /// Extra context for the header, such as the active query
  fn context(&self) -> Option<String> {
    None
  }

  /// Short status for the footer, such as a load error
  fn status(&self) -> Option<String> {
    None
  }

  /// Poll async work. Returns `true` if a redraw is needed.
  fn tick(&mut self) -> bool {
    false
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("q", "back")]
  }
}
