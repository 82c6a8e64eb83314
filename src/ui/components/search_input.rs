use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
  /// Text changed; emitted on each keystroke and on cancel
  Changed(String),
  /// Overlay closed, text kept
  Submitted,
}

/// Live search box shown as an overlay.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
  input: TextInput,
  active: bool,
  /// Text present when the overlay opened, restored on Esc
  original: String,
}

impl SearchInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open the overlay, editing `current`
  pub fn activate(&mut self, current: &str) {
    self.active = true;
    self.original = current.to_string();
    self.input.set_value(current);
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SearchEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        self.active = false;
        KeyResult::Event(SearchEvent::Submitted)
      }
      InputResult::Cancelled => {
        self.active = false;
        let original = std::mem::take(&mut self.original);
        self.input.set_value(&original);
        KeyResult::Event(SearchEvent::Changed(original))
      }
      InputResult::Consumed => KeyResult::Event(SearchEvent::Changed(self.input.value().to_string())),
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3.min(area.height));

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Search (name or keyword) ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let input_line = Line::from(vec![
      Span::styled("/", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);

    // One column for the prompt, then one per character
    let offset = (self.input.cursor_position() as u16 + 1).min(inner.width.saturating_sub(1));
    frame.set_cursor_position((inner.x + offset, inner.y));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::{KeyCode, KeyModifiers};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_inactive_ignores_keys() {
    let mut search = SearchInput::new();
    assert_eq!(search.handle_key(key(KeyCode::Char('x'))), KeyResult::NotHandled);
  }

  #[test]
  fn test_each_keystroke_emits_change() {
    let mut search = SearchInput::new();
    search.activate("Ric");
    assert_eq!(
      search.handle_key(key(KeyCode::Char('k'))),
      KeyResult::Event(SearchEvent::Changed("Rick".to_string()))
    );
    assert_eq!(
      search.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(SearchEvent::Submitted)
    );
    assert!(!search.is_active());
  }

  #[test]
  fn test_cancel_restores_original_text() {
    let mut search = SearchInput::new();
    search.activate("Morty");
    search.handle_key(key(KeyCode::Backspace));
    assert_eq!(
      search.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(SearchEvent::Changed("Morty".to_string()))
    );
  }
}
