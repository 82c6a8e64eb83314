use super::KeyResult;
use crate::viewmodel::keywords::{GENDER_OPTIONS, SPECIES_OPTIONS, STATUS_OPTIONS};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Which filter a picker edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
  Status,
  Species,
  Gender,
}

impl FilterField {
  pub fn title(&self) -> &'static str {
    match self {
      FilterField::Status => "Status",
      FilterField::Species => "Species",
      FilterField::Gender => "Gender",
    }
  }

  pub fn options(&self) -> &'static [&'static str] {
    match self {
      FilterField::Status => STATUS_OPTIONS,
      FilterField::Species => SPECIES_OPTIONS,
      FilterField::Gender => GENDER_OPTIONS,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
  /// `None` means "All", i.e. clear the filter
  Selected(FilterField, Option<String>),
  Cancelled,
}

/// Overlay list for choosing one filter value. Row 0 is "All".
#[derive(Debug, Clone, Default)]
pub struct FilterPicker {
  field: Option<FilterField>,
  selected: usize,
}

impl FilterPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.field.is_some()
  }

  /// Open for `field` with the row for `current` highlighted
  pub fn show(&mut self, field: FilterField, current: Option<&str>) {
    self.selected = current
      .and_then(|value| field.options().iter().position(|o| *o == value))
      .map_or(0, |i| i + 1);
    self.field = Some(field);
  }

  pub fn hide(&mut self) {
    self.field = None;
    self.selected = 0;
  }

  fn row_count(field: FilterField) -> usize {
    field.options().len() + 1
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PickerEvent> {
    let Some(field) = self.field else {
      return KeyResult::NotHandled;
    };
    let rows = Self::row_count(field);

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(PickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let value = match self.selected {
          0 => None,
          i => field.options().get(i - 1).map(|o| o.to_string()),
        };
        self.hide();
        KeyResult::Event(PickerEvent::Selected(field, value))
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.selected = (self.selected + 1) % rows;
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.selected = (self.selected + rows - 1) % rows;
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    let Some(field) = self.field else {
      return;
    };

    let labels: Vec<&str> = std::iter::once("All")
      .chain(field.options().iter().copied())
      .collect();
    let longest = labels.iter().map(|l| l.len()).max().unwrap_or(10) as u16;
    let width = (longest + 6).max(20).min(area.width);
    let height = (labels.len() as u16 + 2).min(area.height);

    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", field.title()));

    let items: Vec<ListItem> = labels
      .iter()
      .map(|label| ListItem::new(Span::styled(*label, Style::default().fg(Color::Cyan))))
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));
    frame.render_stateful_widget(list, overlay_area, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_highlights_current_value() {
    let mut picker = FilterPicker::new();
    picker.show(FilterField::Status, Some("dead"));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected(
        FilterField::Status,
        Some("dead".to_string())
      ))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_all_row_clears_filter() {
    let mut picker = FilterPicker::new();
    picker.show(FilterField::Gender, None);
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected(FilterField::Gender, None))
    );
  }

  #[test]
  fn test_navigation_wraps() {
    let mut picker = FilterPicker::new();
    picker.show(FilterField::Status, None);
    picker.handle_key(key(KeyCode::Up));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected(
        FilterField::Status,
        Some("unknown".to_string())
      ))
    );
  }

  #[test]
  fn test_cancel() {
    let mut picker = FilterPicker::new();
    picker.show(FilterField::Species, Some("robot"));
    assert_eq!(
      picker.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(PickerEvent::Cancelled)
    );
    assert_eq!(picker.handle_key(key(KeyCode::Enter)), KeyResult::NotHandled);
  }
}
