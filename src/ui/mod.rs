pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Main draw function: header, current view, footer
pub fn draw(frame: &mut Frame, app: &mut App) {
  let [header, body, footer] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(1),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  let breadcrumb = app.breadcrumb();
  let api_url = app.api_url().to_string();

  if let Some(view) = app.current_view_mut() {
    let context = view.context();
    let status = view.status();
    renderfns::draw_header(frame, header, &api_url, context.as_deref(), &view.shortcuts());
    view.render(frame, body);
    renderfns::draw_footer(frame, footer, &breadcrumb, status.as_deref());
  }
}

/// Keep a list selection inside `0..len`, selecting the first row when
/// items appear
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_ensure_valid_selection() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(0));

    state.select(Some(7));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));

    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
