use std::time::Instant;

use crate::api::{CharacterQuery, CharacterSource};
use crate::paging::LoadState;
use crate::store::RecordStore;
use crate::ui::components::{FilterField, FilterPicker, KeyResult, PickerEvent, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::CharacterDetailView;
use crate::viewmodel::{CharacterDetailViewModel, CharactersViewModel};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Scrollable character listing with live search and filter pickers
pub struct CharacterListView<R: CharacterSource, S: RecordStore> {
  vm: CharactersViewModel<R, S>,
  list_state: ListState,
  search: SearchInput,
  picker: FilterPicker,
  /// Query the selection belongs to; a new listing resets it
  shown_query: CharacterQuery,
}

impl<R: CharacterSource, S: RecordStore> CharacterListView<R, S> {
  pub fn new(vm: CharactersViewModel<R, S>) -> Self {
    let shown_query = vm.pager().query().clone();
    Self {
      vm,
      list_state: ListState::default(),
      search: SearchInput::new(),
      picker: FilterPicker::new(),
      shown_query,
    }
  }

  fn move_selection(&mut self, delta: isize) {
    let len = self.vm.pager().len();
    if len == 0 {
      return;
    }
    let current = self.list_state.selected().unwrap_or(0);
    let next = current.saturating_add_signed(delta).min(len - 1);
    self.list_state.select(Some(next));
    self.vm.pager_mut().access(next);
  }

  fn apply_filter(&mut self, field: FilterField, value: Option<String>) {
    match field {
      FilterField::Status => self.vm.update_status_filter(value),
      FilterField::Species => self.vm.update_species_filter(value),
      FilterField::Gender => self.vm.update_gender_filter(value),
    }
  }

  fn open_selected(&self) -> ViewAction {
    let selected = self
      .list_state
      .selected()
      .and_then(|i| self.vm.pager().get(i));
    match selected {
      Some(character) => {
        let vm = CharacterDetailViewModel::new(self.vm.repository().clone(), character.id)
          .with_character(character.clone());
        ViewAction::Push(Box::new(CharacterDetailView::new(vm)))
      }
      None => ViewAction::None,
    }
  }

  fn refresh(&mut self) {
    let pager = self.vm.pager_mut();
    if pager.error().is_some() {
      pager.retry();
    } else {
      pager.refresh();
    }
  }

  fn render_filters(&self, frame: &mut Frame, area: Rect) {
    let field = |label: &'static str, value: Option<String>| {
      let (text, style) = match value {
        Some(v) => (v, Style::default().fg(Color::Yellow)),
        None => ("any".to_string(), Style::default().fg(Color::DarkGray)),
      };
      vec![
        Span::styled(format!(" {}: ", label), Style::default().fg(Color::DarkGray)),
        Span::styled(text, style),
      ]
    };

    let search = self.vm.search_text();
    let mut spans = field("name", (!search.trim().is_empty()).then_some(search));
    spans.extend(field("status", self.vm.status_filter()));
    spans.extend(field("species", self.vm.species_filter()));
    spans.extend(field("gender", self.vm.gender_filter()));
    if self.vm.is_settling() {
      spans.push(Span::styled("  …", Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let pager = self.vm.pager();
    let len = pager.len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = if pager.refresh_state().is_loading() {
      " Characters (loading...) ".to_string()
    } else if pager.prepend_state().is_loading() {
      format!(" Characters ({}, loading earlier...) ", len)
    } else {
      format!(" Characters ({}) ", len)
    };
    let bottom = match pager.append_state() {
      LoadState::Loading => " loading more... ".to_string(),
      LoadState::Error(e) => format!(" {} - press r to retry ", e),
      LoadState::NotLoading { end_reached: true } if len > 0 => " end of list ".to_string(),
      LoadState::NotLoading { .. } => String::new(),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .title_bottom(Line::from(bottom).right_aligned())
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !pager.is_loading() {
      let content = match pager.error() {
        Some(err) => format!("Failed to load characters: {}\n\nPress 'r' to retry.", err),
        None => "No characters match.".to_string(),
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = pager
      .items()
      .map(|c| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:>4} ", c.id), Style::default().fg(Color::Cyan)),
          Span::raw(format!("{:<30}", truncate(&c.name, 30))),
          Span::styled(
            format!("{:<9}", c.status.to_string()),
            Style::default().fg(status_color(c.status)),
          ),
          Span::raw(format!("{:<16}", truncate(&c.species, 16))),
          Span::styled(c.gender.clone(), Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl<R: CharacterSource, S: RecordStore> View for CharacterListView<R, S> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(field, value)) => {
        self.apply_filter(field, value);
        return ViewAction::None;
      }
      KeyResult::Event(PickerEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(text)) => {
        self.vm.update_search_query(&text);
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('/') => self.search.activate(&self.vm.search_text()),
      KeyCode::Char('s') => self
        .picker
        .show(FilterField::Status, self.vm.status_filter().as_deref()),
      KeyCode::Char('p') => self
        .picker
        .show(FilterField::Species, self.vm.species_filter().as_deref()),
      KeyCode::Char('g') => self
        .picker
        .show(FilterField::Gender, self.vm.gender_filter().as_deref()),
      KeyCode::Char('c') => self.vm.clear_filters(),
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
      KeyCode::PageDown => self.move_selection(10),
      KeyCode::PageUp => self.move_selection(-10),
      KeyCode::Enter => return self.open_selected(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let [filters, list] =
      Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).areas(area);

    self.render_filters(frame, filters);
    self.render_list(frame, list);
    self.search.render_overlay(frame, list);
    self.picker.render_overlay(frame, list);
  }

  fn breadcrumb_label(&self) -> String {
    "Characters".to_string()
  }

  fn context(&self) -> Option<String> {
    Some(self.vm.pager().query().to_string())
  }

  fn status(&self) -> Option<String> {
    self
      .vm
      .pager()
      .error()
      .map(|e| format!("{} (r to retry)", e))
  }

  fn tick(&mut self) -> bool {
    let changed = self.vm.tick(Instant::now());
    if self.vm.pager().query() != &self.shown_query {
      self.shown_query = self.vm.pager().query().clone();
      self.list_state.select(None);
    } else if changed {
      // Selection tracks the anchor across prepends and refreshes
      if let Some(anchor) = self.vm.pager().anchor_position() {
        self.list_state.select(Some(anchor));
      }
    }
    ensure_valid_selection(&mut self.list_state, self.vm.pager().len());
    changed
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("/", "search"),
      ShortcutInfo::new("s", "status"),
      ShortcutInfo::new("p", "species"),
      ShortcutInfo::new("g", "gender"),
      ShortcutInfo::new("c", "clear"),
      ShortcutInfo::new("r", "refresh"),
      ShortcutInfo::new("q", "quit"),
    ]
  }
}
