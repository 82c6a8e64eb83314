use crate::api::Character;
use crate::ui::renderfns::status_color;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::viewmodel::CharacterDetailViewModel;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Full record for one character
pub struct CharacterDetailView {
  vm: CharacterDetailViewModel,
}

impl CharacterDetailView {
  pub fn new(vm: CharacterDetailViewModel) -> Self {
    Self { vm }
  }

  fn field<'a>(label: &'static str, value: impl Into<Span<'a>>) -> Line<'a> {
    Line::from(vec![
      Span::styled(format!("{:<10}", label), Style::default().fg(Color::DarkGray)),
      value.into(),
    ])
  }

  fn detail_lines(character: &Character) -> Vec<Line<'_>> {
    let kind = if character.kind.is_empty() {
      "-"
    } else {
      character.kind.as_str()
    };
    vec![
      Self::field(
        "Status",
        Span::styled(
          character.status.to_string(),
          Style::default().fg(status_color(character.status)),
        ),
      ),
      Self::field("Species", character.species.as_str()),
      Self::field("Type", kind),
      Self::field("Gender", character.gender.as_str()),
      Line::raw(""),
      Self::field("Origin", character.origin.name.as_str()),
      Self::field("Location", character.location.name.as_str()),
      Self::field("Episodes", character.episode.len().to_string()),
      Line::raw(""),
      Self::field("Image", Span::styled(character.image.as_str(), Style::default().fg(Color::Blue))),
      Self::field("Created", character.created.as_str()),
    ]
  }
}

impl View for CharacterDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.vm.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let name = self
      .vm
      .character()
      .map_or_else(|| format!("#{}", self.vm.id()), |c| c.name.clone());
    let title = if self.vm.is_loading() {
      format!(" {} (loading...) ", name)
    } else {
      format!(" {} ", name)
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = match self.vm.character() {
      Some(character) => Paragraph::new(Self::detail_lines(character)),
      None if self.vm.is_missing() => Paragraph::new(
        "Not in the local cache. Press 'r' to fetch it from the API.",
      )
      .style(Style::default().fg(Color::DarkGray)),
      None => match self.vm.error() {
        Some(error) => Paragraph::new(format!("Error: {}\n\nPress 'r' to retry.", error))
          .style(Style::default().fg(Color::Red)),
        None => Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray)),
      },
    };

    frame.render_widget(paragraph.block(block).wrap(Wrap { trim: true }), area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.vm.character() {
      Some(c) => c.name.clone(),
      None => format!("#{}", self.vm.id()),
    }
  }

  fn context(&self) -> Option<String> {
    Some(format!("character {}", self.vm.id()))
  }

  fn status(&self) -> Option<String> {
    self.vm.error().map(|e| e.to_string())
  }

  fn tick(&mut self) -> bool {
    self.vm.tick()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("r", "refresh"),
      ShortcutInfo::new("q", "back"),
    ]
  }
}
