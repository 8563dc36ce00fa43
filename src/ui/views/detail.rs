use crate::api::Record;
use crate::state::{DetailLoadState, Row};
use crate::ui::view::DetailDisplay;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Draw the detail pane for one row
pub fn draw_detail<S: Record, D: DetailDisplay>(frame: &mut Frame, area: Rect, row: &Row<S, D>) {
  let id = row.record.id();
  let title = match &row.detail {
    DetailLoadState::Loading => format!(" {} (loading...) ", id),
    DetailLoadState::Error(_) => format!(" {} (error) ", id),
    _ => format!(" {} ", id),
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let paragraph = match &row.detail {
    DetailLoadState::Loaded(detail) => Paragraph::new(detail.detail_lines()),
    DetailLoadState::Error(e) => Paragraph::new(format!("Error: {}\n\nPress Enter to retry.", e))
      .style(Style::default().fg(Color::Red)),
    DetailLoadState::Loading | DetailLoadState::Unloaded => {
      Paragraph::new("Loading details...").style(Style::default().fg(Color::DarkGray))
    }
  };

  frame.render_widget(paragraph.block(block).wrap(Wrap { trim: false }), area);
}
