use crate::logging::LogRecord;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::Level;

fn level_color(level: Level) -> Color {
  match level {
    Level::ERROR => Color::Red,
    Level::WARN => Color::Yellow,
    Level::INFO => Color::Green,
    _ => Color::DarkGray,
  }
}

/// Draw the most recent log records, newest at the bottom
pub fn draw_logs(frame: &mut Frame, area: Rect, records: &[LogRecord]) {
  let block = Block::default()
    .title(" Logs ")
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let visible = area.height.saturating_sub(2) as usize;
  let skip = records.len().saturating_sub(visible);
  let lines: Vec<Line> = records
    .iter()
    .skip(skip)
    .map(|record| {
      Line::from(vec![
        Span::styled(
          record.at.format("%H:%M:%S ").to_string(),
          Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
          format!("{:<5} ", record.level),
          Style::default().fg(level_color(record.level)),
        ),
        Span::raw(record.message.as_str()),
      ])
    })
    .collect();

  frame.render_widget(Paragraph::new(lines).block(block), area);
}
