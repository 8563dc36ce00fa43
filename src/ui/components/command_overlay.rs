use crate::commands::Command;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::ops::Range;

/// Completions shown at once; the window scrolls with the selection
const MAX_ROWS: usize = 5;

/// Command line docked to the bottom of `area`, completions stacked above it.
pub fn draw_command_overlay(
  frame: &mut Frame,
  area: Rect,
  input: &str,
  suggestions: &[Command],
  selected: usize,
) {
  let window = visible_window(suggestions.len(), selected, MAX_ROWS);
  let overlay = overlay_rect(area, window.len());
  if overlay.height == 0 {
    return;
  }
  frame.render_widget(Clear, overlay);

  let hint = if suggestions.is_empty() {
    " no match ".to_string()
  } else {
    format!(" {}/{} ", selected.min(suggestions.len() - 1) + 1, suggestions.len())
  };
  let block = Block::default()
    .borders(Borders::TOP)
    .border_style(Style::default().fg(Color::Yellow))
    .title(Line::from(hint).right_aligned());

  let mut lines: Vec<Line> = suggestions[window.clone()]
    .iter()
    .zip(window.clone())
    .map(|(cmd, i)| completion_line(*cmd, i == selected))
    .collect();
  lines.push(Line::from(vec![
    Span::styled(":", Style::default().fg(Color::Yellow)),
    Span::raw(input),
    Span::styled("_", Style::default().fg(Color::Yellow)),
  ]));

  frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

fn completion_line(cmd: Command, selected: bool) -> Line<'static> {
  let marker = if selected { "> " } else { "  " };
  let name_style = if selected {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::Cyan)
  };
  Line::from(vec![
    Span::styled(marker, Style::default().fg(Color::Yellow)),
    Span::styled(format!("{:<10}", cmd.name()), name_style),
    Span::styled(
      format!("{:<14}", cmd.aliases().join(" ")),
      Style::default().fg(Color::DarkGray),
    ),
    Span::raw(cmd.description()),
  ])
}

/// Border row, one row per completion, then the input row.
fn overlay_rect(area: Rect, rows: usize) -> Rect {
  let height = (rows as u16 + 2).min(area.height);
  Rect::new(area.x, area.bottom() - height, area.width, height)
}

/// Slice of `count` completions to show so that `selected` is on screen.
fn visible_window(count: usize, selected: usize, max: usize) -> Range<usize> {
  let len = count.min(max);
  let start = selected.saturating_sub(len.saturating_sub(1)).min(count - len);
  start..start + len
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_window_follows_selection() {
    assert_eq!(visible_window(0, 0, 5), 0..0);
    assert_eq!(visible_window(3, 2, 5), 0..3);
    assert_eq!(visible_window(8, 0, 5), 0..5);
    assert_eq!(visible_window(8, 4, 5), 0..5);
    assert_eq!(visible_window(8, 6, 5), 2..7);
    assert_eq!(visible_window(8, 7, 5), 3..8);
  }

  #[test]
  fn test_overlay_docks_to_bottom() {
    let area = Rect::new(0, 1, 80, 20);
    assert_eq!(overlay_rect(area, 3), Rect::new(0, 16, 80, 5));

    // Never taller than the content area
    let short = Rect::new(0, 1, 80, 2);
    assert_eq!(overlay_rect(short, 5), short);
  }
}
