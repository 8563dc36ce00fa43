use crate::state::PaginationState;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Status line for the active view: page cursor, loading flag and last error
pub fn draw_footer(
  frame: &mut Frame,
  area: Rect,
  pagination: Option<PaginationState>,
  loading: bool,
  error: Option<&str>,
) {
  let mut spans = vec![Span::raw(" ")];
  spans.extend(pagination_spans(pagination));

  if loading {
    spans.push(Span::styled(
      "  loading...",
      Style::default().fg(Color::DarkGray),
    ));
  }

  if let Some(error) = error {
    spans.push(Span::styled("  │ ", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!("error: {}", error),
      Style::default().fg(Color::Red),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

fn pagination_spans(pagination: Option<PaginationState>) -> Vec<Span<'static>> {
  let Some(p) = pagination else {
    return vec![Span::styled("page -", Style::default().fg(Color::DarkGray))];
  };

  let arrow = |enabled: bool, text: &'static str| {
    let color = if enabled { Color::Cyan } else { Color::DarkGray };
    Span::styled(text, Style::default().fg(color))
  };

  vec![
    arrow(p.has_prev, "◀ "),
    Span::styled(
      format!("page {}", p.current_page),
      Style::default().fg(Color::White).bold(),
    ),
    arrow(p.has_next, " ▶"),
  ]
}
