use crate::api::ResourceKind;
use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::utils::spinner_glyph;

/// Draw the header bar with logo, source, resource tabs, spinner and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  active: ResourceKind,
  spinner: Option<usize>,
  shortcuts: &[ShortcutInfo],
) {
  let mut spans = vec![
    Span::styled(" inctui ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
  ];

  for resource in ResourceKind::ALL {
    let style = if resource == active {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };
    spans.push(Span::styled(format!(" {} ", resource.label()), style));
  }

  // Fixed width so the shortcuts don't jump while loading
  let glyph = spinner.map(spinner_glyph).unwrap_or(' ');
  spans.push(Span::styled(
    format!(" {} ", glyph),
    Style::default().fg(Color::Cyan),
  ));

  let mut shortcuts = shortcuts.to_vec();
  shortcuts.sort_by_key(|s| s.priority);
  for shortcut in shortcuts {
    // Keys highlighted, descriptions dimmed
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
