use crate::api::Record;
use crate::state::{ListView, ViewPhase};
use crate::ui::view::RowDisplay;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Draw one resource list with its selection
pub fn draw_list<S: Record + RowDisplay, D>(
  frame: &mut Frame,
  area: Rect,
  label: &str,
  view: &ListView<S, D>,
) {
  let title = match view.phase() {
    ViewPhase::ListLoading => format!(" {} (loading...) ", label),
    _ => format!(" {} ({}) [{}] ", label, view.rows.len(), view.sort),
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  if view.rows.is_empty() {
    let content = if view.list_loading || (view.pagination.is_none() && view.error.is_none()) {
      "Loading..."
    } else if view.error.is_some() {
      "Failed to load. Press 'r' to retry."
    } else {
      "Nothing here."
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
    return;
  }

  let items: Vec<ListItem> = view
    .rows
    .iter()
    .map(|row| ListItem::new(row.record.row_line()))
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(view.selected.min(view.rows.len() - 1)));
  frame.render_stateful_widget(list, area, &mut state);
}
