mod components;
mod renderfns;
pub mod view;
mod views;

use crate::api::{Record, ResourceKind};
use crate::app::{App, Mode};
use crate::state::ListView;
use ratatui::prelude::*;
use view::{DetailDisplay, RowDisplay, ShortcutInfo};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status line
    ])
    .split(frame.area());

  let state = app.state();
  let spinner = state.is_busy().then_some(state.spinner_frame);
  renderfns::draw_header(
    frame,
    chunks[0],
    app.title(),
    state.active,
    spinner,
    &shortcuts(),
  );

  if state.show_logs {
    views::draw_logs(frame, chunks[1], &app.logger().recent());
  } else {
    match state.active {
      ResourceKind::Incidents => draw_resource(frame, chunks[1], "Incidents", &state.incidents),
      ResourceKind::Alerts => draw_resource(frame, chunks[1], "Alerts", &state.alerts),
    }
  }

  match state.active {
    ResourceKind::Incidents => draw_status(frame, chunks[2], &state.incidents),
    ResourceKind::Alerts => draw_status(frame, chunks[2], &state.alerts),
  }

  if app.mode() == &Mode::Command {
    components::draw_command_overlay(
      frame,
      chunks[1],
      app.command_input(),
      &app.autocomplete_suggestions(),
      app.selected_suggestion(),
    );
  }
}

fn shortcuts() -> Vec<ShortcutInfo> {
  vec![
    ShortcutInfo::new(":", "command").with_priority(10),
    ShortcutInfo::new("tab", "switch").with_priority(20),
    ShortcutInfo::new("n/p", "page").with_priority(30),
    ShortcutInfo::new("s", "sort").with_priority(40),
    ShortcutInfo::new("r", "refresh").with_priority(50),
    ShortcutInfo::new("L", "logs").with_priority(60),
    ShortcutInfo::new("q", "back"),
  ]
}

/// List on the left, detail pane on the right when one is open
fn draw_resource<S: Record + RowDisplay, D: DetailDisplay>(
  frame: &mut Frame,
  area: Rect,
  label: &str,
  view: &ListView<S, D>,
) {
  let open = view.open_detail.and_then(|i| view.rows.get(i));
  let Some(row) = open else {
    views::draw_list(frame, area, label, view);
    return;
  };

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
    .split(area);
  views::draw_list(frame, chunks[0], label, view);
  views::draw_detail(frame, chunks[1], row);
}

fn draw_status<S: Record, D>(frame: &mut Frame, area: Rect, view: &ListView<S, D>) {
  renderfns::draw_footer(
    frame,
    area,
    view.pagination,
    view.list_loading,
    view.error.as_deref(),
  );
}
