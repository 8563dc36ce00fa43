use crate::api::{Alert, AlertDetail, Incident, IncidentDetail};
use crate::ui::renderfns::{severity_color, status_color, truncate};
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// How a list record renders as one table line
pub trait RowDisplay {
  fn row_line(&self) -> Line<'_>;
}

/// How a detail record renders in the detail pane
pub trait DetailDisplay {
  fn detail_lines(&self) -> Vec<Line<'_>>;
}

fn label(text: &'static str) -> Span<'static> {
  Span::styled(text, Style::default().fg(Color::DarkGray))
}

fn field<'a>(name: &'static str, value: &'a str) -> Line<'a> {
  Line::from(vec![label(name), Span::raw(value)])
}

fn list_field(name: &'static str, values: &[String]) -> Line<'static> {
  let value = if values.is_empty() {
    "-".to_string()
  } else {
    values.join(", ")
  };
  Line::from(vec![label(name), Span::raw(value)])
}

impl RowDisplay for Incident {
  fn row_line(&self) -> Line<'_> {
    Line::from(vec![
      Span::styled(format!("{:<10}", self.id), Style::default().fg(Color::Cyan)),
      Span::raw(" "),
      Span::styled(
        format!("{:<13}", truncate(&self.status, 13)),
        Style::default().fg(status_color(&self.status)),
      ),
      Span::styled(
        format!("{:<9}", truncate(&self.severity, 9)),
        Style::default().fg(severity_color(&self.severity)),
      ),
      Span::raw(truncate(&self.title, 60)),
    ])
  }
}

impl RowDisplay for Alert {
  fn row_line(&self) -> Line<'_> {
    Line::from(vec![
      Span::styled(format!("{:<10}", self.id), Style::default().fg(Color::Cyan)),
      Span::raw(" "),
      Span::styled(
        format!("{:<13}", truncate(&self.status, 13)),
        Style::default().fg(status_color(&self.status)),
      ),
      Span::styled(
        format!("{:<12}", truncate(&self.source, 12)),
        Style::default().fg(Color::White),
      ),
      Span::raw(truncate(&self.title, 60)),
    ])
  }
}

impl DetailDisplay for IncidentDetail {
  fn detail_lines(&self) -> Vec<Line<'_>> {
    let mut lines = vec![
      Line::from(Span::styled(self.title.as_str(), Style::default().bold())),
      Line::default(),
      Line::from(vec![
        label("Status: "),
        Span::styled(
          self.status.as_str(),
          Style::default().fg(status_color(&self.status)),
        ),
        Span::raw("  "),
        label("Severity: "),
        Span::styled(
          self.severity.as_str(),
          Style::default().fg(severity_color(&self.severity)),
        ),
      ]),
      field("Service: ", self.service.as_deref().unwrap_or("-")),
      list_field("Assignees: ", &self.assignees),
      list_field("Labels: ", &self.labels),
      field("Created: ", &self.created_at),
      field("Updated: ", self.updated_at.as_deref().unwrap_or("-")),
      Line::default(),
      Line::from(self.description.as_deref().unwrap_or("No description")),
    ];

    if !self.timeline.is_empty() {
      lines.push(Line::default());
      lines.push(Line::from(label("Timeline")));
      for entry in &self.timeline {
        lines.push(Line::from(vec![
          Span::styled(format!("{}  ", entry.at), Style::default().fg(Color::DarkGray)),
          Span::raw(entry.message.as_str()),
        ]));
      }
    }
    lines
  }
}

impl DetailDisplay for AlertDetail {
  fn detail_lines(&self) -> Vec<Line<'_>> {
    vec![
      Line::from(Span::styled(self.title.as_str(), Style::default().bold())),
      Line::default(),
      Line::from(vec![
        label("Status: "),
        Span::styled(
          self.status.as_str(),
          Style::default().fg(status_color(&self.status)),
        ),
      ]),
      field("Source: ", &self.source),
      field("Incident: ", self.incident_id.as_deref().unwrap_or("-")),
      list_field("Labels: ", &self.labels),
      field("Created: ", &self.created_at),
      field("Updated: ", self.updated_at.as_deref().unwrap_or("-")),
      Line::default(),
      Line::from(self.message.as_deref().unwrap_or("No message")),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::orchestrator::testing::incident_row;

  #[test]
  fn test_row_line_starts_with_id() {
    let row = incident_row("INC-7", None);
    let line = row.row_line();
    assert_eq!(line.spans[0].content.trim(), "INC-7");
  }

  #[test]
  fn test_alert_detail_without_incident() {
    let detail = AlertDetail {
      id: "AL-1".to_string(),
      title: "disk full".to_string(),
      status: "triggered".to_string(),
      source: "prometheus".to_string(),
      message: None,
      incident_id: None,
      labels: Vec::new(),
      created_at: "2024-06-01T00:00:00Z".to_string(),
      updated_at: None,
    };
    let text: Vec<String> = detail
      .detail_lines()
      .iter()
      .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
      .collect();
    assert!(text.contains(&"Incident: -".to_string()));
    assert!(text.contains(&"No message".to_string()));
  }
}
