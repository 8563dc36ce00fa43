use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote resource families shown by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
  Incidents,
  Alerts,
}

impl ResourceKind {
  pub const ALL: [ResourceKind; 2] = [ResourceKind::Incidents, ResourceKind::Alerts];

  pub fn label(self) -> &'static str {
    match self {
      ResourceKind::Incidents => "Incidents",
      ResourceKind::Alerts => "Alerts",
    }
  }

  /// Collection path segment on the remote API
  pub fn path(self) -> &'static str {
    match self {
      ResourceKind::Incidents => "incidents",
      ResourceKind::Alerts => "alerts",
    }
  }

  pub fn other(self) -> Self {
    match self {
      ResourceKind::Incidents => ResourceKind::Alerts,
      ResourceKind::Alerts => ResourceKind::Incidents,
    }
  }
}

/// Identity and version stamp shared by list records
pub trait Record {
  fn id(&self) -> &str;

  /// Last-known mutation time, if the remote reports one.
  fn version(&self) -> Option<&str>;
}

/// Incident row for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
  pub id: String,
  pub title: String,
  pub status: String,
  pub severity: String,
  pub service: Option<String>,
  pub created_at: String,
  pub updated_at: Option<String>,
}

/// Full incident record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentDetail {
  pub id: String,
  pub title: String,
  pub status: String,
  pub severity: String,
  pub service: Option<String>,
  pub description: Option<String>,
  pub assignees: Vec<String>,
  pub labels: Vec<String>,
  pub timeline: Vec<TimelineEntry>,
  pub created_at: String,
  pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
  pub at: String,
  pub message: String,
}

/// Alert row for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
  pub id: String,
  pub title: String,
  pub status: String,
  pub source: String,
  pub created_at: String,
  pub updated_at: Option<String>,
}

/// Full alert record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDetail {
  pub id: String,
  pub title: String,
  pub status: String,
  pub source: String,
  pub message: Option<String>,
  pub incident_id: Option<String>,
  pub labels: Vec<String>,
  pub created_at: String,
  pub updated_at: Option<String>,
}

impl Record for Incident {
  fn id(&self) -> &str {
    &self.id
  }

  fn version(&self) -> Option<&str> {
    self.updated_at.as_deref()
  }
}

impl Record for Alert {
  fn id(&self) -> &str {
    &self.id
  }

  fn version(&self) -> Option<&str> {
    self.updated_at.as_deref()
  }
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub page: u32,
  pub has_next: bool,
}

/// Sort order for list requests, rendered as `field` or `-field`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
  pub field: String,
  pub descending: bool,
}

impl SortSpec {
  pub fn parse(s: &str) -> Self {
    let s = s.trim();
    match s.strip_prefix('-') {
      Some(field) => Self {
        field: field.to_string(),
        descending: true,
      },
      None => Self {
        field: s.to_string(),
        descending: false,
      },
    }
  }

  pub fn toggled(&self) -> Self {
    Self {
      field: self.field.clone(),
      descending: !self.descending,
    }
  }
}

impl Default for SortSpec {
  fn default() -> Self {
    Self {
      field: "created_at".to_string(),
      descending: true,
    }
  }
}

impl fmt::Display for SortSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.descending {
      write!(f, "-{}", self.field)
    } else {
      f.write_str(&self.field)
    }
  }
}

/// Paging and sort parameters for a list fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
  pub page: u32,
  pub page_size: u32,
  pub sort: SortSpec,
}
