//! Serde-deserializable types matching the incident API responses.
//!
//! These types are separate from domain types to allow lenient deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use super::types::{Alert, AlertDetail, Incident, IncidentDetail, Page, TimelineEntry};

// ============================================================================
// Envelopes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiListResponse<T> {
  #[serde(default = "Vec::new")]
  pub data: Vec<T>,
  #[serde(default)]
  pub meta: ApiMeta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiMeta {
  pub page: Option<u32>,
  #[serde(default)]
  pub has_next: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiItemResponse<T> {
  pub data: T,
}

impl<T> ApiListResponse<T> {
  /// Convert into a domain page, falling back to the requested page number.
  pub fn into_page<U>(self, requested_page: u32, convert: impl Fn(T) -> U) -> Page<U> {
    Page {
      items: self.data.into_iter().map(convert).collect(),
      page: self.meta.page.unwrap_or(requested_page),
      has_next: self.meta.has_next,
    }
  }
}

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiService {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub name: Option<String>,
  pub email: Option<String>,
}

impl ApiUser {
  fn display(self) -> String {
    self
      .name
      .or(self.email)
      .unwrap_or_else(|| "unknown".to_string())
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiTimelineEntry {
  #[serde(default)]
  pub created_at: String,
  #[serde(default)]
  pub message: String,
}

// ============================================================================
// Incidents
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiIncident {
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub status: String,
  pub severity: Option<String>,
  pub service: Option<ApiService>,
  pub description: Option<String>,
  #[serde(default)]
  pub assignees: Vec<ApiUser>,
  #[serde(default)]
  pub labels: Vec<String>,
  #[serde(default)]
  pub timeline: Vec<ApiTimelineEntry>,
  #[serde(default)]
  pub created_at: String,
  pub updated_at: Option<String>,
}

impl ApiIncident {
  pub fn into_summary(self) -> Incident {
    Incident {
      id: self.id,
      title: self.title,
      status: self.status,
      severity: self.severity.unwrap_or_else(|| "unknown".to_string()),
      service: self.service.map(|s| s.name),
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }

  pub fn into_detail(self) -> IncidentDetail {
    IncidentDetail {
      id: self.id,
      title: self.title,
      status: self.status,
      severity: self.severity.unwrap_or_else(|| "unknown".to_string()),
      service: self.service.map(|s| s.name),
      description: self.description,
      assignees: self.assignees.into_iter().map(ApiUser::display).collect(),
      labels: self.labels,
      timeline: self
        .timeline
        .into_iter()
        .map(|t| TimelineEntry {
          at: t.created_at,
          message: t.message,
        })
        .collect(),
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiAlert {
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub status: String,
  pub source: Option<String>,
  pub message: Option<String>,
  pub incident_id: Option<String>,
  #[serde(default)]
  pub labels: Vec<String>,
  #[serde(default)]
  pub created_at: String,
  pub updated_at: Option<String>,
}

impl ApiAlert {
  pub fn into_summary(self) -> Alert {
    Alert {
      id: self.id,
      title: self.title,
      status: self.status,
      source: self.source.unwrap_or_default(),
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }

  pub fn into_detail(self) -> AlertDetail {
    AlertDetail {
      id: self.id,
      title: self.title,
      status: self.status,
      source: self.source.unwrap_or_default(),
      message: self.message,
      incident_id: self.incident_id,
      labels: self.labels,
      created_at: self.created_at,
      updated_at: self.updated_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_incident_list_decodes_with_missing_fields() {
    let json = r#"{
      "data": [
        {"id": "INC-1", "title": "DB down", "status": "triggered", "severity": "critical",
         "service": {"name": "db"}, "created_at": "2024-05-01T10:00:00Z",
         "updated_at": "2024-05-01T10:05:00Z"},
        {"id": "INC-2"}
      ],
      "meta": {"page": 2, "has_next": true}
    }"#;

    let response: ApiListResponse<ApiIncident> = serde_json::from_str(json).unwrap();
    let page = response.into_page(1, ApiIncident::into_summary);

    assert_eq!(page.page, 2);
    assert!(page.has_next);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].service.as_deref(), Some("db"));
    assert_eq!(page.items[0].updated_at.as_deref(), Some("2024-05-01T10:05:00Z"));
    assert_eq!(page.items[1].severity, "unknown");
    assert_eq!(page.items[1].updated_at, None);
  }

  #[test]
  fn test_missing_meta_uses_requested_page() {
    let response: ApiListResponse<ApiAlert> = serde_json::from_str(r#"{"data": []}"#).unwrap();
    let page = response.into_page(3, ApiAlert::into_summary);
    assert_eq!(page.page, 3);
    assert!(!page.has_next);
  }

  #[test]
  fn test_incident_detail() {
    let json = r#"{"data": {
      "id": "INC-9", "title": "Latency", "status": "acknowledged",
      "assignees": [{"name": "Sam"}, {"email": "ops@example.com"}, {}],
      "timeline": [{"created_at": "2024-05-01T10:00:00Z", "message": "Triggered"}]
    }}"#;

    let response: ApiItemResponse<ApiIncident> = serde_json::from_str(json).unwrap();
    let detail = response.data.into_detail();

    assert_eq!(detail.assignees, vec!["Sam", "ops@example.com", "unknown"]);
    assert_eq!(detail.timeline[0].message, "Triggered");
  }

  #[test]
  fn test_alert_detail() {
    let json = r#"{"data": {"id": "AL-1", "source": "prometheus", "incident_id": "INC-1"}}"#;
    let response: ApiItemResponse<ApiAlert> = serde_json::from_str(json).unwrap();
    let detail = response.data.into_detail();

    assert_eq!(detail.source, "prometheus");
    assert_eq!(detail.incident_id.as_deref(), Some("INC-1"));
  }
}
