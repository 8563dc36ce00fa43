//! Synthetic data source used when no API is configured.
//!
//! Records are generated deterministically and carry no `updated_at`, so
//! detail lookups are cached by id alone.

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::time::Duration;

use super::source::{FetchError, RemoteSource};
use super::types::{
  Alert, AlertDetail, Incident, IncidentDetail, ListRequest, Page, SortSpec, TimelineEntry,
};

const INCIDENT_COUNT: usize = 87;
const ALERT_COUNT: usize = 213;

const STATUSES: &[&str] = &["triggered", "acknowledged", "resolved"];
const SEVERITIES: &[&str] = &["critical", "high", "medium", "low"];
const SERVICES: &[&str] = &["checkout", "payments", "search", "auth", "ingest"];
const SOURCES: &[&str] = &["prometheus", "datadog", "cloudwatch", "synthetics"];

#[derive(Debug, Clone, Default)]
pub struct MockSource {
  latency: Duration,
}

impl MockSource {
  pub fn new(latency: Duration) -> Self {
    Self { latency }
  }

  async fn simulate_latency(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }
}

fn timestamp(index: usize) -> String {
  // Newer records have lower indices
  let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().unwrap_or_default();
  (base - ChronoDuration::minutes(index as i64 * 17)).to_rfc3339()
}

fn incident(index: usize) -> IncidentDetail {
  let service = SERVICES[index % SERVICES.len()];
  IncidentDetail {
    id: format!("INC-{:04}", index + 1),
    title: format!("{} degraded: error rate above threshold", service),
    status: STATUSES[index % STATUSES.len()].to_string(),
    severity: SEVERITIES[index % SEVERITIES.len()].to_string(),
    service: Some(service.to_string()),
    description: Some(format!(
      "Synthetic incident #{} raised for the {} service.",
      index + 1,
      service
    )),
    assignees: vec![format!("oncall-{}", index % 3 + 1)],
    labels: vec![format!("team:{}", service), "env:prod".to_string()],
    timeline: vec![
      TimelineEntry {
        at: timestamp(index),
        message: "Incident triggered".to_string(),
      },
      TimelineEntry {
        at: timestamp(index),
        message: format!("Escalated to oncall-{}", index % 3 + 1),
      },
    ],
    created_at: timestamp(index),
    updated_at: None,
  }
}

fn alert(index: usize) -> AlertDetail {
  let source = SOURCES[index % SOURCES.len()];
  AlertDetail {
    id: format!("AL-{:05}", index + 1),
    title: format!("{} check failing on host-{:02}", source, index % 40),
    status: STATUSES[index % STATUSES.len()].to_string(),
    source: source.to_string(),
    message: Some(format!("Synthetic alert #{} from {}.", index + 1, source)),
    incident_id: (index % 3 == 0).then(|| format!("INC-{:04}", index / 3 % INCIDENT_COUNT + 1)),
    labels: vec![format!("source:{}", source)],
    created_at: timestamp(index),
    updated_at: None,
  }
}

fn summary_of_incident(d: IncidentDetail) -> Incident {
  Incident {
    id: d.id,
    title: d.title,
    status: d.status,
    severity: d.severity,
    service: d.service,
    created_at: d.created_at,
    updated_at: d.updated_at,
  }
}

fn summary_of_alert(d: AlertDetail) -> Alert {
  Alert {
    id: d.id,
    title: d.title,
    status: d.status,
    source: d.source,
    created_at: d.created_at,
    updated_at: d.updated_at,
  }
}

/// Order indices by creation time; only `created_at` sorting is simulated.
fn ordered_indices(count: usize, sort: &SortSpec) -> Vec<usize> {
  let mut indices: Vec<usize> = (0..count).collect();
  // Index 0 is the newest record
  if !sort.descending {
    indices.reverse();
  }
  indices
}

fn paginate<T>(count: usize, request: &ListRequest, build: impl Fn(usize) -> T) -> Page<T> {
  let page = request.page.max(1);
  let size = request.page_size.max(1) as usize;
  let start = (page as usize - 1) * size;
  let indices = ordered_indices(count, &request.sort);

  Page {
    items: indices.iter().skip(start).take(size).map(|&i| build(i)).collect(),
    page,
    has_next: start + size < count,
  }
}

fn parse_index(id: &str, prefix: &str, count: usize) -> Result<usize, FetchError> {
  id.strip_prefix(prefix)
    .and_then(|n| n.parse::<usize>().ok())
    .filter(|n| (1..=count).contains(n))
    .map(|n| n - 1)
    .ok_or_else(|| FetchError::Status {
      status: 404,
      message: format!("{} not found", id),
    })
}

impl RemoteSource for MockSource {
  async fn list_incidents(&self, request: &ListRequest) -> Result<Page<Incident>, FetchError> {
    self.simulate_latency().await;
    Ok(paginate(INCIDENT_COUNT, request, |i| summary_of_incident(incident(i))))
  }

  async fn list_alerts(&self, request: &ListRequest) -> Result<Page<Alert>, FetchError> {
    self.simulate_latency().await;
    Ok(paginate(ALERT_COUNT, request, |i| summary_of_alert(alert(i))))
  }

  async fn incident_detail(&self, id: &str) -> Result<IncidentDetail, FetchError> {
    self.simulate_latency().await;
    parse_index(id, "INC-", INCIDENT_COUNT).map(incident)
  }

  async fn alert_detail(&self, id: &str) -> Result<AlertDetail, FetchError> {
    self.simulate_latency().await;
    parse_index(id, "AL-", ALERT_COUNT).map(alert)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(page: u32, page_size: u32) -> ListRequest {
    ListRequest {
      page,
      page_size,
      sort: SortSpec::default(),
    }
  }

  #[tokio::test]
  async fn test_pagination() {
    let source = MockSource::default();

    let first = source.list_incidents(&request(1, 25)).await.unwrap();
    assert_eq!(first.items.len(), 25);
    assert_eq!(first.items[0].id, "INC-0001");
    assert!(first.has_next);

    let last = source.list_incidents(&request(4, 25)).await.unwrap();
    assert_eq!(last.items.len(), INCIDENT_COUNT - 75);
    assert!(!last.has_next);
  }

  #[tokio::test]
  async fn test_ascending_sort_reverses_order() {
    let source = MockSource::default();
    let mut req = request(1, 10);
    req.sort = req.sort.toggled();

    let page = source.list_alerts(&req).await.unwrap();
    assert_eq!(page.items[0].id, format!("AL-{:05}", ALERT_COUNT));
  }

  #[tokio::test]
  async fn test_detail_lookup() {
    let source = MockSource::default();

    let detail = source.incident_detail("INC-0003").await.unwrap();
    assert_eq!(detail.id, "INC-0003");
    assert_eq!(detail.updated_at, None);

    let missing = source.alert_detail("AL-99999").await;
    assert!(matches!(missing, Err(FetchError::Status { status: 404, .. })));
  }
}
