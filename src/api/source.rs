//! The remote data-source seam.

use std::future::Future;

use super::types::{Alert, AlertDetail, Incident, IncidentDetail, ListRequest, Page};

/// Why a remote fetch failed. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
  #[error("request failed: {0}")]
  Transport(String),
  #[error("server returned {status}: {message}")]
  Status { status: u16, message: String },
  #[error("could not decode response: {0}")]
  Decode(String),
  /// The fetch task died before producing a result
  #[error("fetch task aborted: {0}")]
  Aborted(String),
}

/// Something that can produce incident and alert records.
///
/// Futures must be `Send` so fetch units can run on the tokio worker pool.
pub trait RemoteSource: Send + Sync + 'static {
  fn list_incidents(
    &self,
    request: &ListRequest,
  ) -> impl Future<Output = Result<Page<Incident>, FetchError>> + Send;

  fn list_alerts(
    &self,
    request: &ListRequest,
  ) -> impl Future<Output = Result<Page<Alert>, FetchError>> + Send;

  fn incident_detail(
    &self,
    id: &str,
  ) -> impl Future<Output = Result<IncidentDetail, FetchError>> + Send;

  fn alert_detail(&self, id: &str) -> impl Future<Output = Result<AlertDetail, FetchError>> + Send;
}

/// The source picked at startup: the real API or synthetic data.
pub enum AnySource {
  Http(super::client::HttpSource),
  Mock(super::mock::MockSource),
}

impl AnySource {
  pub fn describe(&self) -> &'static str {
    match self {
      AnySource::Http(_) => "http",
      AnySource::Mock(_) => "mock",
    }
  }
}

impl RemoteSource for AnySource {
  async fn list_incidents(&self, request: &ListRequest) -> Result<Page<Incident>, FetchError> {
    match self {
      AnySource::Http(source) => source.list_incidents(request).await,
      AnySource::Mock(source) => source.list_incidents(request).await,
    }
  }

  async fn list_alerts(&self, request: &ListRequest) -> Result<Page<Alert>, FetchError> {
    match self {
      AnySource::Http(source) => source.list_alerts(request).await,
      AnySource::Mock(source) => source.list_alerts(request).await,
    }
  }

  async fn incident_detail(&self, id: &str) -> Result<IncidentDetail, FetchError> {
    match self {
      AnySource::Http(source) => source.incident_detail(id).await,
      AnySource::Mock(source) => source.incident_detail(id).await,
    }
  }

  async fn alert_detail(&self, id: &str) -> Result<AlertDetail, FetchError> {
    match self {
      AnySource::Http(source) => source.alert_detail(id).await,
      AnySource::Mock(source) => source.alert_detail(id).await,
    }
  }
}
