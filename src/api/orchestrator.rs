//! Cache-aware access to the remote source.
//!
//! Every operation builds a canonical key, consults its cache tier, and only on
//! a miss goes to the remote source. List results and detail records live in
//! separate tiers so each can have its own TTL.

use std::sync::Arc;

use super::source::{FetchError, RemoteSource};
use super::types::{Alert, AlertDetail, Incident, IncidentDetail, ListRequest, Page};
use crate::cache::{CacheKey, CacheLayer, CacheResult, CacheSource, TtlCache};
use crate::logging::Logger;

pub const LIST_INCIDENTS: &str = "list-incidents";
pub const LIST_ALERTS: &str = "list-alerts";
pub const INCIDENT_DETAIL: &str = "incident-detail";
pub const ALERT_DETAIL: &str = "alert-detail";

/// Key for a list page: {page, pageSize, sort}.
pub fn list_key(prefix: &str, request: &ListRequest) -> String {
  CacheKey::new(prefix)
    .param("page", request.page)
    .param("pageSize", request.page_size)
    .param("sort", &request.sort)
    .build()
}

/// Key for a detail record: {id, version}, id-only without a version stamp.
pub fn detail_key(prefix: &str, id: &str, version: Option<&str>) -> String {
  CacheKey::new(prefix)
    .param("id", id)
    .param_opt("version", version)
    .build()
}

/// Remote source with transparent list and detail caching.
pub struct DataOrchestrator<C: TtlCache, S: RemoteSource> {
  source: Arc<S>,
  lists: CacheLayer<C>,
  details: CacheLayer<C>,
  logger: Logger,
}

impl<C: TtlCache, S: RemoteSource> DataOrchestrator<C, S> {
  /// A `None` tier means that tier always fetches remotely.
  pub fn new(source: S, lists: Option<C>, details: Option<C>, logger: Logger) -> Self {
    Self {
      source: Arc::new(source),
      lists: CacheLayer::new(lists),
      details: CacheLayer::new(details),
      logger,
    }
  }

  pub fn list_cache(&self) -> Option<&C> {
    self.lists.cache()
  }

  pub fn detail_cache(&self) -> Option<&C> {
    self.details.cache()
  }

  pub async fn list_incidents(&self, request: &ListRequest) -> Result<Page<Incident>, FetchError> {
    let key = list_key(LIST_INCIDENTS, request);
    let result = self
      .lists
      .fetch(&key, || self.source.list_incidents(request))
      .await;
    self.observe(&key, result)
  }

  pub async fn list_alerts(&self, request: &ListRequest) -> Result<Page<Alert>, FetchError> {
    let key = list_key(LIST_ALERTS, request);
    let result = self
      .lists
      .fetch(&key, || self.source.list_alerts(request))
      .await;
    self.observe(&key, result)
  }

  /// Fetch an incident, addressed by the version last seen in a list.
  pub async fn incident_detail(
    &self,
    id: &str,
    version: Option<&str>,
  ) -> Result<IncidentDetail, FetchError> {
    let key = detail_key(INCIDENT_DETAIL, id, version);
    let result = self
      .details
      .fetch(&key, || self.source.incident_detail(id))
      .await;
    self.observe(&key, result)
  }

  /// Fetch an alert, addressed by the version last seen in a list.
  pub async fn alert_detail(
    &self,
    id: &str,
    version: Option<&str>,
  ) -> Result<AlertDetail, FetchError> {
    let key = detail_key(ALERT_DETAIL, id, version);
    let result = self
      .details
      .fetch(&key, || self.source.alert_detail(id))
      .await;
    self.observe(&key, result)
  }

  /// Wipe both tiers.
  pub fn clear_all(&self) {
    if !self.lists.is_enabled() && !self.details.is_enabled() {
      return;
    }
    self.lists.clear();
    self.details.clear();
    self.logger.info("Cache cleared");
  }

  fn observe<T>(
    &self,
    key: &str,
    result: Result<CacheResult<T>, FetchError>,
  ) -> Result<T, FetchError> {
    match result {
      Ok(CacheResult {
        data,
        source: CacheSource::Cache,
      }) => {
        self.logger.debug(format!("cache hit {}", key));
        Ok(data)
      }
      Ok(CacheResult { data, .. }) => {
        self.logger.debug(format!("fetched {}", key));
        Ok(data)
      }
      Err(e) => {
        self.logger.warn(format!("fetch {} failed: {}", key, e));
        Err(e)
      }
    }
  }
}

impl<C: TtlCache, S: RemoteSource> Clone for DataOrchestrator<C, S> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
      lists: self.lists.clone(),
      details: self.details.clone(),
      logger: self.logger.clone(),
    }
  }
}
