use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::api_types::{ApiAlert, ApiIncident, ApiItemResponse, ApiListResponse};
use super::source::{FetchError, RemoteSource};
use super::types::{
  Alert, AlertDetail, Incident, IncidentDetail, ListRequest, Page, ResourceKind,
};
use crate::config::{ApiConfig, Config};
use color_eyre::{eyre::eyre, Result};

/// HTTP/JSON incident API client
#[derive(Clone)]
pub struct HttpSource {
  client: reqwest::Client,
  base: Url,
  token: Option<String>,
}

impl HttpSource {
  pub fn new(api: &ApiConfig) -> Result<Self> {
    let base = Url::parse(&api.url).map_err(|e| eyre!("Invalid API url {}: {}", api.url, e))?;
    if base.cannot_be_a_base() {
      return Err(eyre!("API url {} cannot be used as a base", api.url));
    }

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(api.timeout_secs))
      .user_agent(concat!("inctui/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base,
      token: Config::get_api_token(),
    })
  }

  /// Build `{base}/{segments...}` with each segment percent-encoded.
  fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|_| FetchError::Transport(format!("{} cannot be a base url", self.base)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
    let mut request = self.client.get(url);
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request
      .send()
      .await
      .map_err(|e| FetchError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response
      .bytes()
      .await
      .map_err(|e| FetchError::Transport(e.to_string()))?;

    if !status.is_success() {
      return Err(FetchError::Status {
        status: status.as_u16(),
        message: error_message(&body),
      });
    }

    serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
  }

  async fn get_list<T: DeserializeOwned>(
    &self,
    kind: ResourceKind,
    request: &ListRequest,
  ) -> Result<ApiListResponse<T>, FetchError> {
    let mut url = self.endpoint(&[kind.path()])?;
    url
      .query_pairs_mut()
      .append_pair("page", &request.page.to_string())
      .append_pair("page_size", &request.page_size.to_string())
      .append_pair("sort", &request.sort.to_string());
    self.get_json(url).await
  }

  async fn get_item<T: DeserializeOwned>(
    &self,
    kind: ResourceKind,
    id: &str,
  ) -> Result<T, FetchError> {
    let url = self.endpoint(&[kind.path(), id])?;
    let response: ApiItemResponse<T> = self.get_json(url).await?;
    Ok(response.data)
  }
}

impl RemoteSource for HttpSource {
  async fn list_incidents(&self, request: &ListRequest) -> Result<Page<Incident>, FetchError> {
    let response = self
      .get_list::<ApiIncident>(ResourceKind::Incidents, request)
      .await?;
    Ok(response.into_page(request.page, ApiIncident::into_summary))
  }

  async fn list_alerts(&self, request: &ListRequest) -> Result<Page<Alert>, FetchError> {
    let response = self
      .get_list::<ApiAlert>(ResourceKind::Alerts, request)
      .await?;
    Ok(response.into_page(request.page, ApiAlert::into_summary))
  }

  async fn incident_detail(&self, id: &str) -> Result<IncidentDetail, FetchError> {
    let incident: ApiIncident = self.get_item(ResourceKind::Incidents, id).await?;
    Ok(incident.into_detail())
  }

  async fn alert_detail(&self, id: &str) -> Result<AlertDetail, FetchError> {
    let alert: ApiAlert = self.get_item(ResourceKind::Alerts, id).await?;
    Ok(alert.into_detail())
  }
}

/// Pull a readable message out of an error body.
fn error_message(body: &[u8]) -> String {
  #[derive(serde::Deserialize)]
  struct ApiError {
    message: Option<String>,
    error: Option<String>,
  }

  if let Ok(parsed) = serde_json::from_slice::<ApiError>(body) {
    if let Some(message) = parsed.message.or(parsed.error) {
      return message;
    }
  }

  let text = String::from_utf8_lossy(body);
  let text = text.trim();
  if text.is_empty() {
    "no response body".to_string()
  } else {
    text.chars().take(200).collect()
  }
}
