//! Incident API access: domain records, remote sources and the caching
//! orchestrator in front of them.

mod api_types;
pub mod client;
pub mod mock;
pub mod orchestrator;
pub mod source;
pub mod types;

pub use client::HttpSource;
pub use mock::MockSource;
pub use orchestrator::DataOrchestrator;
pub use source::{AnySource, FetchError, RemoteSource};
pub use types::{
  Alert, AlertDetail, Incident, IncidentDetail, ListRequest, Page, Record, ResourceKind, SortSpec,
};
