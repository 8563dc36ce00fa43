//! Fire-and-forget dispatch of fetch units.
//!
//! Each unit runs on its own tokio task and reports back through the event
//! inbox with exactly one `FetchEvent`, whether it succeeds, fails or panics.
//! There is no cancellation: navigation simply dispatches a newer unit and the
//! reducer discards whatever the older one returns.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::{DataOrchestrator, FetchError, ListRequest, RemoteSource, ResourceKind};
use crate::cache::TtlCache;
use crate::event::{Event, FetchEvent, FetchOutcome};
use crate::logging::Logger;
use crate::state::DetailRequest;

pub struct Scheduler<C: TtlCache, S: RemoteSource> {
  orchestrator: DataOrchestrator<C, S>,
  tx: mpsc::UnboundedSender<Event>,
  spinner_interval: Duration,
  spinner_pending: bool,
  logger: Logger,
}

impl<C: TtlCache + 'static, S: RemoteSource> Scheduler<C, S> {
  pub fn new(
    orchestrator: DataOrchestrator<C, S>,
    tx: mpsc::UnboundedSender<Event>,
    spinner_interval: Duration,
    logger: Logger,
  ) -> Self {
    Self {
      orchestrator,
      tx,
      spinner_interval,
      spinner_pending: false,
      logger,
    }
  }

  pub fn orchestrator(&self) -> &DataOrchestrator<C, S> {
    &self.orchestrator
  }

  /// Fetch one list page. With `clear_first` the whole cache is wiped inside
  /// the unit before the lookup.
  pub fn dispatch_list(
    &self,
    resource: ResourceKind,
    request: ListRequest,
    generation: u64,
    clear_first: bool,
  ) {
    let orchestrator = self.orchestrator.clone();
    let page = request.page;
    self.logger.debug(format!(
      "dispatch {} page {} (generation {})",
      resource.path(),
      page,
      generation
    ));

    match resource {
      ResourceKind::Incidents => self.spawn_unit(
        async move {
          if clear_first {
            orchestrator.clear_all();
          }
          let result = orchestrator.list_incidents(&request).await;
          FetchEvent {
            generation,
            outcome: FetchOutcome::IncidentList { page, result },
          }
        },
        move |e| FetchEvent {
          generation,
          outcome: FetchOutcome::IncidentList {
            page,
            result: Err(e),
          },
        },
      ),
      ResourceKind::Alerts => self.spawn_unit(
        async move {
          if clear_first {
            orchestrator.clear_all();
          }
          let result = orchestrator.list_alerts(&request).await;
          FetchEvent {
            generation,
            outcome: FetchOutcome::AlertList { page, result },
          }
        },
        move |e| FetchEvent {
          generation,
          outcome: FetchOutcome::AlertList {
            page,
            result: Err(e),
          },
        },
      ),
    }
  }

  /// Fetch the detail record behind one row.
  pub fn dispatch_detail(&self, resource: ResourceKind, request: DetailRequest) {
    let orchestrator = self.orchestrator.clone();
    let DetailRequest {
      index,
      id,
      version,
      generation,
    } = request;
    self
      .logger
      .debug(format!("dispatch {} detail {}", resource.path(), id));

    let failed_id = id.clone();
    match resource {
      ResourceKind::Incidents => self.spawn_unit(
        async move {
          let result = orchestrator
            .incident_detail(&id, version.as_deref())
            .await
            .map(Box::new);
          FetchEvent {
            generation,
            outcome: FetchOutcome::IncidentDetail { index, id, result },
          }
        },
        move |e| FetchEvent {
          generation,
          outcome: FetchOutcome::IncidentDetail {
            index,
            id: failed_id,
            result: Err(e),
          },
        },
      ),
      ResourceKind::Alerts => self.spawn_unit(
        async move {
          let result = orchestrator
            .alert_detail(&id, version.as_deref())
            .await
            .map(Box::new);
          FetchEvent {
            generation,
            outcome: FetchOutcome::AlertDetail { index, id, result },
          }
        },
        move |e| FetchEvent {
          generation,
          outcome: FetchOutcome::AlertDetail {
            index,
            id: failed_id,
            result: Err(e),
          },
        },
      ),
    }
  }

  /// Purge expired durable entries in the background.
  pub fn spawn_cleanup(&self, run: impl FnOnce() -> usize + Send + 'static) {
    let logger = self.logger.clone();
    tokio::task::spawn_blocking(move || {
      let removed = run();
      if removed > 0 {
        logger.info(format!("Removed {} expired cache entries", removed));
      }
    });
  }

  /// Schedule the next spinner frame if something is loading and no frame is
  /// already pending.
  pub fn ensure_spinner(&mut self, busy: bool) {
    if !busy || self.spinner_pending {
      return;
    }
    self.spinner_pending = true;

    let tx = self.tx.clone();
    let interval = self.spinner_interval;
    tokio::spawn(async move {
      tokio::time::sleep(interval).await;
      let _ = tx.send(Event::Spinner);
    });
  }

  /// Record that the pending spinner frame was delivered.
  pub fn spinner_fired(&mut self) {
    self.spinner_pending = false;
  }

  pub fn spinner_pending(&self) -> bool {
    self.spinner_pending
  }

  /// Run `unit` on its own task. The supervising task sends its event, or
  /// the `on_abort` event if the unit panicked.
  fn spawn_unit<F, A>(&self, unit: F, on_abort: A)
  where
    F: Future<Output = FetchEvent> + Send + 'static,
    A: FnOnce(FetchError) -> FetchEvent + Send + 'static,
  {
    let tx = self.tx.clone();
    let logger = self.logger.clone();
    tokio::spawn(async move {
      let event = match tokio::spawn(unit).await {
        Ok(event) => event,
        Err(e) => {
          logger.error(format!("Fetch task failed: {}", e));
          on_abort(FetchError::Aborted(e.to_string()))
        }
      };
      // The app is gone if nobody is listening
      let _ = tx.send(Event::Fetch(event));
    });
  }
}
