use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::{
  Alert, AlertDetail, FetchError, Incident, IncidentDetail, Page, ResourceKind,
};

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal resized; the next draw picks up the new size
  Resize,
  /// A fetch unit finished
  Fetch(FetchEvent),
  /// Spinner frame, only scheduled while something is loading
  Spinner,
}

/// The single terminal result of one fetch unit.
///
/// `generation` is the view generation the unit was dispatched under; the
/// reducer uses it to recognise results that arrive after newer requests.
#[derive(Debug)]
pub struct FetchEvent {
  pub generation: u64,
  pub outcome: FetchOutcome,
}

#[derive(Debug)]
pub enum FetchOutcome {
  IncidentList {
    page: u32,
    result: Result<Page<Incident>, FetchError>,
  },
  AlertList {
    page: u32,
    result: Result<Page<Alert>, FetchError>,
  },
  IncidentDetail {
    index: usize,
    id: String,
    result: Result<Box<IncidentDetail>, FetchError>,
  },
  AlertDetail {
    index: usize,
    id: String,
    result: Result<Box<AlertDetail>, FetchError>,
  },
}

impl FetchEvent {
  pub fn resource(&self) -> ResourceKind {
    match self.outcome {
      FetchOutcome::IncidentList { .. } | FetchOutcome::IncidentDetail { .. } => {
        ResourceKind::Incidents
      }
      FetchOutcome::AlertList { .. } | FetchOutcome::AlertDetail { .. } => ResourceKind::Alerts,
    }
  }

  /// Short label for logs, e.g. "incidents page 2"
  pub fn describe(&self) -> String {
    match &self.outcome {
      FetchOutcome::IncidentList { page, .. } | FetchOutcome::AlertList { page, .. } => {
        format!("{} page {}", self.resource().path(), page)
      }
      FetchOutcome::IncidentDetail { index, id, .. }
      | FetchOutcome::AlertDetail { index, id, .. } => {
        format!("{} detail {} (row {})", self.resource().path(), id, index)
      }
    }
  }

  pub fn is_ok(&self) -> bool {
    match &self.outcome {
      FetchOutcome::IncidentList { result, .. } => result.is_ok(),
      FetchOutcome::AlertList { result, .. } => result.is_ok(),
      FetchOutcome::IncidentDetail { result, .. } => result.is_ok(),
      FetchOutcome::AlertDetail { result, .. } => result.is_ok(),
    }
  }
}

/// Event inbox fed by terminal input and background fetch units
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Start forwarding terminal input into the inbox.
  ///
  /// Polls with `poll_interval` so the reader notices when the app is gone.
  pub fn spawn_input_reader(&self, poll_interval: Duration) {
    let tx = self.tx.clone();
    tokio::task::spawn_blocking(move || loop {
      if tx.is_closed() {
        break;
      }
      if !event::poll(poll_interval).unwrap_or(false) {
        continue;
      }
      let sent = match event::read() {
        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => tx.send(Event::Key(key)),
        Ok(CrosstermEvent::Resize(_, _)) => tx.send(Event::Resize),
        _ => Ok(()),
      };
      if sent.is_err() {
        break;
      }
    });
  }

  /// Sender handed to fetch units and timers
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

impl Default for EventHandler {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_describe() {
    let list = FetchEvent {
      generation: 1,
      outcome: FetchOutcome::AlertList {
        page: 3,
        result: Err(FetchError::Transport("offline".to_string())),
      },
    };
    assert_eq!(list.describe(), "alerts page 3");
    assert_eq!(list.resource(), ResourceKind::Alerts);
    assert!(!list.is_ok());

    let detail = FetchEvent {
      generation: 1,
      outcome: FetchOutcome::IncidentDetail {
        index: 0,
        id: "INC-1".to_string(),
        result: Err(FetchError::Decode("eof".to_string())),
      },
    };
    assert_eq!(detail.describe(), "incidents detail INC-1 (row 0)");
  }
}
