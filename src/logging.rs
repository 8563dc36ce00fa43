//! Injected logging handle.
//!
//! A `Logger` keeps the most recent records in a bounded ring buffer (shown in
//! the log panel) and forwards every record to `tracing`. Whether that goes
//! anywhere depends on the subscriber installed by [`init_file_sink`]; stdout
//! belongs to the terminal UI, so nothing is printed.

use chrono::{DateTime, Local};
use color_eyre::{eyre::eyre, Result};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// One buffered log line
#[derive(Debug, Clone)]
pub struct LogRecord {
  pub at: DateTime<Local>,
  pub level: Level,
  pub message: String,
}

/// Cloneable logging handle; clones share one ring buffer.
#[derive(Clone)]
pub struct Logger {
  buffer: Arc<Mutex<VecDeque<LogRecord>>>,
  capacity: usize,
}

impl Logger {
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(1);
    Self {
      buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
      capacity,
    }
  }

  pub fn debug(&self, message: impl Into<String>) {
    let message = message.into();
    tracing::debug!("{}", message);
    self.push(Level::DEBUG, message);
  }

  pub fn info(&self, message: impl Into<String>) {
    let message = message.into();
    tracing::info!("{}", message);
    self.push(Level::INFO, message);
  }

  pub fn warn(&self, message: impl Into<String>) {
    let message = message.into();
    tracing::warn!("{}", message);
    self.push(Level::WARN, message);
  }

  pub fn error(&self, message: impl Into<String>) {
    let message = message.into();
    tracing::error!("{}", message);
    self.push(Level::ERROR, message);
  }

  /// Snapshot of buffered records, oldest first.
  pub fn recent(&self) -> Vec<LogRecord> {
    match self.buffer.lock() {
      Ok(buffer) => buffer.iter().cloned().collect(),
      Err(_) => Vec::new(),
    }
  }

  fn push(&self, level: Level, message: String) {
    // A poisoned buffer only loses log lines
    let Ok(mut buffer) = self.buffer.lock() else {
      return;
    };
    if buffer.len() == self.capacity {
      buffer.pop_front();
    }
    buffer.push_back(LogRecord {
      at: Local::now(),
      level,
      message,
    });
  }
}

impl std::fmt::Debug for Logger {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Logger")
      .field("capacity", &self.capacity)
      .finish_non_exhaustive()
  }
}

/// Install a file sink for `tracing` events under `dir`.
///
/// The returned guard flushes the non-blocking writer on drop and must be kept
/// alive for the lifetime of the program. Filtering follows `RUST_LOG`,
/// defaulting to `inctui=info`.
pub fn init_file_sink(dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::never(dir, "inctui.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("inctui=info"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}

/// Default log directory ($XDG_DATA_HOME/inctui)
pub fn default_log_dir() -> Option<std::path::PathBuf> {
  dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .map(|p| p.join("inctui"))
}
