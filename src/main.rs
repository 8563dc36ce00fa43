mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod logging;
mod scheduler;
mod state;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;

use crate::config::CacheBackendKind;
use crate::logging::Logger;

#[derive(Parser, Debug)]
#[command(name = "inctui")]
#[command(about = "A terminal UI for browsing incidents and alerts")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/inctui/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Use synthetic data even if an API is configured
  #[arg(long)]
  mock: bool,

  /// Disable caching entirely
  #[arg(long)]
  no_cache: bool,

  /// Records per page
  #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
  page_size: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line overrides
  if args.mock {
    config.api = None;
  }
  if args.no_cache {
    config.cache.backend = CacheBackendKind::None;
  }
  if let Some(page_size) = args.page_size {
    config.page_size = page_size;
  }

  let logger = Logger::new(config.log_buffer);

  // Keep the guard alive so buffered lines are flushed on exit
  let _log_guard = match logging::default_log_dir() {
    Some(dir) => match logging::init_file_sink(&dir) {
      Ok(guard) => Some(guard),
      Err(e) => {
        logger.warn(format!("File logging disabled: {}", e));
        None
      }
    },
    None => None,
  };

  // Initialize and run the app
  let mut events = event::EventHandler::new();
  let mut app = app::App::new(config, logger, events.sender())?;
  app.run(&mut events).await?;

  Ok(())
}
