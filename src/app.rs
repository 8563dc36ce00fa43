use crate::api::{
  AnySource, DataOrchestrator, HttpSource, ListRequest, MockSource, ResourceKind, SortSpec,
};
use crate::cache::{CacheBackend, MemoryCache, SqliteCache};
use crate::commands::{self, Command};
use crate::config::{CacheBackendKind, CacheConfig, Config};
use crate::event::{Event, EventHandler};
use crate::logging::Logger;
use crate::scheduler::Scheduler;
use crate::state::{AppState, Applied, ListTicket};
use crate::ui;
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
}

/// Main application state
pub struct App {
  /// Everything the reducer owns
  state: AppState,

  scheduler: Scheduler<CacheBackend, AnySource>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  page_size: u32,
  title: String,
  logger: Logger,

  /// Whether to quit
  should_quit: bool,
}

/// Open one cache tier as configured. `None` means that tier always fetches.
fn build_tier(config: &CacheConfig, ttl: Duration, logger: &Logger) -> Option<CacheBackend> {
  match config.backend {
    CacheBackendKind::None => None,
    CacheBackendKind::Memory => Some(MemoryCache::new(ttl, logger.clone()).into()),
    CacheBackendKind::Sqlite => {
      let path = match config.path.clone() {
        Some(path) => path,
        None => match SqliteCache::default_path() {
          Ok(path) => path,
          Err(e) => {
            logger.warn(format!("Cache disabled: {}", e));
            return None;
          }
        },
      };
      SqliteCache::open_or_disable(&path, ttl, logger).map(CacheBackend::from)
    }
  }
}

fn build_source(config: &Config) -> Result<AnySource> {
  match &config.api {
    Some(api) => Ok(AnySource::Http(HttpSource::new(api)?)),
    None => Ok(AnySource::Mock(MockSource::new(Duration::from_millis(
      config.mock.latency_ms,
    )))),
  }
}

impl App {
  pub fn new(config: Config, logger: Logger, tx: mpsc::UnboundedSender<Event>) -> Result<Self> {
    let source = build_source(&config)?;
    let lists = build_tier(&config.cache, config.cache.list_ttl(), &logger);
    let details = build_tier(&config.cache, config.cache.detail_ttl(), &logger);
    logger.info(format!(
      "Using {} source, {} cache",
      source.describe(),
      lists.as_ref().map(CacheBackend::kind).unwrap_or("no")
    ));

    let orchestrator = DataOrchestrator::new(source, lists, details, logger.clone());
    let scheduler = Scheduler::new(
      orchestrator,
      tx,
      Duration::from_millis(config.tick_rate_ms.max(1)),
      logger.clone(),
    );

    Ok(Self {
      state: AppState::new(SortSpec::parse(&config.sort)),
      scheduler,
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      page_size: config.page_size,
      title: config.display_title(),
      logger,
      should_quit: false,
    })
  }

  /// Kick off the first page of every resource and startup maintenance.
  pub fn start(&mut self) {
    for resource in ResourceKind::ALL {
      let ticket = match resource {
        ResourceKind::Incidents => self.state.incidents.begin_page(1),
        ResourceKind::Alerts => self.state.alerts.begin_page(1),
      };
      self.dispatch_list(resource, ticket, false);
    }

    if let Some(CacheBackend::Sqlite(cache)) = self.scheduler.orchestrator().list_cache() {
      let cache = cache.clone();
      self
        .logger
        .debug(format!("Cleaning expired entries in {}", cache.path().display()));
      self.scheduler.spawn_cleanup(move || cache.cleanup());
    }

    self.scheduler.ensure_spinner(self.state.is_busy());
  }

  pub async fn run(&mut self, events: &mut EventHandler) -> Result<()> {
    // Setup terminal
    enable_raw_mode().map_err(|e| eyre!("Failed to enable raw mode: {}", e))?;
    stdout()
      .execute(EnterAlternateScreen)
      .map_err(|e| eyre!("Failed to enter alternate screen: {}", e))?;
    install_panic_hook();

    let result = self.event_loop(events).await;

    // Cleanup terminal
    restore_terminal();
    result
  }

  async fn event_loop(&mut self, events: &mut EventHandler) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    events.spawn_input_reader(Duration::from_millis(100));
    self.start();

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  pub fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize => {} // Next draw picks up the new size
      Event::Fetch(fetch) => {
        let label = fetch.describe();
        let outcome = if fetch.is_ok() { "ok" } else { "error" };
        let generation = fetch.generation;
        match self.state.apply(fetch) {
          Applied::Applied => self.logger.debug(format!("Applied {} ({})", label, outcome)),
          Applied::Stale => self.logger.debug(format!(
            "Discarded stale {} (generation {})",
            label, generation
          )),
        }
        self.scheduler.ensure_spinner(self.state.is_busy());
      }
      Event::Spinner => {
        self.scheduler.spinner_fired();
        if self.state.is_busy() {
          self.state.advance_spinner();
          self.scheduler.ensure_spinner(true);
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      // Quit
      KeyCode::Char('q') | KeyCode::Esc => {
        if self.state.show_logs {
          self.state.show_logs = false;
        } else if self.detail_open() {
          self.close_detail();
        } else if key.code == KeyCode::Char('q') {
          self.should_quit = true;
        }
      }
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Enter => self.open_selected(),
      KeyCode::Right | KeyCode::PageDown | KeyCode::Char('n') => self.next_page(),
      KeyCode::Left | KeyCode::PageUp | KeyCode::Char('p') => self.prev_page(),
      KeyCode::Tab => self.state.switch_resource(),

      // Data
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('s') => self.toggle_sort(),
      KeyCode::Char('L') => self.state.show_logs = !self.state.show_logs,

      // Mode switches
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
      }

      _ => {}
    }
  }

  fn handle_command_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => self.cycle_suggestion(1),
      KeyCode::BackTab | KeyCode::Up => self.cycle_suggestion(-1),
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0; // Reset selection on input change
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn cycle_suggestion(&mut self, delta: i32) {
    let count = commands::complete(&self.command_input).len();
    if count > 0 {
      self.selected_suggestion =
        (self.selected_suggestion as i32 + delta).rem_euclid(count as i32) as usize;
    }
  }

  fn execute_command(&mut self) {
    // The highlighted completion, so partial input like "al" works
    let command = commands::complete(&self.command_input)
      .get(self.selected_suggestion)
      .copied();
    let input = std::mem::take(&mut self.command_input);

    let Some(command) = command else {
      self
        .logger
        .warn(format!("Unknown command: {}", input.trim()));
      return;
    };
    self.logger.debug(format!("Running :{}", command));

    match command {
      Command::Incidents => self.state.active = ResourceKind::Incidents,
      Command::Alerts => self.state.active = ResourceKind::Alerts,
      Command::Refresh => self.refresh(),
      Command::Logs => self.state.show_logs = !self.state.show_logs,
      Command::Quit => self.should_quit = true,
    }
  }

  /// Send a started list fetch to the scheduler.
  fn dispatch_list(&mut self, resource: ResourceKind, ticket: ListTicket, clear_first: bool) {
    let request = ListRequest {
      page: ticket.page,
      page_size: self.page_size,
      sort: ticket.sort,
    };
    self
      .scheduler
      .dispatch_list(resource, request, ticket.generation, clear_first);
    self.scheduler.ensure_spinner(true);
  }

  fn next_page(&mut self) {
    let resource = self.state.active;
    let ticket = match resource {
      ResourceKind::Incidents => self.state.incidents.begin_next(),
      ResourceKind::Alerts => self.state.alerts.begin_next(),
    };
    if let Some(ticket) = ticket {
      self.dispatch_list(resource, ticket, false);
    }
  }

  fn prev_page(&mut self) {
    let resource = self.state.active;
    let ticket = match resource {
      ResourceKind::Incidents => self.state.incidents.begin_prev(),
      ResourceKind::Alerts => self.state.alerts.begin_prev(),
    };
    if let Some(ticket) = ticket {
      self.dispatch_list(resource, ticket, false);
    }
  }

  /// Wipe the cache and reload page 1 of the active view.
  fn refresh(&mut self) {
    let resource = self.state.active;
    let ticket = match resource {
      ResourceKind::Incidents => self.state.incidents.begin_page(1),
      ResourceKind::Alerts => self.state.alerts.begin_page(1),
    };
    self.logger.info(format!("Refreshing {}", resource.path()));
    self.dispatch_list(resource, ticket, true);
  }

  fn toggle_sort(&mut self) {
    let resource = self.state.active;
    let ticket = match resource {
      ResourceKind::Incidents => self.state.incidents.begin_sort_toggle(),
      ResourceKind::Alerts => self.state.alerts.begin_sort_toggle(),
    };
    self.dispatch_list(resource, ticket, false);
  }

  fn move_selection(&mut self, delta: i32) {
    match self.state.active {
      ResourceKind::Incidents => self.state.incidents.move_selection(delta),
      ResourceKind::Alerts => self.state.alerts.move_selection(delta),
    }
    // An open detail pane follows the cursor
    if self.detail_open() {
      self.open_selected();
    }
  }

  /// Show the selected row's detail, fetching it if needed.
  fn open_selected(&mut self) {
    let resource = self.state.active;
    let request = match resource {
      ResourceKind::Incidents => {
        let view = &mut self.state.incidents;
        if view.rows.is_empty() {
          return;
        }
        view.open_detail = Some(view.selected);
        view.begin_detail(view.selected)
      }
      ResourceKind::Alerts => {
        let view = &mut self.state.alerts;
        if view.rows.is_empty() {
          return;
        }
        view.open_detail = Some(view.selected);
        view.begin_detail(view.selected)
      }
    };

    if let Some(request) = request {
      self.scheduler.dispatch_detail(resource, request);
      self.scheduler.ensure_spinner(true);
    }
  }

  fn detail_open(&self) -> bool {
    match self.state.active {
      ResourceKind::Incidents => self.state.incidents.open_detail.is_some(),
      ResourceKind::Alerts => self.state.alerts.open_detail.is_some(),
    }
  }

  fn close_detail(&mut self) {
    match self.state.active {
      ResourceKind::Incidents => self.state.incidents.open_detail = None,
      ResourceKind::Alerts => self.state.alerts.open_detail = None,
    }
  }

  // Accessors for UI rendering
  pub fn state(&self) -> &AppState {
    &self.state
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn logger(&self) -> &Logger {
    &self.logger
  }

  pub fn autocomplete_suggestions(&self) -> Vec<Command> {
    commands::complete(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }
}

fn restore_terminal() {
  let _ = disable_raw_mode();
  let _ = stdout().execute(LeaveAlternateScreen);
}

/// Leave the alternate screen before the panic report is printed.
fn install_panic_hook() {
  let previous = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    restore_terminal();
    previous(info);
  }));
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::state::{DetailLoadState, ViewPhase};
  use crossterm::event::KeyEventKind;

  fn test_config() -> Config {
    let mut config = Config::default();
    config.cache.backend = CacheBackendKind::Memory;
    config.mock.latency_ms = 0;
    config.tick_rate_ms = 5;
    config
  }

  fn app() -> (App, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = App::new(test_config(), Logger::new(100), tx).unwrap();
    (app, rx)
  }

  fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new_with_kind(
      code,
      KeyModifiers::NONE,
      KeyEventKind::Press,
    ))
  }

  /// Feed inbox events to the app until nothing is loading.
  async fn settle(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Event>) {
    while app.state().is_busy() {
      let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("app never settled")
        .expect("inbox closed");
      app.handle_event(event);
    }
  }

  #[tokio::test]
  async fn test_start_loads_both_resources() {
    let (mut app, mut rx) = app();
    app.start();
    assert!(app.state().is_busy());

    settle(&mut app, &mut rx).await;
    let state = app.state();
    assert!(!state.initial_loading);
    assert_eq!(state.incidents.rows.len(), 25);
    assert!(!state.alerts.rows.is_empty());
    assert_eq!(state.incidents.pagination.unwrap().current_page, 1);
  }

  #[tokio::test]
  async fn test_paging_forward_and_back() {
    let (mut app, mut rx) = app();
    app.start();
    settle(&mut app, &mut rx).await;

    app.handle_event(key(KeyCode::Char('n')));
    assert_eq!(app.state().incidents.phase(), ViewPhase::ListLoading);
    settle(&mut app, &mut rx).await;
    assert_eq!(app.state().incidents.rows[0].record.id, "INC-0026");

    app.handle_event(key(KeyCode::Char('p')));
    settle(&mut app, &mut rx).await;
    assert_eq!(app.state().incidents.rows[0].record.id, "INC-0001");

    // Nothing before page 1
    app.handle_event(key(KeyCode::Char('p')));
    assert!(!app.state().is_busy());
  }

  #[tokio::test]
  async fn test_enter_loads_detail() {
    let (mut app, mut rx) = app();
    app.start();
    settle(&mut app, &mut rx).await;

    app.handle_event(key(KeyCode::Char('j')));
    app.handle_event(key(KeyCode::Enter));
    assert_eq!(app.state().incidents.phase(), ViewPhase::DetailLoading(1));
    settle(&mut app, &mut rx).await;

    let row = &app.state().incidents.rows[1];
    match &row.detail {
      DetailLoadState::Loaded(detail) => assert_eq!(detail.id, "INC-0002"),
      other => panic!("unexpected detail state {:?}", other),
    }
    assert_eq!(app.state().incidents.open_detail, Some(1));

    // Esc closes the pane instead of quitting
    app.handle_event(key(KeyCode::Esc));
    assert_eq!(app.state().incidents.open_detail, None);
    assert!(!app.should_quit());
  }

  #[tokio::test]
  async fn test_tab_switches_views_independently() {
    let (mut app, mut rx) = app();
    app.start();
    settle(&mut app, &mut rx).await;

    app.handle_event(key(KeyCode::Tab));
    assert_eq!(app.state().active, ResourceKind::Alerts);
    app.handle_event(key(KeyCode::Char('n')));
    settle(&mut app, &mut rx).await;

    assert_eq!(app.state().alerts.pagination.unwrap().current_page, 2);
    assert_eq!(app.state().incidents.pagination.unwrap().current_page, 1);
  }

  #[tokio::test]
  async fn test_sort_toggle_reloads_first_page() {
    let (mut app, mut rx) = app();
    app.start();
    settle(&mut app, &mut rx).await;

    app.handle_event(key(KeyCode::Char('s')));
    settle(&mut app, &mut rx).await;

    let view = &app.state().incidents;
    assert!(!view.sort.descending);
    assert_eq!(view.rows[0].record.id, "INC-0087");
  }

  #[tokio::test]
  async fn test_refresh_returns_to_first_page() {
    let (mut app, mut rx) = app();
    app.start();
    settle(&mut app, &mut rx).await;
    app.handle_event(key(KeyCode::Char('n')));
    settle(&mut app, &mut rx).await;

    app.handle_event(key(KeyCode::Char('r')));
    // Page 2 stays on screen until page 1 arrives
    assert_eq!(app.state().incidents.pagination.unwrap().current_page, 2);
    settle(&mut app, &mut rx).await;
    assert_eq!(app.state().incidents.pagination.unwrap().current_page, 1);
  }

  #[tokio::test]
  async fn test_double_next_lands_two_pages_on() {
    let (mut app, mut rx) = app();
    app.start();
    settle(&mut app, &mut rx).await;

    app.handle_event(key(KeyCode::Char('n')));
    app.handle_event(key(KeyCode::Char('n')));
    settle(&mut app, &mut rx).await;

    assert_eq!(app.state().incidents.pagination.unwrap().current_page, 3);
    assert_eq!(app.state().incidents.rows[0].record.id, "INC-0051");
  }

  #[tokio::test]
  async fn test_command_mode() {
    let (mut app, _rx) = app();

    app.handle_event(key(KeyCode::Char(':')));
    assert_eq!(app.mode(), &Mode::Command);
    for c in "al".chars() {
      app.handle_event(key(KeyCode::Char(c)));
    }
    assert_eq!(app.autocomplete_suggestions(), vec![Command::Alerts]);
    app.handle_event(key(KeyCode::Enter));

    assert_eq!(app.mode(), &Mode::Normal);
    assert_eq!(app.state().active, ResourceKind::Alerts);

    app.handle_event(key(KeyCode::Char(':')));
    for c in "logs".chars() {
      app.handle_event(key(KeyCode::Char(c)));
    }
    app.handle_event(key(KeyCode::Enter));
    assert!(app.state().show_logs);
  }

  #[tokio::test]
  async fn test_command_suggestion_cycling() {
    let (mut app, _rx) = app();
    app.handle_event(key(KeyCode::Char(':')));

    // Empty input offers every command; Up wraps to the last one
    app.handle_event(key(KeyCode::Up));
    assert_eq!(app.selected_suggestion(), Command::ALL.len() - 1);
    app.handle_event(key(KeyCode::Enter));
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_unknown_command_is_logged() {
    let (mut app, _rx) = app();
    app.handle_event(key(KeyCode::Char(':')));
    for c in "zap".chars() {
      app.handle_event(key(KeyCode::Char(c)));
    }
    app.handle_event(key(KeyCode::Enter));

    assert_eq!(app.mode(), &Mode::Normal);
    assert_eq!(app.command_input(), "");
    assert!(app
      .logger()
      .recent()
      .iter()
      .any(|r| r.message == "Unknown command: zap"));
  }

  #[tokio::test]
  async fn test_quit() {
    let (mut app, _rx) = app();
    app.handle_event(key(KeyCode::Char('q')));
    assert!(app.should_quit());
  }
}
