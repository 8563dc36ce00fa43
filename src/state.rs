//! UI state and the single-threaded reducer that applies fetch results.
//!
//! Fetch units finish in any order. Each list dispatch bumps the view's
//! generation; a list result from an older generation is discarded instead of
//! overwriting newer state. Detail results are tied to the generation of the
//! rows they were requested from and to the row's id.

use crate::api::{FetchError, Page, Record, ResourceKind, SortSpec};
use crate::api::{Alert, AlertDetail, Incident, IncidentDetail};
use crate::event::{FetchEvent, FetchOutcome};

/// Whether a fetch result changed state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
  Applied,
  /// Superseded by a newer request, dropped
  Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
  pub current_page: u32,
  pub has_next: bool,
  pub has_prev: bool,
}

impl PaginationState {
  fn from_page(page: u32, has_next: bool) -> Self {
    Self {
      current_page: page,
      has_next,
      has_prev: page > 1,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailLoadState<D> {
  Unloaded,
  Loading,
  Loaded(D),
  Error(String),
}

impl<D> DetailLoadState<D> {
  pub fn is_loading(&self) -> bool {
    matches!(self, DetailLoadState::Loading)
  }
}

/// Derived per-view phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
  Idle,
  ListLoading,
  DetailLoading(usize),
}

#[derive(Debug, Clone)]
pub struct Row<S, D> {
  pub record: S,
  pub detail: DetailLoadState<D>,
}

/// Everything needed to dispatch one detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
  pub index: usize,
  pub id: String,
  pub version: Option<String>,
  pub generation: u64,
}

/// A list fetch that has been dispatched and not yet answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTicket {
  pub generation: u64,
  pub page: u32,
  pub sort: SortSpec,
}

/// One list view (incidents or alerts) with its rows and cursors.
///
/// `pagination` and `sort` always describe the rows on screen. A request for
/// another page or order is held as the pending ticket and only replaces them
/// once its result arrives successfully.
#[derive(Debug, Clone)]
pub struct ListView<S, D> {
  pub rows: Vec<Row<S, D>>,
  pub selected: usize,
  pub pagination: Option<PaginationState>,
  pub sort: SortSpec,
  pub list_loading: bool,
  pub error: Option<String>,
  /// Row shown in the detail pane
  pub open_detail: Option<usize>,
  /// Newest dispatched list fetch, until it resolves
  pending: Option<ListTicket>,
  /// Bumped on every list dispatch
  list_generation: u64,
  /// Generation of the list result currently displayed
  rows_generation: u64,
}

impl<S: Record, D> ListView<S, D> {
  pub fn new(sort: SortSpec) -> Self {
    Self {
      rows: Vec::new(),
      selected: 0,
      pagination: None,
      sort,
      list_loading: false,
      error: None,
      open_detail: None,
      pending: None,
      list_generation: 0,
      rows_generation: 0,
    }
  }

  fn begin(&mut self, page: u32, sort: SortSpec) -> ListTicket {
    self.list_generation += 1;
    self.list_loading = true;
    self.error = None;
    let ticket = ListTicket {
      generation: self.list_generation,
      page,
      sort,
    };
    self.pending = Some(ticket.clone());
    ticket
  }

  /// Mark a fetch of `page` in the current order as started.
  pub fn begin_page(&mut self, page: u32) -> ListTicket {
    let sort = self.requested_sort().clone();
    self.begin(page, sort)
  }

  /// Page 1 in the opposite direction.
  pub fn begin_sort_toggle(&mut self) -> ListTicket {
    let sort = self.requested_sort().toggled();
    self.begin(1, sort)
  }

  pub fn begin_next(&mut self) -> Option<ListTicket> {
    let page = self.next_page()?;
    Some(self.begin_page(page))
  }

  pub fn begin_prev(&mut self) -> Option<ListTicket> {
    let page = self.prev_page()?;
    Some(self.begin_page(page))
  }

  /// Order of the newest request, which may not be on screen yet.
  pub fn requested_sort(&self) -> &SortSpec {
    self.pending.as_ref().map_or(&self.sort, |t| &t.sort)
  }

  /// Page "next" should fetch.
  ///
  /// While a page is in flight this steps from the requested page, so
  /// repeated presses are not lost. Past the last page the source answers with
  /// an empty page and `has_next` unset.
  pub fn next_page(&self) -> Option<u32> {
    if let Some(ticket) = &self.pending {
      return Some(ticket.page + 1);
    }
    self
      .pagination
      .filter(|p| p.has_next)
      .map(|p| p.current_page + 1)
  }

  pub fn prev_page(&self) -> Option<u32> {
    if let Some(ticket) = &self.pending {
      return (ticket.page > 1).then(|| ticket.page - 1);
    }
    self
      .pagination
      .filter(|p| p.has_prev)
      .map(|p| p.current_page - 1)
  }

  pub fn apply_list(&mut self, generation: u64, result: Result<Page<S>, FetchError>) -> Applied {
    if generation != self.list_generation {
      return Applied::Stale;
    }

    self.list_loading = false;
    let ticket = self.pending.take();
    match result {
      Ok(page) => {
        if let Some(ticket) = ticket {
          self.sort = ticket.sort;
        }
        self.rows = page
          .items
          .into_iter()
          .map(|record| Row {
            record,
            detail: DetailLoadState::Unloaded,
          })
          .collect();
        self.pagination = Some(PaginationState::from_page(page.page, page.has_next));
        self.selected = 0;
        self.open_detail = None;
        self.rows_generation = generation;
      }
      Err(e) => {
        // Keep showing the previous page with its cursor and order
        self.error = Some(e.to_string());
      }
    }
    Applied::Applied
  }

  /// Mark a row's detail as loading, unless it is already loading or loaded.
  pub fn begin_detail(&mut self, index: usize) -> Option<DetailRequest> {
    let generation = self.rows_generation;
    let row = self.rows.get_mut(index)?;
    match row.detail {
      DetailLoadState::Loading | DetailLoadState::Loaded(_) => None,
      DetailLoadState::Unloaded | DetailLoadState::Error(_) => {
        row.detail = DetailLoadState::Loading;
        Some(DetailRequest {
          index,
          id: row.record.id().to_string(),
          version: row.record.version().map(String::from),
          generation,
        })
      }
    }
  }

  pub fn apply_detail(
    &mut self,
    generation: u64,
    index: usize,
    id: &str,
    result: Result<D, FetchError>,
  ) -> Applied {
    if generation != self.rows_generation {
      return Applied::Stale;
    }
    let Some(row) = self.rows.get_mut(index) else {
      return Applied::Stale;
    };
    if row.record.id() != id {
      return Applied::Stale;
    }

    row.detail = match result {
      Ok(detail) => DetailLoadState::Loaded(detail),
      Err(e) => DetailLoadState::Error(e.to_string()),
    };
    Applied::Applied
  }

  pub fn phase(&self) -> ViewPhase {
    if self.list_loading {
      return ViewPhase::ListLoading;
    }
    match self.rows.iter().position(|r| r.detail.is_loading()) {
      Some(index) => ViewPhase::DetailLoading(index),
      None => ViewPhase::Idle,
    }
  }

  pub fn is_busy(&self) -> bool {
    self.list_loading || self.rows.iter().any(|r| r.detail.is_loading())
  }

  pub fn move_selection(&mut self, delta: i32) {
    let len = self.rows.len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }
}

/// Whole-application UI state, owned by the render loop.
#[derive(Debug)]
pub struct AppState {
  pub active: ResourceKind,
  pub incidents: ListView<Incident, IncidentDetail>,
  pub alerts: ListView<Alert, AlertDetail>,
  /// Set until the first list result of any kind arrives
  pub initial_loading: bool,
  pub spinner_frame: usize,
  pub show_logs: bool,
}

impl AppState {
  pub fn new(sort: SortSpec) -> Self {
    Self {
      active: ResourceKind::Incidents,
      incidents: ListView::new(sort.clone()),
      alerts: ListView::new(sort),
      initial_loading: true,
      spinner_frame: 0,
      show_logs: false,
    }
  }

  /// Apply one fetch result. Each call is one atomic transition.
  pub fn apply(&mut self, event: FetchEvent) -> Applied {
    let generation = event.generation;
    match event.outcome {
      FetchOutcome::IncidentList { result, .. } => {
        let applied = self.incidents.apply_list(generation, result);
        self.finish_initial(applied)
      }
      FetchOutcome::AlertList { result, .. } => {
        let applied = self.alerts.apply_list(generation, result);
        self.finish_initial(applied)
      }
      FetchOutcome::IncidentDetail { index, id, result } => {
        self
          .incidents
          .apply_detail(generation, index, &id, result.map(|d| *d))
      }
      FetchOutcome::AlertDetail { index, id, result } => {
        self
          .alerts
          .apply_detail(generation, index, &id, result.map(|d| *d))
      }
    }
  }

  fn finish_initial(&mut self, applied: Applied) -> Applied {
    if applied == Applied::Applied {
      self.initial_loading = false;
    }
    applied
  }

  /// True while the spinner should keep running
  pub fn is_busy(&self) -> bool {
    self.initial_loading || self.incidents.is_busy() || self.alerts.is_busy()
  }

  pub fn advance_spinner(&mut self) {
    self.spinner_frame = self.spinner_frame.wrapping_add(1);
  }

  pub fn switch_resource(&mut self) {
    self.active = self.active.other();
  }
}
