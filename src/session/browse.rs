//! Paginated browse session over the catalog repository.
//!
//! The session owns the pagination cursor, the accumulated entries and the
//! in-flight flags, and publishes every transition as one atomic update of a
//! [`BrowseState`] through a `watch` channel.
//!
//! Loads that reset the listing (`start`, `set_filters`, `set_search_query`,
//! `refresh`) bump a generation counter. A load only applies its result if its
//! generation is still the latest when it completes, so a slow superseded load
//! can never clobber a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::CatalogStore;
use crate::catalog::{
  CatalogApi, CatalogRepository, Connectivity, FilterSet, PageResult, PageSource,
};

use super::snapshot::SessionSnapshot;
use super::state::{BrowseState, ScrollAnchor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadKind {
  Initial,
  Refresh,
  NextPage,
}

#[derive(Debug)]
struct Ticket {
  generation: u64,
  page: u32,
  filters: FilterSet,
  kind: LoadKind,
}

struct Inner<A, S, N> {
  repo: Arc<CatalogRepository<A, S, N>>,
  state: watch::Sender<BrowseState>,
  generation: AtomicU64,
}

impl<A, S, N> Inner<A, S, N> {
  fn is_current(&self, generation: u64) -> bool {
    self.generation.load(Ordering::SeqCst) == generation
  }
}

/// Browse session controller. Cloning yields another handle to the same session.
pub struct BrowseSession<A, S, N> {
  inner: Arc<Inner<A, S, N>>,
}

impl<A, S, N> Clone for BrowseSession<A, S, N> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

impl<A, S, N> BrowseSession<A, S, N>
where
  A: CatalogApi,
  S: CatalogStore,
  N: Connectivity,
{
  pub fn new(repo: Arc<CatalogRepository<A, S, N>>) -> Self {
    Self::with_snapshot(repo, SessionSnapshot::default())
  }

  /// Session restored from a previous run. Nothing is loaded until [`start`](Self::start).
  pub fn with_snapshot(repo: Arc<CatalogRepository<A, S, N>>, snapshot: SessionSnapshot) -> Self {
    let filters = snapshot.filters.normalized();
    let state = BrowseState {
      search_query: filters.name.clone().unwrap_or_default(),
      filters,
      scroll_anchor: snapshot.scroll_anchor,
      ..Default::default()
    };
    let (tx, _rx) = watch::channel(state);

    Self {
      inner: Arc::new(Inner {
        repo,
        state: tx,
        generation: AtomicU64::new(0),
      }),
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<BrowseState> {
    self.inner.state.subscribe()
  }

  /// Current state (a copy).
  pub fn state(&self) -> BrowseState {
    self.inner.state.borrow().clone()
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    let state = self.inner.state.borrow();
    SessionSnapshot {
      filters: state.filters.clone(),
      scroll_anchor: state.scroll_anchor,
    }
  }

  /// Initial load of page 1 under the current filters.
  pub async fn start(&self) {
    let ticket = self.begin_reset(LoadKind::Initial, |s| s.accumulated_entries.clear());
    self.run(ticket).await;
  }

  /// Replace the filters and reload from page 1.
  pub async fn set_filters(&self, filters: FilterSet) {
    let filters = filters.normalized();
    let ticket = self.begin_reset(LoadKind::Initial, move |s| {
      s.search_query = filters.name.clone().unwrap_or_default();
      s.filters = filters;
      s.accumulated_entries.clear();
    });
    self.run(ticket).await;
  }

  /// Replace the name filter and reload from page 1.
  ///
  /// Keystroke-level input should be debounced by the caller.
  pub async fn set_search_query(&self, text: impl Into<String>) {
    let text = text.into();
    let ticket = self.begin_reset(LoadKind::Initial, move |s| {
      s.filters = s.filters.clone().with_name(text.clone());
      s.search_query = text;
      s.accumulated_entries.clear();
    });
    self.run(ticket).await;
  }

  /// Reload page 1 under the current filters, keeping entries visible meanwhile.
  pub async fn refresh(&self) {
    let ticket = self.begin_reset(LoadKind::Refresh, |_| {});
    self.run(ticket).await;
  }

  /// Load and append the next page. No-op on the last page or while a next-page
  /// load is already in flight.
  pub async fn load_next_page(&self) {
    let mut ticket = None;
    self.inner.state.send_if_modified(|s| {
      if s.current_page >= s.total_pages || s.is_loading_next_page {
        return false;
      }
      s.current_page += 1;
      s.is_loading_next_page = true;
      ticket = Some(Ticket {
        generation: self.inner.generation.load(Ordering::SeqCst),
        page: s.current_page,
        filters: s.filters.clone(),
        kind: LoadKind::NextPage,
      });
      true
    });

    if let Some(ticket) = ticket {
      self.run(ticket).await;
    }
  }

  pub fn save_scroll_anchor(&self, index: u32, offset: u32) {
    self
      .inner
      .state
      .send_modify(|s| s.scroll_anchor = ScrollAnchor { index, offset });
  }

  /// Start a new generation: apply `edit`, rewind to page 1 and raise the flag for `kind`.
  fn begin_reset(&self, kind: LoadKind, edit: impl FnOnce(&mut BrowseState)) -> Ticket {
    let mut generation = 0;
    let mut filters = FilterSet::default();

    self.inner.state.send_modify(|s| {
      edit(s);
      generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
      s.current_page = 1;
      s.total_pages = 1;
      s.can_load_more = false;
      match kind {
        LoadKind::Refresh => s.is_refreshing = true,
        _ => s.is_initial_loading = true,
      }
      filters = s.filters.clone();
    });

    Ticket {
      generation,
      page: 1,
      filters,
      kind,
    }
  }

  /// Fetch the ticket's page off the caller's task and apply it if still current.
  async fn run(&self, ticket: Ticket) {
    let Ticket {
      generation,
      page,
      filters,
      kind,
    } = ticket;
    debug!(generation, page, ?kind, "page load started");

    let mut guard = FlagGuard {
      inner: &self.inner,
      generation,
      armed: true,
    };

    let repo = Arc::clone(&self.inner.repo);
    let outcome = tokio::spawn(async move { repo.fetch_page(page, &filters).await }).await;

    guard.armed = false;
    self.inner.state.send_if_modified(|s| {
      if !self.inner.is_current(generation) {
        debug!(generation, page, "discarding superseded page load");
        return false;
      }

      match outcome {
        Ok(result) => apply(s, kind, result),
        Err(e) => {
          warn!(page, error = %e, "page load failed");
          s.has_network_error = true;
        }
      }
      s.clear_flags();
      true
    });
  }
}

fn apply(state: &mut BrowseState, kind: LoadKind, result: PageResult) {
  let nothing_cached = result.source == PageSource::Cache && result.entries.is_empty();

  match kind {
    LoadKind::NextPage => state.accumulated_entries.extend(result.entries),
    LoadKind::Initial | LoadKind::Refresh => state.accumulated_entries = result.entries,
  }
  state.total_pages = result.total_pages;
  state.can_load_more = state.current_page < state.total_pages;
  state.has_network_error = nothing_cached;
  state.last_source = Some(result.source);
}

/// Clears the in-flight flags if a load ends without reaching the normal
/// completion path (cancelled future or panic), unless a newer load owns them.
struct FlagGuard<'a, A, S, N> {
  inner: &'a Inner<A, S, N>,
  generation: u64,
  armed: bool,
}

impl<A, S, N> Drop for FlagGuard<'_, A, S, N> {
  fn drop(&mut self) {
    if !self.armed {
      return;
    }
    let inner = self.inner;
    let generation = self.generation;
    inner.state.send_if_modified(|s| {
      if !inner.is_current(generation) || !s.is_loading() {
        return false;
      }
      s.clear_flags();
      true
    });
  }
}
