use std::path::Path;
use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info, warn};

use crate::cache::{CatalogStore, SqliteStorage};
use crate::catalog::{CatalogRepository, FilterSet, HttpCatalogClient, NetworkOracle};
use crate::commands::{self, Action};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::output;
use crate::session::{BrowseSession, BrowseState, DetailSession, SessionSnapshot};

/// The repository wired to the live API, the on-disk cache and a TCP reachability probe
pub type LiveRepository = CatalogRepository<HttpCatalogClient, SqliteStorage, NetworkOracle>;
type LiveSession = BrowseSession<HttpCatalogClient, SqliteStorage, NetworkOracle>;
type LiveDetail = DetailSession<HttpCatalogClient, SqliteStorage, NetworkOracle>;

pub struct App {
  config: Config,
  repo: Arc<LiveRepository>,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client = HttpCatalogClient::new(&config)?;
    let connectivity = if config.offline {
      NetworkOracle::Offline
    } else {
      NetworkOracle::probe(client.base_url(), config.api.probe_timeout())
    };

    let cache_path = config.cache_path()?;
    let store = SqliteStorage::open(&cache_path)?;
    info!(
      api = %client.base_url(),
      cache = %cache_path.display(),
      offline = config.offline,
      "catalog ready"
    );

    Ok(Self {
      repo: Arc::new(CatalogRepository::new(client, store, connectivity)),
      config,
    })
  }

  pub async fn list(&self, page: u32, filters: FilterSet) -> Result<()> {
    let result = self.repo.fetch_page(page, &filters).await;
    println!("{}", output::page_block(page.max(1), &result));
    Ok(())
  }

  pub async fn show(&self, id: u32) -> Result<()> {
    let record = self
      .repo
      .fetch_detail(id)
      .await
      .map_err(|e| eyre!("Failed to load character {}: {}", id, e))?;
    println!("{}", output::detail_block(&record));
    Ok(())
  }

  pub async fn sync(&self, concurrency: Option<usize>) -> Result<()> {
    let concurrency = concurrency.unwrap_or(self.config.sync.concurrency);
    let report = self.repo.prefetch(concurrency).await;

    println!(
      "{} pages: {} refreshed, {} from cache",
      report.total_pages, report.fetched, report.from_cache
    );
    if report.fetched == 0 {
      return Err(eyre!("Could not reach the catalog; nothing was refreshed"));
    }
    Ok(())
  }

  pub fn cache_stats(&self) -> Result<()> {
    let stats = self.repo.store().stats()?;
    println!("{}", output::stats_block(&stats));
    Ok(())
  }

  pub fn cache_clear(&self, page: Option<u32>) -> Result<()> {
    match page {
      Some(page) => {
        self.repo.store().delete_page(page)?;
        println!("Dropped cached page {}", page);
      }
      None => {
        self.repo.store().clear()?;
        println!("Cache cleared");
      }
    }
    Ok(())
  }

  /// Interactive session reading commands from stdin until `quit` or end of input.
  ///
  /// Filters given on the command line replace the ones restored from the last session.
  pub async fn browse(&self, filters: FilterSet) -> Result<()> {
    let snapshot_path = SessionSnapshot::default_path()?;
    let mut snapshot = restore_snapshot(&snapshot_path);
    if !filters.is_empty() {
      snapshot.filters = filters;
    }

    let session = BrowseSession::with_snapshot(Arc::clone(&self.repo), snapshot);
    let detail = Arc::new(DetailSession::new(Arc::clone(&self.repo)));
    let mut states = session.subscribe();
    let mut details = detail.subscribe();
    let mut events = EventHandler::stdin();
    let mut printer = ListingPrinter::default();

    println!("Type `help` for commands.");
    spawn_load(&session, |s| async move { s.start().await });

    loop {
      tokio::select! {
        event = events.next() => {
          let line = match event {
            Some(Event::Line(line)) => line,
            Some(Event::Eof) | None => break,
          };
          match commands::parse(&line) {
            Ok(Some(Action::Quit)) => break,
            Ok(Some(action)) => self.dispatch(action, &session, &detail),
            Ok(None) => {}
            Err(e) => println!("{}", e),
          }
        }
        changed = states.changed() => {
          if changed.is_err() {
            break;
          }
          let state = states.borrow_and_update().clone();
          printer.show(&state);
        }
        changed = details.changed() => {
          if changed.is_err() {
            break;
          }
          if let Some(text) = output::detail_state(&details.borrow_and_update()) {
            println!("{}", text);
          }
        }
      }
    }

    session.snapshot().save(&snapshot_path)?;
    debug!(path = %snapshot_path.display(), "session saved");
    Ok(())
  }

  fn dispatch(&self, action: Action, session: &LiveSession, detail: &Arc<LiveDetail>) {
    match action {
      Action::Next => {
        if session.state().can_load_more {
          spawn_load(session, |s| async move { s.load_next_page().await });
        } else {
          println!("No more pages.");
        }
      }
      Action::Refresh => spawn_load(session, |s| async move { s.refresh().await }),
      Action::Search(text) => {
        spawn_load(session, |s| async move { s.set_search_query(text).await })
      }
      Action::Filter(assignments) => {
        let filters = assignments
          .into_iter()
          .fold(session.state().filters, |filters, (field, value)| {
            field.apply(filters, &value)
          });
        spawn_load(session, |s| async move { s.set_filters(filters).await });
      }
      Action::Clear => spawn_load(session, |s| async move {
        s.set_filters(FilterSet::default()).await
      }),
      Action::Open(id) => {
        let detail = Arc::clone(detail);
        tokio::spawn(async move { detail.open(id).await });
      }
      Action::Close => detail.close(),
      Action::Anchor { index, offset } => session.save_scroll_anchor(index, offset),
      Action::State => {
        println!("{}", output::state_line(&session.state()));
        if let Some(record) = self.repo.last_fetch() {
          println!("{}", output::fetch_line(&record));
        }
      }
      Action::Help => println!("{}", output::help_text()),
      Action::Quit => {}
    }
  }
}

/// Run a session operation in the background so the prompt stays responsive.
fn spawn_load<F, Fut>(session: &LiveSession, op: F)
where
  F: FnOnce(LiveSession) -> Fut,
  Fut: std::future::Future<Output = ()> + Send + 'static,
{
  tokio::spawn(op(session.clone()));
}

fn restore_snapshot(path: &Path) -> SessionSnapshot {
  match SessionSnapshot::load(path) {
    Ok(snapshot) => snapshot.unwrap_or_default(),
    Err(e) => {
      warn!(error = %e, "ignoring unreadable session file");
      SessionSnapshot::default()
    }
  }
}

/// Prints the listing as loads settle: everything after a reset, only the new
/// tail after a next page.
#[derive(Default)]
struct ListingPrinter {
  printed: usize,
  was_loading: bool,
  settled: Option<(u32, usize, FilterSet)>,
}

impl ListingPrinter {
  fn show(&mut self, state: &BrowseState) {
    if state.is_loading() {
      if !self.was_loading {
        println!("{}", output::state_line(state));
      }
      self.was_loading = true;
      return;
    }

    // Loads can settle between two polls, so compare against what was printed last.
    let key = (
      state.current_page,
      state.accumulated_entries.len(),
      state.filters.clone(),
    );
    if !self.was_loading && self.settled.as_ref() == Some(&key) {
      return;
    }
    self.was_loading = false;

    let start = if state.current_page <= 1 || self.printed > state.accumulated_entries.len() {
      0
    } else {
      self.printed
    };
    for entry in &state.accumulated_entries[start..] {
      println!("{}", output::entry_line(entry));
    }
    self.printed = state.accumulated_entries.len();
    self.settled = Some(key);
    println!("{}", output::state_line(state));
  }
}
