//! Detail view controller.
//!
//! Opening an id moves the published state through `Loading` to either
//! `Loaded` or `Failed`. Opening another id before the first settles
//! supersedes it; the older answer is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::CatalogStore;
use crate::catalog::{CatalogApi, CatalogRepository, Connectivity, DetailRecord, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
  Idle,
  Loading(u32),
  Loaded(DetailRecord),
  Failed { kind: ErrorKind, message: String },
}

pub struct DetailSession<A, S, N> {
  repo: Arc<CatalogRepository<A, S, N>>,
  state: watch::Sender<DetailState>,
  generation: AtomicU64,
}

impl<A, S, N> DetailSession<A, S, N>
where
  A: CatalogApi,
  S: CatalogStore,
  N: Connectivity,
{
  pub fn new(repo: Arc<CatalogRepository<A, S, N>>) -> Self {
    let (tx, _rx) = watch::channel(DetailState::Idle);
    Self {
      repo,
      state: tx,
      generation: AtomicU64::new(0),
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<DetailState> {
    self.state.subscribe()
  }

  pub fn state(&self) -> DetailState {
    self.state.borrow().clone()
  }

  /// Load the record for `id`, cache first.
  pub async fn open(&self, id: u32) {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    self.state.send_replace(DetailState::Loading(id));

    let repo = Arc::clone(&self.repo);
    let outcome = tokio::spawn(async move { repo.fetch_detail(id).await }).await;

    let next = match outcome {
      Ok(Ok(record)) => DetailState::Loaded(record),
      Ok(Err(err)) => {
        debug!(id, error = %err, "detail load failed");
        DetailState::Failed {
          kind: err.kind(),
          message: err.to_string(),
        }
      }
      Err(e) => {
        warn!(id, error = %e, "detail load aborted");
        DetailState::Failed {
          kind: ErrorKind::Unclassified,
          message: e.to_string(),
        }
      }
    };

    self.state.send_if_modified(|s| {
      if self.generation.load(Ordering::SeqCst) != generation {
        return false;
      }
      *s = next;
      true
    });
  }

  /// Back to `Idle`, dropping any load still in flight.
  pub fn close(&self) {
    self.generation.fetch_add(1, Ordering::SeqCst);
    self.state.send_replace(DetailState::Idle);
  }
}
