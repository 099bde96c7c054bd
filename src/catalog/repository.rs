//! Offline-first access to the paginated catalog.
//!
//! The repository decides per call whether to ask the network or the local
//! store, keeps the unfiltered page cache coherent with the remote listing and
//! never hands a transport fault to its callers: every list call resolves to a
//! best-effort [`PageResult`].

use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::cache::{CatalogStore, DetailCache};

use super::client::CatalogApi;
use super::connectivity::Connectivity;
use super::error::FetchError;
use super::types::{DetailRecord, FetchRecord, FilterSet, PageResult, PageSource};

/// Outcome of a full catalog prefetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
  pub total_pages: u32,
  /// Pages refreshed from the network
  pub fetched: u32,
  /// Pages that could not be refreshed and were served from cache instead
  pub from_cache: u32,
}

pub struct CatalogRepository<A, S, N> {
  api: Arc<A>,
  store: Arc<S>,
  connectivity: N,
  details: DetailCache<A, S>,
  last_fetch: Mutex<Option<FetchRecord>>,
}

impl<A, S, N> CatalogRepository<A, S, N>
where
  A: CatalogApi,
  S: CatalogStore,
  N: Connectivity,
{
  pub fn new(api: A, store: S, connectivity: N) -> Self {
    let api = Arc::new(api);
    let store = Arc::new(store);
    let details = DetailCache::new(Arc::clone(&api), Arc::clone(&store));

    Self {
      api,
      store,
      connectivity,
      details,
      last_fetch: Mutex::new(None),
    }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  #[cfg(test)]
  pub(crate) fn api(&self) -> &A {
    &self.api
  }

  /// Fetch one page of the catalog under `filters`.
  ///
  /// 1. Offline, or the network call fails with anything but `NotFound`: answer from cache
  /// 2. `NotFound` from the network: an explicit empty result with zero pages
  /// 3. Network success: persist the page (unfiltered queries only) and return it
  pub async fn fetch_page(&self, page: u32, filters: &FilterSet) -> PageResult {
    let page = page.max(1);
    let filters = filters.clone().normalized();

    let result = if self.connectivity.is_connected().await {
      match self.api.list(page, &filters).await {
        Ok(response) => {
          debug!(
            page,
            pages = response.info.pages,
            count = response.info.count,
            has_next = response.info.next.is_some(),
            has_prev = response.info.prev.is_some(),
            "remote page fetched"
          );
          if filters.is_empty() {
            if let Err(e) = self.store.replace_page(page, &response.entries) {
              warn!(page, error = %e, "failed to cache page");
            }
          }
          PageResult {
            entries: response.entries,
            total_pages: response.info.pages,
            source: PageSource::Network,
          }
        }
        Err(err) if err.is_not_found() => {
          debug!(page, ?filters, "remote catalog has no match");
          PageResult::not_found()
        }
        Err(err) => {
          warn!(
            page,
            error = %err,
            kind = ?err.kind(),
            "remote fetch failed, falling back to cache"
          );
          self.from_cache(page, &filters)
        }
      }
    } else {
      debug!(page, "offline, reading from cache");
      self.from_cache(page, &filters)
    };

    self.record(page, filters, result.source);
    result
  }

  /// Detail record for `id`, served from cache when possible.
  pub async fn fetch_detail(&self, id: u32) -> Result<DetailRecord, FetchError> {
    self.details.get(id).await
  }

  /// The most recent `fetch_page` call and where its answer came from.
  pub fn last_fetch(&self) -> Option<FetchRecord> {
    self
      .last_fetch
      .lock()
      .map(|last| last.clone())
      .unwrap_or_default()
  }

  /// Pull every page of the unfiltered listing into the local cache.
  pub async fn prefetch(&self, concurrency: usize) -> SyncReport {
    let first = self.fetch_page(1, &FilterSet::default()).await;
    let total_pages = first.total_pages.max(1);
    let mut report = SyncReport {
      total_pages,
      ..Default::default()
    };
    report.tally(first.source);

    let unfiltered = FilterSet::default();
    let mut rest = stream::iter(2..=total_pages)
      .map(|page| {
        let filters = &unfiltered;
        async move { (page, self.fetch_page(page, filters).await) }
      })
      .buffer_unordered(concurrency.max(1));

    while let Some((page, result)) = rest.next().await {
      debug!(page, entries = result.entries.len(), source = ?result.source, "prefetched page");
      report.tally(result.source);
    }

    info!(
      total_pages,
      fetched = report.fetched,
      from_cache = report.from_cache,
      "catalog prefetch finished"
    );
    report
  }

  fn from_cache(&self, page: u32, filters: &FilterSet) -> PageResult {
    if filters.is_empty() {
      let entries = self.store.get_page(page).unwrap_or_else(|e| {
        warn!(page, error = %e, "failed to read cached page");
        Vec::new()
      });
      let total_pages = match self.store.max_known_page() {
        Ok(max) => max.unwrap_or(1).max(1),
        Err(e) => {
          warn!(error = %e, "failed to read max cached page");
          1
        }
      };
      PageResult {
        entries,
        total_pages,
        source: PageSource::Cache,
      }
    } else {
      // Filtered results are not page-addressable offline: one synthetic page.
      let entries = self.store.scan(filters).unwrap_or_else(|e| {
        warn!(error = %e, "failed to scan cached entries");
        Vec::new()
      });
      PageResult {
        entries,
        total_pages: 1,
        source: PageSource::Cache,
      }
    }
  }

  fn record(&self, page: u32, filters: FilterSet, source: PageSource) {
    if let Ok(mut last) = self.last_fetch.lock() {
      *last = Some(FetchRecord {
        page,
        filters,
        source,
        at: Utc::now(),
      });
    }
  }
}

impl SyncReport {
  fn tally(&mut self, source: PageSource) {
    match source {
      PageSource::Network => self.fetched += 1,
      PageSource::Cache => self.from_cache += 1,
      PageSource::NotFound => {}
    }
  }
}
