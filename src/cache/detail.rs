use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{CatalogApi, DetailRecord, FetchError};

use super::storage::CatalogStore;

/// Cache-first lookup of detail records.
///
/// A cached record is served without touching the network. Misses go to the
/// remote catalog and the result is stored; remote failures are returned as-is
/// since there is no sensible substitute for a record never seen before.
pub struct DetailCache<A, S> {
  api: Arc<A>,
  store: Arc<S>,
}

impl<A: CatalogApi, S: CatalogStore> DetailCache<A, S> {
  pub fn new(api: Arc<A>, store: Arc<S>) -> Self {
    Self { api, store }
  }

  pub async fn get(&self, id: u32) -> Result<DetailRecord, FetchError> {
    if id == 0 {
      return Err(FetchError::NotFound(format!("character {}", id)));
    }

    match self.store.get_detail(id) {
      Ok(Some(record)) => {
        debug!(id, "detail cache hit");
        return Ok(record);
      }
      Ok(None) => debug!(id, "detail cache miss"),
      Err(e) => warn!(id, error = %e, "detail cache unreadable, fetching from network"),
    }

    let record = self.api.detail(id).await?;

    if let Err(e) = self.store.put_detail(&record) {
      warn!(id, error = %e, "failed to cache detail record");
    }

    Ok(record)
  }
}

impl<A, S> Clone for DetailCache<A, S> {
  fn clone(&self) -> Self {
    Self {
      api: Arc::clone(&self.api),
      store: Arc::clone(&self.store),
    }
  }
}
