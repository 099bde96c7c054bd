//! Scripted collaborators for exercising the repository and sessions without I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;

use super::client::CatalogApi;
use super::connectivity::Connectivity;
use super::error::FetchError;
use super::types::{DetailRecord, Entry, FilterSet, ListResponse, PageInfo};

pub fn entry(id: u32, name: &str) -> Entry {
  Entry {
    id,
    name: name.to_string(),
    status: "Alive".to_string(),
    species: "Human".to_string(),
    kind: String::new(),
    gender: "Male".to_string(),
    image_url: format!("https://example.test/avatar/{}.jpeg", id),
  }
}

pub fn detail(id: u32, name: &str) -> DetailRecord {
  DetailRecord {
    id,
    name: name.to_string(),
    status: "Alive".to_string(),
    species: "Human".to_string(),
    kind: String::new(),
    gender: "Male".to_string(),
    image_url: format!("https://example.test/avatar/{}.jpeg", id),
    origin_name: "Earth (C-137)".to_string(),
    location_name: "Citadel of Ricks".to_string(),
  }
}

pub fn list_response(entries: Vec<Entry>, pages: u32) -> ListResponse {
  ListResponse {
    info: PageInfo {
      count: entries.len() as u32,
      pages,
      next: None,
      prev: None,
    },
    entries,
  }
}

type ListReply = Result<ListResponse, FetchError>;

/// Remote catalog double with canned replies per (page, filters).
///
/// Unscripted pages and ids answer `NotFound`, like the real API.
#[derive(Default)]
pub struct FakeApi {
  pages: Mutex<Vec<(u32, FilterSet, ListReply)>>,
  gates: Mutex<Vec<(FilterSet, oneshot::Receiver<()>)>>,
  details: Mutex<HashMap<u32, DetailRecord>>,
  detail_failure: Mutex<Option<FetchError>>,
  panic_on_list: AtomicBool,
  list_calls: AtomicUsize,
  detail_calls: AtomicUsize,
}

impl FakeApi {
  pub fn set_page(&self, page: u32, filters: FilterSet, reply: ListReply) {
    let mut pages = self.pages.lock().unwrap();
    pages.retain(|(p, f, _)| !(*p == page && *f == filters));
    pages.push((page, filters, reply));
  }

  /// Script an unfiltered page.
  pub fn set_listing(&self, page: u32, entries: Vec<Entry>, total_pages: u32) {
    self.set_page(
      page,
      FilterSet::default(),
      Ok(list_response(entries, total_pages)),
    );
  }

  /// Hold the next list call for `filters` until the returned sender fires (or drops).
  pub fn hold(&self, filters: FilterSet) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.gates.lock().unwrap().push((filters, rx));
    tx
  }

  pub fn panic_on_list(&self) {
    self.panic_on_list.store(true, Ordering::SeqCst);
  }

  pub fn set_detail(&self, record: DetailRecord) {
    self.details.lock().unwrap().insert(record.id, record);
  }

  pub fn fail_details(&self, err: FetchError) {
    *self.detail_failure.lock().unwrap() = Some(err);
  }

  pub fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }

  pub fn detail_calls(&self) -> usize {
    self.detail_calls.load(Ordering::SeqCst)
  }
}

impl CatalogApi for FakeApi {
  async fn list(&self, page: u32, filters: &FilterSet) -> ListReply {
    self.list_calls.fetch_add(1, Ordering::SeqCst);

    let gate = {
      let mut gates = self.gates.lock().unwrap();
      gates
        .iter()
        .position(|(f, _)| f == filters)
        .map(|i| gates.remove(i).1)
    };
    if let Some(gate) = gate {
      let _ = gate.await;
    }

    if self.panic_on_list.load(Ordering::SeqCst) {
      panic!("scripted list failure");
    }

    let pages = self.pages.lock().unwrap();
    pages
      .iter()
      .find(|(p, f, _)| *p == page && f == filters)
      .map(|(_, _, reply)| reply.clone())
      .unwrap_or_else(|| Err(FetchError::NotFound(format!("page {}", page))))
  }

  async fn detail(&self, id: u32) -> Result<DetailRecord, FetchError> {
    self.detail_calls.fetch_add(1, Ordering::SeqCst);

    if let Some(err) = self.detail_failure.lock().unwrap().clone() {
      return Err(err);
    }

    self
      .details
      .lock()
      .unwrap()
      .get(&id)
      .cloned()
      .ok_or_else(|| FetchError::NotFound(format!("character {}", id)))
  }
}

/// Connectivity double that can be flipped at runtime.
pub struct FakeNetwork(AtomicBool);

impl FakeNetwork {
  pub fn online() -> Self {
    Self(AtomicBool::new(true))
  }

  pub fn offline() -> Self {
    Self(AtomicBool::new(false))
  }

  pub fn set(&self, connected: bool) {
    self.0.store(connected, Ordering::SeqCst);
  }
}

impl Connectivity for FakeNetwork {
  async fn is_connected(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }
}
