//! Catalog store trait and SQLite implementation.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::Mutex;

use crate::catalog::{DetailRecord, Entry, FilterSet};

/// Summary of what the local cache currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub pages: u32,
  pub entries: u32,
  pub details: u32,
  pub oldest: Option<DateTime<Utc>>,
  pub newest: Option<DateTime<Utc>>,
}

/// Persistent, key-indexed store for catalog pages and detail records.
///
/// Pages are addressed by page number of the unfiltered listing. Implementations
/// serialize their own writes.
pub trait CatalogStore: Send + Sync + 'static {
  /// Insert or replace entries of a page, keeping their order.
  #[allow(dead_code)]
  fn insert_page(&self, page: u32, entries: &[Entry]) -> Result<()>;

  /// Remove every entry cached under a page.
  fn delete_page(&self, page: u32) -> Result<()>;

  /// Replace a page wholesale. Readers never observe a half-replaced page.
  fn replace_page(&self, page: u32, entries: &[Entry]) -> Result<()>;

  /// Entries of a page in their original order (empty when not cached).
  fn get_page(&self, page: u32) -> Result<Vec<Entry>>;

  /// Highest cached page number, if any page is cached.
  fn max_known_page(&self) -> Result<Option<u32>>;

  /// All cached entries matching `filters`, in page order.
  fn scan(&self, filters: &FilterSet) -> Result<Vec<Entry>>;

  fn get_detail(&self, id: u32) -> Result<Option<DetailRecord>>;

  fn put_detail(&self, record: &DetailRecord) -> Result<()>;

  fn stats(&self) -> Result<CacheStats>;

  /// Drop every cached page and detail record.
  fn clear(&self) -> Result<()>;
}

/// SQLite-based catalog store.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the store at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// A throwaway store that lives as long as the value.
  #[cfg(test)]
  pub fn in_memory() -> Result<Self> {
    let conn =
      Connection::open_in_memory().map_err(|e| eyre!("Failed to open in-memory cache: {}", e))?;
    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  /// Run `f` inside a transaction that commits only if `f` succeeds.
  fn in_transaction<T>(&self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;
    let value = f(&tx)?;
    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(value)
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- List entries of the unfiltered listing, addressed by page (stores serialized JSON)
CREATE TABLE IF NOT EXISTS page_entries (
    entry_id INTEGER PRIMARY KEY,
    page INTEGER NOT NULL,
    position INTEGER NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_page_entries_page
    ON page_entries(page, position);

-- Detail records, one per character id
CREATE TABLE IF NOT EXISTS detail_cache (
    id INTEGER PRIMARY KEY,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

fn delete_page_rows(tx: &Transaction, page: u32) -> Result<()> {
  tx.execute("DELETE FROM page_entries WHERE page = ?", params![page])
    .map_err(|e| eyre!("Failed to delete page {}: {}", page, e))?;
  Ok(())
}

fn insert_page_rows(tx: &Transaction, page: u32, entries: &[Entry]) -> Result<()> {
  let mut stmt = tx
    .prepare(
      "INSERT OR REPLACE INTO page_entries (entry_id, page, position, data, cached_at)
       VALUES (?, ?, ?, ?, datetime('now'))",
    )
    .map_err(|e| eyre!("Failed to prepare insert: {}", e))?;

  for (position, entry) in entries.iter().enumerate() {
    let data =
      serde_json::to_vec(entry).map_err(|e| eyre!("Failed to serialize entry: {}", e))?;
    stmt
      .execute(params![entry.id, page, position, data])
      .map_err(|e| eyre!("Failed to store entry {}: {}", entry.id, e))?;
  }

  Ok(())
}

fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Vec<u8>>) -> Result<Vec<T>> {
  rows
    .iter()
    .map(|data| {
      serde_json::from_slice(data).map_err(|e| eyre!("Failed to deserialize cached row: {}", e))
    })
    .collect()
}

impl CatalogStore for SqliteStorage {
  fn insert_page(&self, page: u32, entries: &[Entry]) -> Result<()> {
    self.in_transaction(|tx| insert_page_rows(tx, page, entries))
  }

  fn delete_page(&self, page: u32) -> Result<()> {
    self.in_transaction(|tx| delete_page_rows(tx, page))
  }

  fn replace_page(&self, page: u32, entries: &[Entry]) -> Result<()> {
    self.in_transaction(|tx| {
      delete_page_rows(tx, page)?;
      insert_page_rows(tx, page, entries)
    })
  }

  fn get_page(&self, page: u32) -> Result<Vec<Entry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data FROM page_entries WHERE page = ? ORDER BY position")
      .map_err(|e| eyre!("Failed to prepare page query: {}", e))?;

    let rows: Vec<Vec<u8>> = stmt
      .query_map(params![page], |row| row.get(0))
      .map_err(|e| eyre!("Failed to query page {}: {}", page, e))?
      .collect::<rusqlite::Result<_>>()
      .map_err(|e| eyre!("Failed to read page {}: {}", page, e))?;

    decode_rows(rows)
  }

  fn max_known_page(&self) -> Result<Option<u32>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row("SELECT MAX(page) FROM page_entries", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to query max page: {}", e))
  }

  fn scan(&self, filters: &FilterSet) -> Result<Vec<Entry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data FROM page_entries ORDER BY page, position")
      .map_err(|e| eyre!("Failed to prepare scan: {}", e))?;

    let rows: Vec<Vec<u8>> = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to scan entries: {}", e))?
      .collect::<rusqlite::Result<_>>()
      .map_err(|e| eyre!("Failed to read entries: {}", e))?;

    let entries: Vec<Entry> = decode_rows(rows)?;
    Ok(entries.into_iter().filter(|e| filters.matches(e)).collect())
  }

  fn get_detail(&self, id: u32) -> Result<Option<DetailRecord>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let data: Option<Vec<u8>> = conn
      .query_row(
        "SELECT data FROM detail_cache WHERE id = ?",
        params![id],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to query detail {}: {}", id, e))?;

    data
      .map(|d| {
        serde_json::from_slice(&d).map_err(|e| eyre!("Failed to deserialize detail {}: {}", id, e))
      })
      .transpose()
  }

  fn put_detail(&self, record: &DetailRecord) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let data =
      serde_json::to_vec(record).map_err(|e| eyre!("Failed to serialize detail: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO detail_cache (id, data, cached_at)
         VALUES (?, ?, datetime('now'))",
        params![record.id, data],
      )
      .map_err(|e| eyre!("Failed to store detail {}: {}", record.id, e))?;

    Ok(())
  }

  fn stats(&self) -> Result<CacheStats> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let (pages, entries, oldest, newest): (u32, u32, Option<String>, Option<String>) = conn
      .query_row(
        "SELECT COUNT(DISTINCT page), COUNT(*), MIN(cached_at), MAX(cached_at) FROM page_entries",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .map_err(|e| eyre!("Failed to query page stats: {}", e))?;

    let details: u32 = conn
      .query_row("SELECT COUNT(*) FROM detail_cache", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to query detail stats: {}", e))?;

    Ok(CacheStats {
      pages,
      entries,
      details,
      oldest: oldest.as_deref().map(parse_datetime).transpose()?,
      newest: newest.as_deref().map(parse_datetime).transpose()?,
    })
  }

  fn clear(&self) -> Result<()> {
    self.in_transaction(|tx| {
      tx.execute_batch("DELETE FROM page_entries; DELETE FROM detail_cache;")
        .map_err(|e| eyre!("Failed to clear cache: {}", e))
    })
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::testing::{detail, entry};

  #[test]
  fn test_page_roundtrip_preserves_order() {
    let store = SqliteStorage::in_memory().unwrap();
    let page = vec![entry(5, "Zeep"), entry(2, "Abradolf"), entry(9, "Morty")];

    store.insert_page(1, &page).unwrap();

    assert_eq!(store.get_page(1).unwrap(), page);
    assert!(store.get_page(2).unwrap().is_empty());
  }

  #[test]
  fn test_insert_page_twice_is_idempotent() {
    let store = SqliteStorage::in_memory().unwrap();
    let page = vec![entry(1, "Rick"), entry(2, "Morty")];

    store.insert_page(3, &page).unwrap();
    store.insert_page(3, &page).unwrap();

    assert_eq!(store.get_page(3).unwrap(), page);
  }

  #[test]
  fn test_replace_page_drops_leftover_rows() {
    let store = SqliteStorage::in_memory().unwrap();
    store
      .insert_page(1, &[entry(1, "Rick"), entry(2, "Morty"), entry(3, "Summer")])
      .unwrap();

    store.replace_page(1, &[entry(4, "Beth")]).unwrap();

    assert_eq!(store.get_page(1).unwrap(), vec![entry(4, "Beth")]);
  }

  #[test]
  fn test_delete_page_only_touches_that_page() {
    let store = SqliteStorage::in_memory().unwrap();
    store.insert_page(1, &[entry(1, "Rick")]).unwrap();
    store.insert_page(2, &[entry(21, "Jerry")]).unwrap();

    store.delete_page(1).unwrap();

    assert!(store.get_page(1).unwrap().is_empty());
    assert_eq!(store.get_page(2).unwrap().len(), 1);
  }

  #[test]
  fn test_max_known_page() {
    let store = SqliteStorage::in_memory().unwrap();
    assert_eq!(store.max_known_page().unwrap(), None);

    store.insert_page(1, &[entry(1, "Rick")]).unwrap();
    store.insert_page(7, &[entry(140, "Gazorpazorpfield")]).unwrap();

    assert_eq!(store.max_known_page().unwrap(), Some(7));
  }

  #[test]
  fn test_scan_applies_predicate_in_page_order() {
    let store = SqliteStorage::in_memory().unwrap();
    store
      .insert_page(2, &[entry(21, "Rick Prime"), entry(22, "Jerry")])
      .unwrap();
    store
      .insert_page(1, &[entry(1, "Rick Sanchez"), entry(2, "Morty")])
      .unwrap();

    let ricks = store.scan(&FilterSet::default().with_name("rick")).unwrap();
    let ids: Vec<u32> = ricks.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 21]);

    let blank = FilterSet {
      name: Some(String::new()),
      ..Default::default()
    };
    assert_eq!(store.scan(&blank).unwrap().len(), 4);
  }

  #[test]
  fn test_detail_roundtrip_and_overwrite() {
    let store = SqliteStorage::in_memory().unwrap();
    assert_eq!(store.get_detail(1).unwrap(), None);

    let mut rick = detail(1, "Rick Sanchez");
    store.put_detail(&rick).unwrap();
    assert_eq!(store.get_detail(1).unwrap(), Some(rick.clone()));

    rick.location_name = "Earth (Replacement Dimension)".into();
    store.put_detail(&rick).unwrap();
    assert_eq!(store.get_detail(1).unwrap(), Some(rick));
  }

  #[test]
  fn test_stats_and_clear() {
    let store = SqliteStorage::in_memory().unwrap();
    store
      .insert_page(1, &[entry(1, "Rick"), entry(2, "Morty")])
      .unwrap();
    store.insert_page(2, &[entry(21, "Jerry")]).unwrap();
    store.put_detail(&detail(1, "Rick")).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.pages, 2);
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.details, 1);
    assert!(stats.oldest.is_some());

    store.clear().unwrap();
    assert_eq!(store.stats().unwrap(), CacheStats::default());
  }

  #[test]
  fn test_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cache.db");
    let page = vec![entry(1, "Rick"), entry(2, "Morty")];

    {
      let store = SqliteStorage::open(&path).unwrap();
      store.replace_page(1, &page).unwrap();
      store.put_detail(&detail(2, "Morty")).unwrap();
    }

    let reopened = SqliteStorage::open(&path).unwrap();
    assert_eq!(reopened.get_page(1).unwrap(), page);
    assert_eq!(reopened.get_detail(2).unwrap(), Some(detail(2, "Morty")));
  }
}
