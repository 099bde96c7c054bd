//! Character catalog: domain types, the remote client and the offline-first repository.

mod api_types;
mod client;
mod connectivity;
mod error;
mod repository;
mod types;

#[cfg(test)]
pub mod testing;

pub use client::{CatalogApi, HttpCatalogClient};
pub use connectivity::{Connectivity, NetworkOracle};
pub use error::{ErrorKind, FetchError};
pub use repository::CatalogRepository;
pub use types::{DetailRecord, Entry, FetchRecord, FilterSet, PageResult, PageSource};
