use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// List-view projection of a character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
  pub id: u32,
  pub name: String,
  pub status: String,
  pub species: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub gender: String,
  pub image_url: String,
}

/// Full per-character record, fetched on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
  pub id: u32,
  pub name: String,
  pub status: String,
  pub species: String,
  #[serde(rename = "type")]
  pub kind: String,
  pub gender: String,
  pub image_url: String,
  pub origin_name: String,
  pub location_name: String,
}

/// Query filters, doubling as the offline cache predicate.
///
/// Empty strings and absent values both mean "no constraint", for equality as well
/// as for query construction and matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSet {
  pub name: Option<String>,
  pub status: Option<String>,
  pub species: Option<String>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub gender: Option<String>,
}

fn normalize(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}

impl PartialEq for FilterSet {
  fn eq(&self, other: &Self) -> bool {
    self
      .fields()
      .iter()
      .zip(other.fields().iter())
      .all(|((_, a), (_, b))| a.filter(|v| !v.is_empty()) == b.filter(|v| !v.is_empty()))
  }
}

impl Eq for FilterSet {}

impl FilterSet {
  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = normalize(Some(name.into()));
    self
  }

  pub fn with_status(mut self, status: impl Into<String>) -> Self {
    self.status = normalize(Some(status.into()));
    self
  }

  pub fn with_species(mut self, species: impl Into<String>) -> Self {
    self.species = normalize(Some(species.into()));
    self
  }

  pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
    self.kind = normalize(Some(kind.into()));
    self
  }

  pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
    self.gender = normalize(Some(gender.into()));
    self
  }

  /// Same filters with empty-string fields turned into absent ones.
  pub fn normalized(self) -> Self {
    Self {
      name: normalize(self.name),
      status: normalize(self.status),
      species: normalize(self.species),
      kind: normalize(self.kind),
      gender: normalize(self.gender),
    }
  }

  /// True when no field constrains the query.
  pub fn is_empty(&self) -> bool {
    self.fields().iter().all(|(_, v)| v.map_or(true, str::is_empty))
  }

  /// Non-absent fields paired with their remote query parameter names.
  pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
    self
      .fields()
      .into_iter()
      .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
      .collect()
  }

  fn fields(&self) -> [(&'static str, Option<&str>); 5] {
    [
      ("name", self.name.as_deref()),
      ("status", self.status.as_deref()),
      ("species", self.species.as_deref()),
      ("type", self.kind.as_deref()),
      ("gender", self.gender.as_deref()),
    ]
  }

  /// Cache predicate: case-insensitive substring on name, case-insensitive
  /// exact match on the other fields.
  pub fn matches(&self, entry: &Entry) -> bool {
    let exact = |want: &Option<String>, have: &str| match want.as_deref() {
      None | Some("") => true,
      Some(w) => w.to_lowercase() == have.to_lowercase(),
    };

    let name_ok = match self.name.as_deref() {
      None | Some("") => true,
      Some(needle) => entry.name.to_lowercase().contains(&needle.to_lowercase()),
    };

    name_ok
      && exact(&self.status, &entry.status)
      && exact(&self.species, &entry.species)
      && exact(&self.kind, &entry.kind)
      && exact(&self.gender, &entry.gender)
  }
}

/// Where a page result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSource {
  /// Fresh data from the remote catalog
  Network,
  /// The remote catalog reported no match for the query
  NotFound,
  /// Local cache, used because the network was unavailable or failed
  Cache,
}

/// One page of entries plus the total page count for the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
  pub entries: Vec<Entry>,
  /// Authoritative only when `source` is `Network`
  pub total_pages: u32,
  pub source: PageSource,
}

impl PageResult {
  pub fn not_found() -> Self {
    Self {
      entries: Vec::new(),
      total_pages: 0,
      source: PageSource::NotFound,
    }
  }
}

/// Paging metadata returned alongside a remote page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
  pub count: u32,
  pub pages: u32,
  pub next: Option<String>,
  pub prev: Option<String>,
}

/// One remote page of entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
  pub entries: Vec<Entry>,
  pub info: PageInfo,
}

/// The most recent page fetch made by a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
  pub page: u32,
  pub filters: FilterSet,
  pub source: PageSource,
  pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(name: &str, status: &str, species: &str) -> Entry {
    Entry {
      id: 1,
      name: name.to_string(),
      status: status.to_string(),
      species: species.to_string(),
      kind: String::new(),
      gender: "Male".to_string(),
      image_url: String::new(),
    }
  }

  #[test]
  fn test_empty_string_equals_absent() {
    let empty = FilterSet {
      name: Some(String::new()),
      ..Default::default()
    };
    assert_eq!(empty, FilterSet::default());
    assert_eq!(empty.clone().normalized().name, None);
    assert!(empty.is_empty());
    assert!(empty.query_pairs().is_empty());
    assert_eq!(FilterSet::default().with_name(""), FilterSet::default());
  }

  #[test]
  fn test_query_pairs_skip_absent_fields() {
    let filters = FilterSet::default()
      .with_name("rick")
      .with_kind("Parasite")
      .with_gender("");
    assert_eq!(
      filters.query_pairs(),
      vec![("name", "rick"), ("type", "Parasite")]
    );
  }

  #[test]
  fn test_name_is_case_insensitive_substring() {
    let rick = entry("Rick Sanchez", "Alive", "Human");
    assert!(FilterSet::default().with_name("sanch").matches(&rick));
    assert!(FilterSet::default().with_name("RICK").matches(&rick));
    assert!(!FilterSet::default().with_name("morty").matches(&rick));
  }

  #[test]
  fn test_other_fields_are_case_insensitive_exact() {
    let rick = entry("Rick Sanchez", "Alive", "Human");
    assert!(FilterSet::default().with_status("alive").matches(&rick));
    assert!(!FilterSet::default().with_status("ali").matches(&rick));
    assert!(FilterSet::default()
      .with_status("ALIVE")
      .with_species("human")
      .matches(&rick));
    assert!(!FilterSet::default().with_species("Alien").matches(&rick));
  }

  #[test]
  fn test_empty_string_predicate_matches_everything() {
    let rick = entry("Rick Sanchez", "Alive", "Human");
    let raw = FilterSet {
      name: Some(String::new()),
      status: Some(String::new()),
      ..Default::default()
    };
    assert!(raw.matches(&rick));
    assert!(FilterSet::default().matches(&rick));
  }
}
