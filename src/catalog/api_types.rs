//! Serde-deserializable types matching the character API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use super::types::{DetailRecord, Entry, ListResponse, PageInfo};

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct ApiLocation {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiInfo {
  #[serde(default)]
  pub count: u32,
  #[serde(default)]
  pub pages: u32,
  pub next: Option<String>,
  pub prev: Option<String>,
}

// ============================================================================
// Character - used by both the list and the detail endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiCharacter {
  pub id: u32,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub species: String,
  #[serde(rename = "type", default)]
  pub kind: String,
  #[serde(default)]
  pub gender: String,
  #[serde(default)]
  pub image: String,
  #[serde(default)]
  pub origin: ApiLocation,
  #[serde(default)]
  pub location: ApiLocation,
}

// ============================================================================
// List endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiListResponse {
  pub info: ApiInfo,
  #[serde(default)]
  pub results: Vec<ApiCharacter>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiCharacter {
  pub fn into_entry(self) -> Entry {
    Entry {
      id: self.id,
      name: self.name,
      status: self.status,
      species: self.species,
      kind: self.kind,
      gender: self.gender,
      image_url: self.image,
    }
  }

  pub fn into_detail(self) -> DetailRecord {
    DetailRecord {
      id: self.id,
      name: self.name,
      status: self.status,
      species: self.species,
      kind: self.kind,
      gender: self.gender,
      image_url: self.image,
      origin_name: self.origin.name,
      location_name: self.location.name,
    }
  }
}

impl From<ApiListResponse> for ListResponse {
  fn from(resp: ApiListResponse) -> Self {
    ListResponse {
      entries: resp
        .results
        .into_iter()
        .map(ApiCharacter::into_entry)
        .collect(),
      info: PageInfo {
        count: resp.info.count,
        pages: resp.info.pages,
        next: resp.info.next,
        prev: resp.info.prev,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const LIST_JSON: &str = r#"{
    "info": {"count": 826, "pages": 42, "next": "https://rickandmortyapi.com/api/character/?page=2", "prev": null},
    "results": [
      {"id": 1, "name": "Rick Sanchez", "status": "Alive", "species": "Human", "type": "", "gender": "Male",
       "origin": {"name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1"},
       "location": {"name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3"},
       "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
       "episode": ["https://rickandmortyapi.com/api/episode/1"],
       "url": "https://rickandmortyapi.com/api/character/1", "created": "2017-11-04T18:48:46.250Z"},
      {"id": 2, "name": "Morty Smith", "status": "Alive", "species": "Human", "type": "", "gender": "Male",
       "origin": {"name": "unknown", "url": ""}, "location": {"name": "Citadel of Ricks", "url": ""},
       "image": "https://rickandmortyapi.com/api/character/avatar/2.jpeg"}
    ]
  }"#;

  #[test]
  fn test_parse_list_response() {
    let resp: ApiListResponse = serde_json::from_str(LIST_JSON).expect("list JSON should parse");
    let list = ListResponse::from(resp);

    assert_eq!(list.info.pages, 42);
    assert_eq!(list.info.count, 826);
    assert!(list.info.next.is_some());
    assert!(list.info.prev.is_none());
    assert_eq!(list.entries.len(), 2);
    assert_eq!(list.entries[0].name, "Rick Sanchez");
    assert_eq!(
      list.entries[1].image_url,
      "https://rickandmortyapi.com/api/character/avatar/2.jpeg"
    );
  }

  #[test]
  fn test_parse_detail_response() {
    let json = r#"{"id": 183, "name": "Johnny Depp", "status": "Alive", "species": "Human",
      "type": "", "gender": "Male", "origin": {"name": "Earth (C-500A)", "url": ""},
      "location": {"name": "Earth (C-500A)", "url": ""},
      "image": "https://rickandmortyapi.com/api/character/avatar/183.jpeg"}"#;

    let detail = serde_json::from_str::<ApiCharacter>(json)
      .expect("detail JSON should parse")
      .into_detail();

    assert_eq!(detail.id, 183);
    assert_eq!(detail.origin_name, "Earth (C-500A)");
    assert_eq!(detail.location_name, "Earth (C-500A)");
  }

  #[test]
  fn test_missing_locations_default_to_empty() {
    let json = r#"{"id": 7, "name": "Abradolf Lincler"}"#;
    let detail = serde_json::from_str::<ApiCharacter>(json)
      .expect("sparse JSON should parse")
      .into_detail();
    assert_eq!(detail.origin_name, "");
    assert_eq!(detail.kind, "");
  }
}
