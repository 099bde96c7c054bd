use serde::{Deserialize, Serialize};

use crate::catalog::{Entry, FilterSet, PageSource};

/// First visible row and its pixel offset, as reported by the presentation layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollAnchor {
  pub index: u32,
  pub offset: u32,
}

/// Coarse lifecycle of a browse session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  /// Nothing loaded yet
  Idle,
  /// A page load is in flight
  Loading,
  /// Last load produced data (or an explicit "no results")
  Settled,
  /// Last load left nothing to show because the network was unavailable
  Error,
}

/// Externally observable state of a browse session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseState {
  pub accumulated_entries: Vec<Entry>,
  pub current_page: u32,
  pub total_pages: u32,
  pub filters: FilterSet,
  pub search_query: String,
  pub is_initial_loading: bool,
  pub is_refreshing: bool,
  pub is_loading_next_page: bool,
  pub has_network_error: bool,
  pub can_load_more: bool,
  pub scroll_anchor: ScrollAnchor,
  /// Where the most recently applied page came from
  pub last_source: Option<PageSource>,
}

impl Default for BrowseState {
  fn default() -> Self {
    Self {
      accumulated_entries: Vec::new(),
      current_page: 1,
      total_pages: 1,
      filters: FilterSet::default(),
      search_query: String::new(),
      is_initial_loading: false,
      is_refreshing: false,
      is_loading_next_page: false,
      has_network_error: false,
      can_load_more: false,
      scroll_anchor: ScrollAnchor::default(),
      last_source: None,
    }
  }
}

impl BrowseState {
  pub fn is_loading(&self) -> bool {
    self.is_initial_loading || self.is_refreshing || self.is_loading_next_page
  }

  /// The query legitimately matched nothing, as opposed to a network failure.
  pub fn is_empty_result(&self) -> bool {
    !self.is_loading()
      && !self.has_network_error
      && self.total_pages == 0
      && self.accumulated_entries.is_empty()
  }

  /// True when the shown entries came from the local cache rather than the network.
  pub fn is_offline(&self) -> bool {
    self.last_source == Some(PageSource::Cache)
  }

  pub fn phase(&self) -> Phase {
    if self.is_loading() {
      Phase::Loading
    } else if self.has_network_error {
      Phase::Error
    } else if self.last_source.is_some() {
      Phase::Settled
    } else {
      Phase::Idle
    }
  }

  pub(super) fn clear_flags(&mut self) {
    self.is_initial_loading = false;
    self.is_refreshing = false;
    self.is_loading_next_page = false;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_is_idle_first_page() {
    let state = BrowseState::default();
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.current_page, 1);
    assert!(!state.can_load_more);
    assert!(!state.is_empty_result());
  }

  #[test]
  fn test_empty_result_differs_from_network_error() {
    let no_match = BrowseState {
      total_pages: 0,
      last_source: Some(PageSource::NotFound),
      ..Default::default()
    };
    assert!(no_match.is_empty_result());
    assert_eq!(no_match.phase(), Phase::Settled);

    let offline = BrowseState {
      has_network_error: true,
      last_source: Some(PageSource::Cache),
      ..Default::default()
    };
    assert!(!offline.is_empty_result());
    assert_eq!(offline.phase(), Phase::Error);
    assert!(offline.is_offline());
  }

  #[test]
  fn test_clear_flags() {
    let mut state = BrowseState {
      is_initial_loading: true,
      is_refreshing: true,
      is_loading_next_page: true,
      ..Default::default()
    };
    assert_eq!(state.phase(), Phase::Loading);

    state.clear_flags();
    assert!(!state.is_loading());
  }
}
