//! Plain-text rendering of catalog data for the command line.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::cache::CacheStats;
use crate::catalog::{
  DetailRecord, Entry, ErrorKind, FetchRecord, FilterSet, PageResult, PageSource,
};
use crate::commands::COMMANDS;
use crate::session::{BrowseState, DetailState, Phase};

pub fn entry_line(entry: &Entry) -> String {
  let mut traits = vec![entry.status.as_str(), entry.species.as_str()];
  if !entry.kind.is_empty() {
    traits.push(entry.kind.as_str());
  }
  traits.push(entry.gender.as_str());

  format!("{:>5}  {}  ({})", entry.id, entry.name, traits.join(", "))
}

fn source_label(source: PageSource) -> &'static str {
  match source {
    PageSource::Network => "live",
    PageSource::NotFound => "no match",
    PageSource::Cache => "offline cache",
  }
}

fn filters_label(filters: &FilterSet) -> String {
  let pairs = filters.query_pairs();
  if pairs.is_empty() {
    return "none".to_string();
  }
  pairs
    .iter()
    .map(|(key, value)| format!("{}={}", key, value))
    .collect::<Vec<_>>()
    .join(" ")
}

/// One page as printed by `rmdex list`.
pub fn page_block(page: u32, result: &PageResult) -> String {
  let mut out = String::new();
  for entry in &result.entries {
    let _ = writeln!(out, "{}", entry_line(entry));
  }
  if result.source == PageSource::NotFound {
    let _ = writeln!(out, "No characters match.");
  } else if result.entries.is_empty() {
    let _ = writeln!(out, "Nothing cached for this page.");
  }
  let _ = write!(
    out,
    "page {}/{} [{}]",
    page,
    result.total_pages,
    source_label(result.source)
  );
  out
}

/// Compact status line of a browse session.
pub fn state_line(state: &BrowseState) -> String {
  let activity = if state.is_initial_loading {
    "loading"
  } else if state.is_refreshing {
    "refreshing"
  } else if state.is_loading_next_page {
    "loading next page"
  } else {
    match state.phase() {
      Phase::Idle => "idle",
      Phase::Error => "network unavailable",
      Phase::Settled if state.is_empty_result() => "no match",
      Phase::Settled if state.can_load_more => "more available",
      _ => "end of list",
    }
  };

  let mut line = format!(
    "page {}/{} | {} entries | filters: {} | {}",
    state.current_page,
    state.total_pages,
    state.accumulated_entries.len(),
    filters_label(&state.filters),
    activity
  );
  if !state.search_query.is_empty() {
    let _ = write!(line, " | search: \"{}\"", state.search_query);
  }
  if state.is_offline() {
    line.push_str(" | offline");
  }
  line
}

/// Where the latest page came from, e.g. for the `state` prompt command.
pub fn fetch_line(record: &FetchRecord) -> String {
  format!(
    "last fetch: page {} (filters: {}) from {} at {}",
    record.page,
    filters_label(&record.filters),
    source_label(record.source),
    timestamp(Some(record.at))
  )
}

pub fn detail_block(record: &DetailRecord) -> String {
  let kind = if record.kind.is_empty() {
    "-"
  } else {
    record.kind.as_str()
  };

  format!(
    "#{} {}\n  status:   {}\n  species:  {}\n  type:     {}\n  gender:   {}\n  origin:   {}\n  location: {}\n  image:    {}",
    record.id,
    record.name,
    record.status,
    record.species,
    kind,
    record.gender,
    record.origin_name,
    record.location_name,
    record.image_url
  )
}

pub fn detail_state(state: &DetailState) -> Option<String> {
  match state {
    DetailState::Idle => None,
    DetailState::Loading(id) => Some(format!("loading #{}...", id)),
    DetailState::Loaded(record) => Some(detail_block(record)),
    DetailState::Failed { kind, message } => Some(match kind {
      ErrorKind::NotFound => "No such character.".to_string(),
      ErrorKind::Connectivity => format!("Offline and not cached: {}", message),
      _ => format!("Could not load character: {}", message),
    }),
  }
}

fn timestamp(at: Option<DateTime<Utc>>) -> String {
  at.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    .unwrap_or_else(|| "-".to_string())
}

pub fn stats_block(stats: &CacheStats) -> String {
  format!(
    "pages:   {}\nentries: {}\ndetails: {}\noldest:  {}\nnewest:  {}",
    stats.pages,
    stats.entries,
    stats.details,
    timestamp(stats.oldest),
    timestamp(stats.newest)
  )
}

pub fn help_text() -> String {
  let width = COMMANDS.iter().map(|c| c.usage.len()).max().unwrap_or(0);
  COMMANDS
    .iter()
    .map(|c| {
      format!(
        "  {:width$}  {} [{}]",
        c.usage,
        c.description,
        c.aliases.join(", "),
        width = width
      )
    })
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::testing::{detail, entry};

  #[test]
  fn test_entry_line_skips_empty_type() {
    let mut e = entry(1, "Rick Sanchez");
    assert_eq!(entry_line(&e), "    1  Rick Sanchez  (Alive, Human, Male)");

    e.kind = "Genetic experiment".to_string();
    assert!(entry_line(&e).contains("Human, Genetic experiment, Male"));
  }

  #[test]
  fn test_state_line() {
    let state = BrowseState {
      accumulated_entries: vec![entry(1, "Rick"), entry(2, "Morty")],
      current_page: 1,
      total_pages: 3,
      can_load_more: true,
      filters: FilterSet::default().with_status("alive"),
      last_source: Some(PageSource::Cache),
      ..Default::default()
    };

    assert_eq!(
      state_line(&state),
      "page 1/3 | 2 entries | filters: status=alive | more available | offline"
    );
  }

  #[test]
  fn test_fetch_line() {
    let record = FetchRecord {
      page: 4,
      filters: FilterSet::default(),
      source: PageSource::Network,
      at: "2024-05-01T12:00:00Z".parse().unwrap(),
    };
    assert_eq!(
      fetch_line(&record),
      "last fetch: page 4 (filters: none) from live at 2024-05-01 12:00:00 UTC"
    );
  }

  #[test]
  fn test_page_block_not_found() {
    let out = page_block(1, &PageResult::not_found());
    assert!(out.contains("No characters match."));
    assert!(out.ends_with("page 1/0 [no match]"));
  }

  #[test]
  fn test_detail_state_messages() {
    assert_eq!(detail_state(&DetailState::Idle), None);

    let loaded = detail_state(&DetailState::Loaded(detail(1, "Rick Sanchez"))).unwrap();
    assert!(loaded.starts_with("#1 Rick Sanchez"));
    assert!(loaded.contains("origin:   Earth (C-137)"));

    let failed = DetailState::Failed {
      kind: ErrorKind::NotFound,
      message: "Not found: character 9".to_string(),
    };
    assert_eq!(detail_state(&failed).unwrap(), "No such character.");
  }

  #[test]
  fn test_help_lists_every_command() {
    let help = help_text();
    for cmd in COMMANDS {
      assert!(help.contains(cmd.description));
    }
  }
}
