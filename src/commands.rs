//! Browse prompt commands, name resolution and argument parsing.

use thiserror::Error;

use crate::catalog::FilterSet;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "next",
    aliases: &["n", "more"],
    usage: "next",
    description: "Load the next page",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    usage: "refresh",
    description: "Reload from page 1",
  },
  Command {
    name: "search",
    aliases: &["s", "/"],
    usage: "search <text>",
    description: "Filter by name (empty text clears it)",
  },
  Command {
    name: "filter",
    aliases: &["f"],
    usage: "filter key=value ...",
    description: "Set name, status, species, type or gender",
  },
  Command {
    name: "clear",
    aliases: &["c", "reset"],
    usage: "clear",
    description: "Drop all filters",
  },
  Command {
    name: "open",
    aliases: &["o", "show"],
    usage: "open <id>",
    description: "Show one character",
  },
  Command {
    name: "close",
    aliases: &["back"],
    usage: "close",
    description: "Leave the character view",
  },
  Command {
    name: "anchor",
    aliases: &["a", "scroll"],
    usage: "anchor <index> <offset>",
    description: "Remember the scroll position",
  },
  Command {
    name: "state",
    aliases: &["st", "info"],
    usage: "state",
    description: "Print the session state",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "List commands",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Save the session and exit",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// A filter field addressable from the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
  Name,
  Status,
  Species,
  Kind,
  Gender,
}

impl FilterField {
  fn parse(key: &str) -> Option<Self> {
    match key.to_lowercase().as_str() {
      "name" => Some(FilterField::Name),
      "status" => Some(FilterField::Status),
      "species" => Some(FilterField::Species),
      "type" | "kind" => Some(FilterField::Kind),
      "gender" => Some(FilterField::Gender),
      _ => None,
    }
  }

  /// Set this field on `filters`; an empty value clears it.
  pub fn apply(self, filters: FilterSet, value: &str) -> FilterSet {
    match self {
      FilterField::Name => filters.with_name(value),
      FilterField::Status => filters.with_status(value),
      FilterField::Species => filters.with_species(value),
      FilterField::Kind => filters.with_kind(value),
      FilterField::Gender => filters.with_gender(value),
    }
  }
}

/// A fully parsed prompt line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Next,
  Refresh,
  Search(String),
  Filter(Vec<(FilterField, String)>),
  Clear,
  Open(u32),
  Close,
  Anchor { index: u32, offset: u32 },
  State,
  Help,
  Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
  #[error("Unknown command: {0}")]
  Unknown(String),

  #[error("Usage: {0}")]
  Usage(&'static str),

  #[error("Unknown filter field: {0} (expected name, status, species, type or gender)")]
  UnknownField(String),
}

/// Parse one prompt line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Action>, CommandError> {
  let line = line.trim();
  let (word, rest) = match line.split_once(char::is_whitespace) {
    Some((word, rest)) => (word, rest.trim()),
    None => (line, ""),
  };
  if word.is_empty() {
    return Ok(None);
  }

  let cmd = get_suggestions(word)
    .into_iter()
    .next()
    .ok_or_else(|| CommandError::Unknown(word.to_string()))?;

  let action = match cmd.name {
    "next" => Action::Next,
    "refresh" => Action::Refresh,
    "search" => Action::Search(rest.to_string()),
    "filter" => Action::Filter(parse_assignments(rest, cmd.usage)?),
    "clear" => Action::Clear,
    "open" => Action::Open(rest.parse().map_err(|_| CommandError::Usage(cmd.usage))?),
    "close" => Action::Close,
    "anchor" => {
      let mut numbers = rest.split_whitespace().map(str::parse::<u32>);
      match (numbers.next(), numbers.next(), numbers.next()) {
        (Some(Ok(index)), Some(Ok(offset)), None) => Action::Anchor { index, offset },
        (Some(Ok(index)), None, None) => Action::Anchor { index, offset: 0 },
        _ => return Err(CommandError::Usage(cmd.usage)),
      }
    }
    "state" => Action::State,
    "help" => Action::Help,
    _ => Action::Quit,
  };

  Ok(Some(action))
}

fn parse_assignments(
  rest: &str,
  usage: &'static str,
) -> Result<Vec<(FilterField, String)>, CommandError> {
  if rest.is_empty() {
    return Err(CommandError::Usage(usage));
  }

  rest
    .split_whitespace()
    .map(|pair| -> Result<(FilterField, String), CommandError> {
      let (key, value) = pair.split_once('=').ok_or(CommandError::Usage(usage))?;
      let field =
        FilterField::parse(key).ok_or_else(|| CommandError::UnknownField(key.to_string()))?;
      Ok((field, value.to_string()))
    })
    .collect()
}
