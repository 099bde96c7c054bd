use thiserror::Error;

/// Failure of a single remote catalog call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  #[error("Nothing found: {0}")]
  NotFound(String),

  #[error("Unauthorized (status {0})")]
  Unauthorized(u16),

  #[error("Request rejected with status {0}")]
  Client(u16),

  #[error("Server error (status {0})")]
  Server(u16),

  #[error("Network error: {0}")]
  Transport(String),

  #[error("Invalid response: {0}")]
  Decode(String),
}

/// Coarse classification used to decide between empty results, cache fallback
/// and user-visible errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Connectivity,
  ServerOrDecode,
  Unclassified,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl FetchError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      FetchError::NotFound(_) => ErrorKind::NotFound,
      FetchError::Transport(_) => ErrorKind::Connectivity,
      FetchError::Server(_) | FetchError::Decode(_) => ErrorKind::ServerOrDecode,
      FetchError::Unauthorized(_) | FetchError::Client(_) => ErrorKind::Unclassified,
    }
  }

  pub fn is_not_found(&self) -> bool {
    self.kind() == ErrorKind::NotFound
  }

  pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
    match status.as_u16() {
      404 => FetchError::NotFound(truncate_body(body)),
      code @ (401 | 403) => FetchError::Unauthorized(code),
      code @ 500..=599 => FetchError::Server(code),
      code => FetchError::Client(code),
    }
  }
}

impl From<reqwest::Error> for FetchError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      FetchError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
      FetchError::from_status(status, "")
    } else {
      FetchError::Transport(err.to_string())
    }
  }
}

impl From<serde_json::Error> for FetchError {
  fn from(err: serde_json::Error) -> Self {
    FetchError::Decode(err.to_string())
  }
}

fn truncate_body(body: &str) -> String {
  if body.len() <= MAX_ERROR_BODY_LENGTH {
    return body.to_string();
  }
  let mut end = MAX_ERROR_BODY_LENGTH;
  while !body.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}... ({} bytes)", &body[..end], body.len())
}
