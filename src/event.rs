use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

/// Prompt events
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
  /// One line typed at the prompt
  Line(String),
  /// Input closed
  Eof,
}

/// Event handler that turns input lines into events from a background task
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn stdin() -> Self {
    Self::from_reader(BufReader::new(tokio::io::stdin()))
  }

  pub fn from_reader<R>(reader: R) -> Self
  where
    R: AsyncBufRead + Unpin + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
      let mut lines = reader.lines();
      loop {
        let event = match lines.next_line().await {
          Ok(Some(line)) => Event::Line(line),
          Ok(None) => Event::Eof,
          Err(e) => {
            warn!(error = %e, "failed to read input");
            Event::Eof
          }
        };
        let done = event == Event::Eof;
        if tx.send(event).is_err() || done {
          break;
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
