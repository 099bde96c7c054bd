//! Point-in-time network reachability checks.

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

/// Reports whether the remote catalog is currently worth trying.
pub trait Connectivity: Send + Sync + 'static {
  fn is_connected(&self) -> impl Future<Output = bool> + Send;
}

/// Connectivity oracle used by the binary.
#[derive(Debug, Clone)]
pub enum NetworkOracle {
  /// Open a TCP connection to the API host and report whether it succeeded
  Probe {
    host: String,
    port: u16,
    timeout: Duration,
  },
  /// Always offline
  Offline,
}

impl NetworkOracle {
  /// Probe the host serving `base`. URLs without a host yield an always-offline oracle.
  pub fn probe(base: &Url, timeout: Duration) -> Self {
    match (base.host_str(), base.port_or_known_default()) {
      (Some(host), Some(port)) => NetworkOracle::Probe {
        host: host.to_string(),
        port,
        timeout,
      },
      _ => NetworkOracle::Offline,
    }
  }
}

impl Connectivity for NetworkOracle {
  async fn is_connected(&self) -> bool {
    match self {
      NetworkOracle::Offline => false,
      NetworkOracle::Probe {
        host,
        port,
        timeout,
      } => {
        let connected = matches!(
          tokio::time::timeout(*timeout, TcpStream::connect((host.as_str(), *port))).await,
          Ok(Ok(_))
        );
        debug!(%host, port, connected, "connectivity probe");
        connected
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::net::TcpListener;

  #[tokio::test]
  async fn test_offline_is_never_connected() {
    assert!(!NetworkOracle::Offline.is_connected().await);
  }

  #[tokio::test]
  async fn test_probe_reaches_listening_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let base = Url::parse(&format!("http://127.0.0.1:{}/api/", port)).unwrap();

    let oracle = NetworkOracle::probe(&base, Duration::from_millis(500));
    assert!(oracle.is_connected().await);
  }

  #[tokio::test]
  async fn test_probe_fails_on_closed_port() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let base = Url::parse(&format!("http://127.0.0.1:{}/api/", port)).unwrap();

    let oracle = NetworkOracle::probe(&base, Duration::from_millis(500));
    assert!(!oracle.is_connected().await);
  }

  #[test]
  fn test_default_https_port() {
    let base = Url::parse("https://rickandmortyapi.com/api/").unwrap();
    match NetworkOracle::probe(&base, Duration::from_secs(1)) {
      NetworkOracle::Probe { host, port, .. } => {
        assert_eq!(host, "rickandmortyapi.com");
        assert_eq!(port, 443);
      }
      NetworkOracle::Offline => panic!("expected a probe"),
    }
  }
}
