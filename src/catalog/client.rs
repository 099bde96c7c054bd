use std::future::Future;

use color_eyre::{eyre::eyre, Result};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::Config;

use super::api_types::{ApiCharacter, ApiListResponse};
use super::error::FetchError;
use super::types::{DetailRecord, FilterSet, ListResponse};

/// Remote source of catalog pages and detail records.
pub trait CatalogApi: Send + Sync + 'static {
  /// Fetch one page of entries matching `filters`.
  fn list(
    &self,
    page: u32,
    filters: &FilterSet,
  ) -> impl Future<Output = Result<ListResponse, FetchError>> + Send;

  /// Fetch the detail record of a single character.
  fn detail(&self, id: u32) -> impl Future<Output = Result<DetailRecord, FetchError>> + Send;
}

/// HTTP client for the character API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpCatalogClient {
  client: Client,
  base: Url,
}

impl HttpCatalogClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base = parse_base_url(&config.api.url)?;

    let client = Client::builder()
      .timeout(config.api.timeout())
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn list_url(&self, page: u32, filters: &FilterSet) -> Result<Url, FetchError> {
    let mut url = self
      .base
      .join("character/")
      .map_err(invalid_url)?;
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("page", &page.to_string());
      for (key, value) in filters.query_pairs() {
        query.append_pair(key, value);
      }
    }
    Ok(url)
  }

  fn detail_url(&self, id: u32) -> Result<Url, FetchError> {
    self
      .base
      .join(&format!("character/{}", id))
      .map_err(invalid_url)
  }

  async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, FetchError> {
    debug!(%url, "GET");
    let response = self.client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(FetchError::from_status(status, &body));
    }

    Ok(response.bytes().await?.to_vec())
  }
}

impl CatalogApi for HttpCatalogClient {
  async fn list(&self, page: u32, filters: &FilterSet) -> Result<ListResponse, FetchError> {
    let url = self.list_url(page, filters)?;
    let body = self.get_bytes(url).await?;
    let response: ApiListResponse = serde_json::from_slice(&body)?;
    Ok(response.into())
  }

  async fn detail(&self, id: u32) -> Result<DetailRecord, FetchError> {
    let url = self.detail_url(id)?;
    let body = self.get_bytes(url).await?;
    let character: ApiCharacter = serde_json::from_slice(&body)?;
    Ok(character.into_detail())
  }
}

fn invalid_url(err: url::ParseError) -> FetchError {
  FetchError::Decode(format!("Invalid request URL: {}", err))
}

/// Parse the configured API root, making sure relative joins stay beneath it.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut url = Url::parse(raw).map_err(|e| eyre!("Invalid API URL '{}': {}", raw, e))?;
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}
