//! Book-metadata provider boundary
//!
//! `addBook` is the only caller. The production implementation queries the
//! Google Books volumes endpoint with a request timeout and retries
//! transient transport failures a bounded number of times before surfacing
//! `MetadataUnavailable`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::MetadataConfig,
    error::{AppError, AppResult},
    models::BookMetadata,
};

/// Port for external bibliographic lookups by ISBN
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// `Ok(None)` means the provider has no match for the ISBN
    async fn lookup(&self, isbn: i64) -> AppResult<Option<BookMetadata>>;
}

#[derive(Deserialize)]
struct VolumesResponse {
    items: Option<Vec<Volume>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    categories: Option<Vec<String>>,
    published_date: Option<String>,
    publisher: Option<String>,
    image_links: Option<ImageLinks>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ImageLinks {
    thumbnail: Option<String>,
}

impl From<VolumeInfo> for BookMetadata {
    fn from(info: VolumeInfo) -> Self {
        BookMetadata {
            title: info.title,
            authors: info.authors.unwrap_or_default(),
            categories: info.categories.unwrap_or_default(),
            published_date: info.published_date,
            publisher: info.publisher,
            thumbnail: info.image_links.and_then(|links| links.thumbnail),
        }
    }
}

/// Google Books client
#[derive(Clone)]
pub struct GoogleBooksProvider {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl GoogleBooksProvider {
    pub fn new(config: &MetadataConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            max_retries: config.max_retries,
        })
    }

    async fn fetch(&self, isbn: i64) -> Result<Option<BookMetadata>, reqwest::Error> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", format!("isbn:{}", isbn))])
            .send()
            .await?
            .error_for_status()?;

        let volumes: VolumesResponse = response.json().await?;
        Ok(volumes
            .items
            .and_then(|items| items.into_iter().next())
            .map(|volume| volume.volume_info.into()))
    }
}

#[async_trait]
impl MetadataProvider for GoogleBooksProvider {
    async fn lookup(&self, isbn: i64) -> AppResult<Option<BookMetadata>> {
        let mut attempt = 0;
        loop {
            match self.fetch(isbn).await {
                Ok(metadata) => return Ok(metadata),
                Err(e) if attempt < self.max_retries && (e.is_timeout() || e.is_connect()) => {
                    attempt += 1;
                    tracing::warn!(
                        "Metadata lookup for ISBN {} failed ({}), retry {}/{}",
                        isbn,
                        e,
                        attempt,
                        self.max_retries
                    );
                }
                Err(e) => {
                    tracing::warn!("Metadata lookup for ISBN {} failed: {}", isbn, e);
                    return Err(AppError::MetadataUnavailable(e.to_string()));
                }
            }
        }
    }
}
