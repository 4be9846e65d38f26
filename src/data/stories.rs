//! Hacker News story catalog client
//!
//! This module resolves story categories to ordered id lists, fetches story
//! details for a requested pagination window with bounded concurrency, and
//! caches both layers. Individual detail failures degrade to partial results
//! and never abort a batch.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::{Category, Story, StoryId};
use crate::cache::TtlCache;

/// Base URL for the Hacker News Firebase API
const HACKER_NEWS_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Concurrency guard applied when fetching story details for a window
const DETAIL_CONCURRENCY: usize = 8;

/// How long id lists and story pages stay fresh
fn catalog_ttl() -> Duration {
    Duration::minutes(5)
}

/// Errors that can occur when fetching catalog data
///
/// `Clone` so that concurrent cache waiters can share one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// HTTP transport failure
    #[error("story request failed: {0}")]
    Network(String),

    /// Response body could not be interpreted
    #[error("unexpected story payload: {0}")]
    Payload(String),

    /// The provider has no item for this id
    #[error("story {0} does not exist")]
    NotFound(StoryId),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Payload(err.to_string())
    }
}

/// Transport seam for the story provider
#[async_trait]
pub trait StoryApi: Send + Sync {
    /// Returns the full ordered id list for a category
    async fn story_ids(&self, category: Category) -> Result<Vec<StoryId>, CatalogError>;

    /// Returns the detail record for a single story
    async fn story(&self, id: StoryId) -> Result<Story, CatalogError>;
}

/// Raw item payload from the story provider
///
/// Most fields are optional on the wire: job posts have no comment count and
/// discussion posts have no url.
#[derive(Debug, Deserialize)]
struct RawItem {
    id: StoryId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    by: Option<String>,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    descendants: Option<u32>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    time: Option<DateTime<Utc>>,
    #[serde(default)]
    url: Option<String>,
}

impl From<RawItem> for Story {
    fn from(item: RawItem) -> Self {
        Story {
            id: item.id,
            title: item.title.unwrap_or_default(),
            author: item.by.unwrap_or_default(),
            score: item.score.unwrap_or(0),
            comment_count: item.descendants.unwrap_or(0),
            created_at: item.time.unwrap_or_default(),
            url: item.url,
        }
    }
}

/// HTTP client for the Hacker News API
#[derive(Debug, Clone)]
pub struct HnClient {
    client: Client,
    base_url: String,
}

impl Default for HnClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl HnClient {
    /// Creates a client using the production base URL
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: HACKER_NEWS_BASE_URL.to_string(),
        }
    }

    /// Overrides the base URL, for pointing at a test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl StoryApi for HnClient {
    async fn story_ids(&self, category: Category) -> Result<Vec<StoryId>, CatalogError> {
        let url = format!("{}/{}.json", self.base_url, category.endpoint());
        let response = self.client.get(&url).send().await?;
        let text = response.text().await?;
        let ids: Vec<StoryId> = serde_json::from_str(&text)?;
        Ok(ids)
    }

    async fn story(&self, id: StoryId) -> Result<Story, CatalogError> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        let response = self.client.get(&url).send().await?;
        let text = response.text().await?;
        // The provider answers `null` for ids it does not know.
        let item: Option<RawItem> = serde_json::from_str(&text)?;
        let item = item.ok_or(CatalogError::NotFound(id))?;
        Ok(item.into())
    }
}

/// Paginated, cached story catalog
///
/// Wraps a [`StoryApi`] with two TTL caches (id lists and assembled pages)
/// and windowed detail fetching. All operations degrade rather than fail: a
/// whole-operation failure is logged and returned as an empty sequence, and
/// an offset at or past the end of a category's id list yields an empty
/// sequence, which callers use as the pagination-exhausted signal.
#[derive(Clone)]
pub struct StoryCatalog {
    api: Arc<dyn StoryApi>,
    ids_cache: TtlCache<Vec<StoryId>, CatalogError>,
    page_cache: TtlCache<Vec<Story>, CatalogError>,
    concurrency: usize,
}

impl StoryCatalog {
    /// Creates a catalog over the given transport with default settings
    pub fn new(api: Arc<dyn StoryApi>) -> Self {
        Self {
            api,
            ids_cache: TtlCache::new(catalog_ttl()),
            page_cache: TtlCache::new(catalog_ttl()),
            concurrency: DETAIL_CONCURRENCY,
        }
    }

    /// Overrides the detail-fetch concurrency (clamped to at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Cached id-list lookup; failures propagate and are never cached
    async fn category_ids(&self, category: Category) -> Result<Vec<StoryId>, CatalogError> {
        let key = format!("{}_ids", category.as_str());
        let api = Arc::clone(&self.api);
        self.ids_cache
            .get_or_compute(&key, move || async move { api.story_ids(category).await })
            .await
    }

    /// Returns the full ordered id list for a category
    ///
    /// Any failure is logged and degrades to an empty sequence.
    pub async fn fetch_category_ids(&self, category: Category) -> Vec<StoryId> {
        match self.category_ids(category).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(category = %category, error = %err, "failed to fetch story id list");
                Vec::new()
            }
        }
    }

    /// Fetches detail records for `ids`, preserving input order
    ///
    /// Details are fetched through a bounded concurrent stream. Ids that fail
    /// to resolve are logged and dropped; the surviving records keep the
    /// original relative order.
    pub async fn fetch_stories_by_ids(&self, ids: &[StoryId]) -> Vec<Story> {
        let fetches = ids.iter().copied().map(|id| {
            let api = Arc::clone(&self.api);
            async move { (id, api.story(id).await) }
        });

        futures::stream::iter(fetches)
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(story) => Some(story),
                Err(err) => {
                    warn!(id, error = %err, "dropping story that failed to resolve");
                    None
                }
            })
            .collect()
    }

    /// Fetches the window `[offset, offset + limit)` of a category's stories
    ///
    /// Pages are cached under `"{category}_{offset}_{limit}"`. On a miss the
    /// id list is resolved first (from its own cache), the window sliced out
    /// of it, and details fetched in parallel. If the id list itself cannot
    /// be fetched the page is not cached, the error is logged, and an empty
    /// sequence is returned so the next call retries.
    pub async fn fetch_stories(
        &self,
        category: Category,
        limit: usize,
        offset: usize,
    ) -> Vec<Story> {
        let key = format!("{}_{}_{}", category.as_str(), offset, limit);
        let catalog = self.clone();
        let result = self
            .page_cache
            .get_or_compute(&key, move || async move {
                let ids = catalog.category_ids(category).await?;
                let window: Vec<StoryId> = ids.into_iter().skip(offset).take(limit).collect();
                Ok(catalog.fetch_stories_by_ids(&window).await)
            })
            .await;

        match result {
            Ok(stories) => stories,
            Err(err) => {
                warn!(
                    category = %category,
                    limit,
                    offset,
                    error = %err,
                    "failed to fetch story page"
                );
                Vec::new()
            }
        }
    }
}
