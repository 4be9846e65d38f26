//! Core data models for Newsdesk
//!
//! This module contains the data types shared by the story catalog client
//! and the quote gateway, along with re-exports of the clients themselves.

pub mod quotes;
pub mod stories;

pub use quotes::{AlphaVantageClient, QuoteApi, QuoteError, QuoteGateway};
pub use stories::{CatalogError, HnClient, StoryApi, StoryCatalog};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque story identifier assigned by the story provider
pub type StoryId = u64;

/// A story category recognized by the story provider
///
/// Unknown category names fall back to [`Category::Top`] when parsed, mirroring
/// the provider's default endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Top,
    New,
    Best,
    Ask,
    Show,
    Job,
}

impl Category {
    /// Parses a category name, falling back to `Top` for unrecognized input
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "new" => Category::New,
            "best" => Category::Best,
            "ask" => Category::Ask,
            "show" => Category::Show,
            "job" => Category::Job,
            _ => Category::Top,
        }
    }

    /// Short name used in cache keys and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Top => "top",
            Category::New => "new",
            Category::Best => "best",
            Category::Ask => "ask",
            Category::Show => "show",
            Category::Job => "job",
        }
    }

    /// Provider endpoint serving this category's id list
    pub fn endpoint(&self) -> &'static str {
        match self {
            Category::Top => "topstories",
            Category::New => "newstories",
            Category::Best => "beststories",
            Category::Ask => "askstories",
            Category::Show => "showstories",
            Category::Job => "jobstories",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single story record, immutable once fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Provider-assigned identifier
    pub id: StoryId,
    /// Story headline
    pub title: String,
    /// Username of the submitter
    pub author: String,
    /// Upvote score
    pub score: u32,
    /// Number of comments on the story
    pub comment_count: u32,
    /// When the story was submitted
    pub created_at: DateTime<Utc>,
    /// Link target; absent for discussion-only posts
    pub url: Option<String>,
}

/// A stock quote for a single symbol
///
/// Superseded wholesale (never merged) when refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol
    pub symbol: String,
    /// Last traded price
    pub price: f64,
    /// Absolute change since previous close
    pub change: f64,
    /// Percentage change since previous close
    pub change_percent: f64,
    /// When this data was fetched
    pub fetched_at: DateTime<Utc>,
}
