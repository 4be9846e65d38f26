//! Rate-limited Alpha Vantage quote gateway
//!
//! This module fetches stock quotes through a single serialized request
//! queue so that all callers share one provider rate budget. Quotes are
//! cached per symbol; cache hits bypass the queue entirely. Multi-symbol
//! requests are processed sequentially and tolerate per-symbol failures.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::Quote;
use crate::cache::TtlCache;
use crate::limiter::RateLimiter;

/// Base URL for the Alpha Vantage API
const ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";

/// Minimum spacing between provider requests
///
/// The free tier allows 5 requests per minute; 12 seconds between requests
/// stays inside that budget.
pub const MIN_REQUEST_INTERVAL: StdDuration = StdDuration::from_millis(12_000);

/// How long a fetched quote stays fresh
fn quote_ttl() -> Duration {
    Duration::minutes(5)
}

/// Errors that can occur when fetching quotes
///
/// `Clone` so that concurrent cache waiters can share one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// HTTP transport failure or unreachable request queue
    #[error("quote request failed: {0}")]
    Network(String),

    /// The provider reported that the request budget is exhausted
    #[error("quote provider rate limit exceeded")]
    RateLimited,

    /// No API key was configured in the environment
    #[error("quote provider API key is not configured")]
    MissingApiKey,

    /// The provider answered without usable quote data
    #[error("no quote data available: {0}")]
    NoData(String),
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        QuoteError::Network(err.to_string())
    }
}

/// Transport seam for the quote provider
#[async_trait]
pub trait QuoteApi: Send + Sync {
    /// Fetches and classifies the current quote for one symbol
    async fn global_quote(&self, symbol: &str) -> Result<Quote, QuoteError>;
}

/// HTTP client for the Alpha Vantage GLOBAL_QUOTE endpoint
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AlphaVantageClient {
    /// Creates a client using the production base URL
    ///
    /// A missing `api_key` is not an error here; it surfaces per request as
    /// [`QuoteError::MissingApiKey`] so the process never crashes over
    /// configuration.
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: ALPHA_VANTAGE_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Overrides the base URL, for pointing at a test server
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl QuoteApi for AlphaVantageClient {
    async fn global_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let api_key = self.api_key.as_deref().ok_or(QuoteError::MissingApiKey)?;
        let url = format!(
            "{}/query?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            self.base_url, symbol, api_key
        );

        debug!(symbol, "requesting quote from provider");
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let text = response.text().await?;
        let payload: Value =
            serde_json::from_str(&text).map_err(|err| QuoteError::NoData(err.to_string()))?;

        parse_global_quote(symbol, &payload)
    }
}

/// Classifies a raw provider payload into a quote or a typed failure
///
/// The provider multiplexes outcomes over response shape: a `"Note"`
/// mentioning call frequency means throttling, an `"Error Message"` means an
/// unusable request (for example an unknown symbol), and only a non-empty
/// `"Global Quote"` object carries data.
fn parse_global_quote(symbol: &str, payload: &Value) -> Result<Quote, QuoteError> {
    if let Some(note) = payload.get("Note").and_then(Value::as_str) {
        if note.contains("call frequency") {
            return Err(QuoteError::RateLimited);
        }
    }

    if let Some(message) = payload.get("Error Message").and_then(Value::as_str) {
        return Err(QuoteError::NoData(message.to_string()));
    }

    let fields = payload
        .get("Global Quote")
        .and_then(Value::as_object)
        .filter(|fields| !fields.is_empty())
        .ok_or_else(|| QuoteError::NoData(format!("no quote data for {symbol}")))?;

    let reported_symbol = fields
        .get("01. symbol")
        .and_then(Value::as_str)
        .unwrap_or(symbol);
    let price = numeric_field(fields, "05. price")?;
    let change = numeric_field(fields, "09. change")?;
    let change_percent = fields
        .get("10. change percent")
        .and_then(Value::as_str)
        .map(|raw| raw.trim_end_matches('%'))
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(|| {
            QuoteError::NoData("missing or malformed field '10. change percent'".to_string())
        })?;

    Ok(Quote {
        symbol: reported_symbol.to_string(),
        price,
        change,
        change_percent,
        fetched_at: Utc::now(),
    })
}

/// Extracts a stringly-typed numeric field from a quote object
fn numeric_field(fields: &Map<String, Value>, name: &str) -> Result<f64, QuoteError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(|| QuoteError::NoData(format!("missing or malformed field '{name}'")))
}

/// Cached, rate-limited quote gateway
///
/// One gateway owns one request queue and one per-symbol cache; construct it
/// once at startup and share it. Cache hits return immediately without
/// touching the queue, so only genuine provider calls consume the budget.
pub struct QuoteGateway {
    api: Arc<dyn QuoteApi>,
    limiter: RateLimiter,
    cache: TtlCache<Quote, QuoteError>,
}

impl QuoteGateway {
    /// Creates a gateway with the provider's 5-requests-per-minute budget
    pub fn new(api: Arc<dyn QuoteApi>) -> Self {
        Self::with_min_interval(api, MIN_REQUEST_INTERVAL)
    }

    /// Creates a gateway with a custom request spacing
    pub fn with_min_interval(api: Arc<dyn QuoteApi>, min_interval: StdDuration) -> Self {
        Self {
            api,
            limiter: RateLimiter::new(min_interval),
            cache: TtlCache::new(quote_ttl()),
        }
    }

    /// Fetches the quote for one symbol
    ///
    /// A valid cache entry is returned without enqueueing anything. On a
    /// miss the provider call runs through the serialized queue and only a
    /// successful quote is cached; rate-limit, configuration, and no-data
    /// failures stay uncached so the next call retries.
    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let key = format!("quote_{symbol}");
        let api = Arc::clone(&self.api);
        let limiter = self.limiter.clone();
        let symbol = symbol.to_string();

        self.cache
            .get_or_compute(&key, move || async move {
                match limiter
                    .run(async move { api.global_quote(&symbol).await })
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(closed) => Err(QuoteError::Network(closed.to_string())),
                }
            })
            .await
    }

    /// Fetches quotes for several symbols, tolerating per-symbol failures
    ///
    /// Symbols are processed strictly sequentially to respect the single
    /// shared budget. A failed symbol is logged and omitted; the result
    /// keeps the request order minus omissions and the operation itself
    /// never fails.
    pub async fn fetch_quotes(&self, symbols: &[String]) -> Vec<Quote> {
        let mut quotes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.fetch_quote(symbol).await {
                Ok(quote) => quotes.push(quote),
                Err(err) => {
                    warn!(symbol = %symbol, error = %err, "skipping symbol after failed quote fetch");
                }
            }
        }
        quotes
    }
}
