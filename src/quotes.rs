//! Live NSE quote fetching.
//!
//! The quote API refuses bare requests: a session first has to pick up
//! cookies by visiting the regular website pages with browser-like headers.
//! [`QuoteSession`] owns that state explicitly; there is no global client.
//! Transport decompression (gzip/brotli) is reqwest's concern, so the rest
//! of the program only ever sees clean [`Quote`] values.

use std::collections::HashMap;
use std::time::Duration;

use log::{info, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, REFERER, USER_AGENT};
use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://www.nseindia.com";

const REQUEST_TIMEOUT_SECS: u64 = 10;
// Deliberate pacing between symbol requests to stay under the rate limiter.
const INTER_REQUEST_PAUSE_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub last_price: f64,
    /// Percentage change since previous close; negative = price drop.
    pub pct_change: f64,
}

#[derive(Debug, Deserialize)]
struct QuotePayload {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(rename = "priceInfo")]
    price_info: Option<PriceInfo>,
}

#[derive(Debug, Deserialize)]
struct PriceInfo {
    #[serde(rename = "lastPrice")]
    last_price: f64,
    #[serde(rename = "pChange")]
    pct_change: f64,
}

impl QuotePayload {
    /// None for error payloads, missing price blocks, and non-positive
    /// prices — all treated as "no usable data for this symbol".
    fn into_quote(self) -> Option<Quote> {
        if self.error.is_some() {
            return None;
        }
        let info = self.price_info?;
        if info.last_price <= 0.0 {
            return None;
        }
        Some(Quote {
            last_price: info.last_price,
            pct_change: info.pct_change,
        })
    }
}

/// A cookie-primed NSE session scoped to one run.
pub struct QuoteSession {
    client: reqwest::Client,
    base_url: String,
}

impl QuoteSession {
    /// Build the client and prime its cookie jar by visiting the home page
    /// and the get-quotes page. Fails the run if either visit fails: without
    /// cookies every quote request would come back empty anyway.
    pub async fn acquire(base_url: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_store(true)
            .default_headers(browser_headers())
            .build()?;

        let session = QuoteSession {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        };

        session
            .client
            .get(&session.base_url)
            .send()
            .await?
            .error_for_status()?;
        session
            .client
            .get(format!("{}/get-quotes/equity", session.base_url))
            .send()
            .await?
            .error_for_status()?;

        info!("quote session acquired for {}", session.base_url);
        Ok(session)
    }

    /// Fetch quotes for each symbol in turn. Symbols that fail for any
    /// reason (transport, bad payload, bad price) are logged and simply
    /// absent from the result; the caller never sees a partial failure.
    pub async fn fetch_snapshots(&self, symbols: &[String]) -> HashMap<String, Quote> {
        let mut quotes = HashMap::new();

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(INTER_REQUEST_PAUSE_MS)).await;
            }

            match self.fetch_one(symbol).await {
                Ok(Some(quote)) => {
                    quotes.insert(symbol.clone(), quote);
                }
                Ok(None) => warn!("no usable price data for {symbol}, skipping"),
                Err(e) => warn!("quote fetch failed for {symbol}: {e}"),
            }
        }

        quotes
    }

    async fn fetch_one(&self, symbol: &str) -> Result<Option<Quote>, reqwest::Error> {
        let url = format!("{}/api/quote-equity?symbol={}", self.base_url, symbol);
        // The API checks that the Referer matches the symbol being quoted.
        let referer = format!("{}/get-quotes/equity?symbol={}", self.base_url, symbol);

        let payload: QuotePayload = self
            .client
            .get(&url)
            .header(REFERER, referer)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(payload.into_quote())
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        REFERER,
        HeaderValue::from_static("https://www.nseindia.com/get-quotes/equity"),
    );
    headers.insert(
        "X-Requested-With",
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers
}
