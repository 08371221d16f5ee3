//! Rate-limited HTTP fetching for listings and export documents
//!
//! One shared [`reqwest::Client`] and one process-wide governor rate limiter
//! serve every fetch worker. Export fetches retry transient failures with
//! exponential backoff up to a configured budget; listing fetches instead
//! surface the outcome so the exploration loop can decide whether the URL
//! counts as done.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;

use crate::config::HttpConfig;
use crate::error::{FetchError, Result};
use crate::models::{ExportDocument, PageRef};

const EXPORT_PATH: &str = "/wiki/Special:Export/";
const BACKOFF_BASE_MS: u64 = 500;

/// Outcome of fetching one category listing URL
#[derive(Debug)]
pub enum ListingFetch {
    /// 200: the HTML body, ready for parsing
    Body(String),
    /// 429: back off and retry this URL in a later iteration
    RateLimited,
    /// Any other terminal status: the URL yields no data and is done
    Gone(u16),
}

/// HTTP fetcher shared by the explorer and the page-download workers
pub struct WikiFetcher {
    client: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    base_url: String,
    max_retries: u32,
    cooldown: Duration,
}

impl WikiFetcher {
    /// Build a fetcher from HTTP config; `base_url` is the wiki origin
    /// (e.g. `https://en.wikipedia.org`)
    pub fn new(base_url: &str, config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()?;

        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            limiter,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            cooldown: config.cooldown(),
        })
    }

    /// Export URL for a page name (spaces become underscores per MediaWiki
    /// convention)
    pub fn export_url(&self, page_name: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            EXPORT_PATH,
            page_name.replace(' ', "_")
        )
    }

    /// Resolve a possibly path-relative listing link against the wiki origin
    pub fn absolute_url(&self, link: &str) -> String {
        if link.starts_with("http") {
            link.to_string()
        } else {
            format!("{}{}", self.base_url, link)
        }
    }

    /// Fetch the export document for one page, retrying failures until the
    /// budget runs out
    ///
    /// 429 responses sleep the configured cooldown before counting against
    /// the retry budget; every other non-200 status and transport errors
    /// back off exponentially. The page layer deliberately does not
    /// distinguish a permanent 404 from a transient failure; only the
    /// category layer makes that call.
    pub async fn fetch_export(&self, page: &PageRef) -> Result<ExportDocument> {
        let url = self.export_url(&page.name);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(BACKOFF_BASE_MS * (1 << attempt));
                tracing::debug!(page = %page.name, attempt, ?backoff, "Retrying export fetch");
                tokio::time::sleep(backoff).await;
            }

            self.limiter.until_ready().await;

            let response = match self.client.get(&url).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(page = %page.name, error = %e, "Export request failed");
                    continue;
                }
            };

            match response.status() {
                StatusCode::OK => {
                    let content = response.bytes().await.map_err(FetchError::Http)?;
                    return Ok(ExportDocument {
                        page_name: page.name.clone(),
                        source_link: page.link.clone(),
                        content,
                    });
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    tracing::warn!(page = %page.name, "Rate limited on export, cooling down");
                    tokio::time::sleep(self.cooldown).await;
                }
                status => {
                    tracing::warn!(page = %page.name, status = %status, "Export fetch failed");
                }
            }
        }

        Err(FetchError::MaxRetriesExceeded.into())
    }

    /// Fetch one category listing page without retrying
    ///
    /// Transport errors bubble up as `Err`; HTTP statuses map onto
    /// [`ListingFetch`] so the caller decides whether the URL is done.
    pub async fn fetch_listing(&self, url: &str) -> Result<ListingFetch> {
        self.limiter.until_ready().await;

        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::OK => Ok(ListingFetch::Body(response.text().await?)),
            StatusCode::TOO_MANY_REQUESTS => Ok(ListingFetch::RateLimited),
            status => {
                tracing::warn!(url, status = %status, "Listing unavailable");
                Ok(ListingFetch::Gone(status.as_u16()))
            }
        }
    }

    /// Cooldown to observe after a [`ListingFetch::RateLimited`]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
