//! Crawler configuration
//!
//! Loaded from a TOML file or built from defaults, with CLI flags applied on
//! top by the binary. Every knob the crawl loop and HTTP client consult lives
//! here so a run is reproducible from its config file alone.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::crawler::PipelineConfig;
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub http: HttpConfig,
    pub pipeline: PipelineConfig,
}

/// Crawl scope, pacing, and output layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Root category listing URL (absolute)
    pub root_url: String,

    /// Directory holding frontier state files plus the output subdirectories
    pub output_dir: PathBuf,

    /// Stop once this many member pages have been discovered; negative means
    /// unbounded
    pub max_pages: i64,

    /// Stop once this many subcategories have been discovered; negative means
    /// unbounded
    pub max_categories: i64,

    /// Exact number of exploration iterations; `None` runs until the
    /// frontier is exhausted
    pub depth: Option<u64>,

    /// Base per-listing delay, multiplied by the iteration number
    pub listing_delay_ms: u64,

    /// Base post-iteration drain delay, multiplied by iteration + 1
    pub drain_delay_ms: u64,

    /// Pause while the page queue sits above its high-water mark
    pub queue_pause_secs: u64,

    /// Whether raw export XML is kept alongside the cleaned records
    pub keep_raw_exports: bool,
}

/// HTTP client behavior shared by the listing and export fetchers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Requests per second across all fetch workers
    pub requests_per_second: u32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Retry budget for transient failures before a fetch is abandoned
    pub max_retries: u32,

    /// Sleep after a 429 before the same URL is retried
    pub cooldown_secs: u64,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crawl: CrawlConfig::default(),
            http: HttpConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            root_url: "https://en.wikipedia.org/wiki/Category:Physics".to_string(),
            output_dir: PathBuf::from("data"),
            max_pages: -1,
            max_categories: -1,
            depth: None,
            listing_delay_ms: 1200,
            drain_delay_ms: 5000,
            queue_pause_secs: 10,
            keep_raw_exports: true,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            timeout_secs: 30,
            max_retries: 3,
            cooldown_secs: 30,
            user_agent: format!("wikiglean/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot drive a crawl
    pub fn validate(&self) -> Result<()> {
        if self.crawl.root_url.is_empty() {
            return Err(Error::Config("crawl.root_url must not be empty".into()));
        }
        if !self.crawl.root_url.starts_with("http") {
            return Err(Error::Config(format!(
                "crawl.root_url must be absolute, got {}",
                self.crawl.root_url
            )));
        }
        if self.http.requests_per_second == 0 {
            return Err(Error::Config(
                "http.requests_per_second must be at least 1".into(),
            ));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be at least 1".into()));
        }
        if self.pipeline.fetch_workers == 0
            || self.pipeline.extract_workers == 0
            || self.pipeline.transform_workers == 0
            || self.pipeline.article_writers == 0
        {
            return Err(Error::Config(
                "pipeline worker counts must be at least 1".into(),
            ));
        }
        if self.pipeline.page_queue_size == 0 || self.pipeline.stage_queue_size == 0 {
            return Err(Error::Config(
                "pipeline queue sizes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl CrawlConfig {
    /// Directory for cleaned article records
    pub fn text_dir(&self) -> PathBuf {
        self.output_dir.join("text_files")
    }

    /// Directory for raw export documents
    pub fn xml_dir(&self) -> PathBuf {
        self.output_dir.join("xml_files")
    }

    /// Throttle before fetching one listing URL in iteration `i`
    pub fn listing_delay(&self, iteration: u64) -> Duration {
        Duration::from_millis(self.listing_delay_ms * iteration)
    }

    /// Drain pause after iteration `i` completes
    pub fn drain_delay(&self, iteration: u64) -> Duration {
        Duration::from_millis(self.drain_delay_ms * (iteration + 1))
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_from_file_partial_override() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[crawl]
root_url = "https://en.wikipedia.org/wiki/Category:Linguistics"
max_pages = 500
depth = 3

[http]
requests_per_second = 5

[pipeline]
fetch_workers = 4
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(
            config.crawl.root_url,
            "https://en.wikipedia.org/wiki/Category:Linguistics"
        );
        assert_eq!(config.crawl.max_pages, 500);
        assert_eq!(config.crawl.depth, Some(3));
        assert_eq!(config.http.requests_per_second, 5);
        assert_eq!(config.pipeline.fetch_workers, 4);
        // Untouched fields keep their defaults.
        assert_eq!(config.crawl.max_categories, -1);
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.pipeline.article_writers, 5);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default();
        config.pipeline.fetch_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_root_url_rejected() {
        let config = Config {
            crawl: CrawlConfig {
                root_url: "/wiki/Category:Physics".to_string(),
                ..CrawlConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_rps_rejected() {
        let config = Config {
            http: HttpConfig {
                requests_per_second: 0,
                ..HttpConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delays_scale_with_iteration() {
        let crawl = CrawlConfig::default();
        assert_eq!(crawl.listing_delay(0), Duration::ZERO);
        assert_eq!(crawl.listing_delay(2), Duration::from_millis(2400));
        assert_eq!(crawl.drain_delay(0), Duration::from_millis(5000));
        assert_eq!(crawl.drain_delay(1), Duration::from_millis(10000));
    }
}
