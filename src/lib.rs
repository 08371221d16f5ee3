//! wikiglean - Wikipedia category-graph crawler and wikitext cleaner
//!
//! Walks a Wikipedia category graph breadth-first, downloads the export
//! document for every member page, strips the wikitext markup, and persists
//! one cleaned JSON record per article. Crawls are resumable: frontier state
//! lives in plain text files and every writer is idempotent.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration loading and validation
//! - [`crawler`] - Category exploration, rate-limited fetching, and the
//!   concurrent download pipeline
//! - [`extractor`] - Streaming page extraction from export XML
//! - [`wikitext`] - Markup cleaning and link indexing
//! - [`transform`] - Cleaned-article assembly and category extraction
//! - [`frontier`] - Durable crawl frontier state
//! - [`storage`] - Idempotent per-page output writers
//! - [`models`] - Core data structures and types
//!
//! # Example
//!
//! ```no_run
//! use wikiglean::config::Config;
//! use wikiglean::frontier::FrontierState;
//!
//! fn main() -> wikiglean::error::Result<()> {
//!     let config = Config::default();
//!     let state = FrontierState::load(&config.crawl.output_dir, &config.crawl.root_url)?;
//!     println!("{} listings outstanding", state.outstanding().len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod frontier;
pub mod models;
pub mod storage;
pub mod transform;
pub mod wikitext;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::crawler::{CategoryExplorer, Pipeline, PipelineConfig, WikiFetcher};
    pub use crate::error::{Error, FetchError, ParseError, Result};
    pub use crate::frontier::FrontierState;
    pub use crate::models::{CleanedArticle, ExportDocument, PageRef, ParsedPage};
    pub use crate::storage::{ArticleWriter, RawExportWriter};
}

// Direct re-exports for convenience
pub use models::{CleanedArticle, ExportDocument, PageRef, ParsedPage};
