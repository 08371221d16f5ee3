//! Crawling machinery: HTTP fetching, category exploration, and the
//! download-and-clean pipeline

pub mod explorer;
pub mod fetcher;
pub mod pipeline;

pub use explorer::CategoryExplorer;
pub use fetcher::WikiFetcher;
pub use pipeline::{Pipeline, PipelineConfig, PipelineStats, StatsSnapshot};
