//! Concurrent download-and-clean pipeline
//!
//! Four stages connected by bounded channels: fetch export documents,
//! extract page records from the XML, transform them into cleaned articles,
//! and persist. Raw documents additionally fan out to an archive sink.
//! Worker pools share a stage's receiver through an `Arc<Mutex<Receiver>>`.
//!
//! Shutdown is cooperative and flows with the data: when the explorer drops
//! the page sender, fetch workers drain the queue and exit, their senders
//! drop, and closure propagates stage by stage until the writers finish.
//! Nothing is polled and nothing in flight is lost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::crawler::fetcher::WikiFetcher;
use crate::error::Result;
use crate::extractor::{extract_pages, main_namespace};
use crate::models::{CleanedArticle, ExportDocument, PageRef, ParsedPage};
use crate::storage::{ArticleWriter, RawExportWriter};
use crate::transform::transform_page;

const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Worker pool sizes and queue bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch_workers: usize,
    pub extract_workers: usize,
    pub transform_workers: usize,
    pub raw_writers: usize,
    pub article_writers: usize,
    /// Bound of the page queue feeding the fetch stage
    pub page_queue_size: usize,
    /// Bound of every internal stage queue
    pub stage_queue_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_workers: 12,
            extract_workers: 1,
            transform_workers: 2,
            raw_writers: 5,
            article_writers: 5,
            page_queue_size: 100_000,
            stage_queue_size: 5_000,
        }
    }
}

/// Shared counters incremented by the stage workers
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub pages_fetched: AtomicU64,
    pub bytes_fetched: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub pages_extracted: AtomicU64,
    pub redirects_dropped: AtomicU64,
    pub articles_written: AtomicU64,
    pub raw_written: AtomicU64,
    pub skipped_existing: AtomicU64,
}

/// Point-in-time copy of the pipeline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub pages_fetched: u64,
    pub bytes_fetched: u64,
    pub fetch_failures: u64,
    pub pages_extracted: u64,
    pub redirects_dropped: u64,
    pub articles_written: u64,
    pub raw_written: u64,
    pub skipped_existing: u64,
}

impl PipelineStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            bytes_fetched: self.bytes_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            pages_extracted: self.pages_extracted.load(Ordering::Relaxed),
            redirects_dropped: self.redirects_dropped.load(Ordering::Relaxed),
            articles_written: self.articles_written.load(Ordering::Relaxed),
            raw_written: self.raw_written.load(Ordering::Relaxed),
            skipped_existing: self.skipped_existing.load(Ordering::Relaxed),
        }
    }
}

/// The download-and-clean pipeline, everything downstream of the explorer
pub struct Pipeline {
    fetcher: Arc<WikiFetcher>,
    config: PipelineConfig,
    article_writer: Arc<ArticleWriter>,
    raw_writer: Option<Arc<RawExportWriter>>,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<WikiFetcher>,
        config: PipelineConfig,
        article_writer: ArticleWriter,
        raw_writer: Option<RawExportWriter>,
    ) -> Self {
        Self {
            fetcher,
            config,
            article_writer: Arc::new(article_writer),
            raw_writer: raw_writer.map(Arc::new),
            stats: Arc::new(PipelineStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Create the page queue the explorer feeds
    pub fn page_channel(&self) -> (mpsc::Sender<PageRef>, mpsc::Receiver<PageRef>) {
        mpsc::channel(self.config.page_queue_size)
    }

    /// Run every stage to completion
    ///
    /// Returns once the page channel has closed and all in-flight work has
    /// drained through the writers.
    pub async fn run(self, page_rx: mpsc::Receiver<PageRef>) -> Result<StatsSnapshot> {
        let queue = self.config.stage_queue_size;
        let (doc_tx, doc_rx) = mpsc::channel::<ExportDocument>(queue);
        let (parsed_tx, parsed_rx) = mpsc::channel::<ParsedPage>(queue);
        let (article_tx, article_rx) = mpsc::channel::<CleanedArticle>(queue);

        let raw_channel = self
            .raw_writer
            .as_ref()
            .map(|_| mpsc::channel::<ExportDocument>(queue));
        let (raw_tx, raw_rx) = match raw_channel {
            Some((tx, rx)) => (Some(tx), Some(rx)),
            None => (None, None),
        };

        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        let page_rx = Arc::new(Mutex::new(page_rx));
        for id in 0..self.config.fetch_workers {
            handles.push(spawn_fetch_worker(
                id,
                Arc::clone(&page_rx),
                Arc::clone(&self.fetcher),
                doc_tx.clone(),
                raw_tx.clone(),
                Arc::clone(&self.stats),
            ));
        }
        drop(doc_tx);
        drop(raw_tx);

        let doc_rx = Arc::new(Mutex::new(doc_rx));
        for id in 0..self.config.extract_workers {
            handles.push(spawn_extract_worker(
                id,
                Arc::clone(&doc_rx),
                parsed_tx.clone(),
                Arc::clone(&self.stats),
            ));
        }
        drop(parsed_tx);

        let parsed_rx = Arc::new(Mutex::new(parsed_rx));
        for id in 0..self.config.transform_workers {
            handles.push(spawn_transform_worker(
                id,
                Arc::clone(&parsed_rx),
                article_tx.clone(),
                Arc::clone(&self.stats),
            ));
        }
        drop(article_tx);

        if let (Some(raw_rx), Some(writer)) = (raw_rx, self.raw_writer.as_ref()) {
            let raw_rx = Arc::new(Mutex::new(raw_rx));
            for id in 0..self.config.raw_writers {
                handles.push(spawn_raw_writer(
                    id,
                    Arc::clone(&raw_rx),
                    Arc::clone(writer),
                    Arc::clone(&self.stats),
                ));
            }
        }

        let article_rx = Arc::new(Mutex::new(article_rx));
        for id in 0..self.config.article_writers {
            handles.push(spawn_article_writer(
                id,
                Arc::clone(&article_rx),
                Arc::clone(&self.article_writer),
                Arc::clone(&self.stats),
            ));
        }

        let status = spawn_status_task(Arc::clone(&self.stats));

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Pipeline worker panicked");
            }
        }
        status.abort();

        let snapshot = self.stats.snapshot();
        tracing::info!(
            fetched = snapshot.pages_fetched,
            bytes = snapshot.bytes_fetched,
            extracted = snapshot.pages_extracted,
            written = snapshot.articles_written,
            redirects = snapshot.redirects_dropped,
            failures = snapshot.fetch_failures,
            "Pipeline drained"
        );
        Ok(snapshot)
    }
}

fn spawn_fetch_worker(
    id: usize,
    page_rx: Arc<Mutex<mpsc::Receiver<PageRef>>>,
    fetcher: Arc<WikiFetcher>,
    doc_tx: mpsc::Sender<ExportDocument>,
    raw_tx: Option<mpsc::Sender<ExportDocument>>,
    stats: Arc<PipelineStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let page = { page_rx.lock().await.recv().await };
            let Some(page) = page else { break };

            match fetcher.fetch_export(&page).await {
                Ok(doc) => {
                    stats.pages_fetched.fetch_add(1, Ordering::Relaxed);
                    stats
                        .bytes_fetched
                        .fetch_add(doc.content.len() as u64, Ordering::Relaxed);
                    if let Some(raw) = &raw_tx {
                        if raw.send(doc.clone()).await.is_err() {
                            break;
                        }
                    }
                    if doc_tx.send(doc).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(page = %page.name, error = %e, "Abandoning page fetch");
                }
            }
        }
        tracing::debug!(worker = id, "Fetch worker exiting");
    })
}

fn spawn_extract_worker(
    id: usize,
    doc_rx: Arc<Mutex<mpsc::Receiver<ExportDocument>>>,
    parsed_tx: mpsc::Sender<ParsedPage>,
    stats: Arc<PipelineStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let doc = { doc_rx.lock().await.recv().await };
            let Some(doc) = doc else { break };

            match extract_pages(&doc.content, &doc.source_link, main_namespace) {
                Ok(pages) => {
                    for page in pages {
                        stats.pages_extracted.fetch_add(1, Ordering::Relaxed);
                        if parsed_tx.send(page).await.is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(page = %doc.page_name, error = %e, "Malformed export");
                }
            }
        }
        tracing::debug!(worker = id, "Extract worker exiting");
    })
}

fn spawn_transform_worker(
    id: usize,
    parsed_rx: Arc<Mutex<mpsc::Receiver<ParsedPage>>>,
    article_tx: mpsc::Sender<CleanedArticle>,
    stats: Arc<PipelineStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let page = { parsed_rx.lock().await.recv().await };
            let Some(page) = page else { break };

            match transform_page(page) {
                Some(article) => {
                    if article_tx.send(article).await.is_err() {
                        break;
                    }
                }
                None => {
                    stats.redirects_dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        tracing::debug!(worker = id, "Transform worker exiting");
    })
}

fn spawn_raw_writer(
    id: usize,
    raw_rx: Arc<Mutex<mpsc::Receiver<ExportDocument>>>,
    writer: Arc<RawExportWriter>,
    stats: Arc<PipelineStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let doc = { raw_rx.lock().await.recv().await };
            let Some(doc) = doc else { break };

            match writer.save(&doc.page_name, &doc.content) {
                Ok(Some(_)) => {
                    stats.raw_written.fetch_add(1, Ordering::Relaxed);
                }
                Ok(None) => {
                    stats.skipped_existing.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::error!(page = %doc.page_name, error = %e, "Raw write failed");
                }
            }
        }
        tracing::debug!(worker = id, "Raw writer exiting");
    })
}

fn spawn_article_writer(
    id: usize,
    article_rx: Arc<Mutex<mpsc::Receiver<CleanedArticle>>>,
    writer: Arc<ArticleWriter>,
    stats: Arc<PipelineStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let article = { article_rx.lock().await.recv().await };
            let Some(article) = article else { break };

            match writer.save(&article) {
                Ok(Some(_)) => {
                    stats.articles_written.fetch_add(1, Ordering::Relaxed);
                }
                Ok(None) => {
                    stats.skipped_existing.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    tracing::error!(page = %article.page, error = %e, "Article write failed");
                }
            }
        }
        tracing::debug!(worker = id, "Article writer exiting");
    })
}

fn spawn_status_task(stats: Arc<PipelineStats>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STATUS_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let s = stats.snapshot();
            tracing::info!(
                fetched = s.pages_fetched,
                extracted = s.pages_extracted,
                written = s.articles_written,
                failures = s.fetch_failures,
                "Pipeline status"
            );
        }
    })
}
