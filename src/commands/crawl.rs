use anyhow::{Context, Result};
use std::sync::Arc;
use url::Url;

use wikiglean::config::Config;
use wikiglean::crawler::{CategoryExplorer, Pipeline, WikiFetcher};
use wikiglean::frontier::FrontierState;
use wikiglean::models::ExplorerReport;
use wikiglean::storage::{self, ArticleWriter, RawExportWriter};

pub async fn crawl(config: Config) -> Result<()> {
    println!("Starting category crawl");
    println!("=======================");
    println!("  Root:   {}", config.crawl.root_url);
    println!("  Output: {}", config.crawl.output_dir.display());

    std::fs::create_dir_all(&config.crawl.output_dir)
        .context("Failed to create output directory")?;

    let root = Url::parse(&config.crawl.root_url).context("Invalid root URL")?;
    let base = root.origin().ascii_serialization();

    let completed = storage::completed_pages(&config.crawl.text_dir())
        .context("Failed to scan existing output")?;
    let mut state = FrontierState::load(&config.crawl.output_dir, &config.crawl.root_url)
        .context("Failed to load frontier state")?;

    let fetcher = Arc::new(WikiFetcher::new(&base, &config.http)?);
    let article_writer = ArticleWriter::new(&config.crawl.text_dir())?;
    let raw_writer = if config.crawl.keep_raw_exports {
        Some(RawExportWriter::new(&config.crawl.xml_dir())?)
    } else {
        None
    };

    let pipeline = Pipeline::new(
        Arc::clone(&fetcher),
        config.pipeline.clone(),
        article_writer,
        raw_writer,
    );
    let (page_tx, page_rx) = pipeline.page_channel();
    let explorer = CategoryExplorer::new(fetcher, config.crawl.clone(), completed, page_tx);

    let pipeline_task = tokio::spawn(pipeline.run(page_rx));

    // The explorer owns the only page sender. Whether it finishes on its own
    // or the future is dropped on Ctrl-C, the channel closes and the
    // pipeline drains whatever is in flight before exiting.
    let report = tokio::select! {
        report = explorer.run(&mut state) => report?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received, stopping exploration and draining pipeline");
            ExplorerReport::default()
        }
    };

    let stats = pipeline_task
        .await
        .context("Pipeline task panicked")??;
    state.flush().context("Failed to flush frontier state")?;

    println!("\nCrawl finished");
    println!("  Iterations:        {}", report.iterations);
    println!("  Limit tripped:     {}", report.limit_tripped);
    println!("  Categories known:  {}", state.category_names.len());
    println!("  Pages discovered:  {}", state.page_names.len());
    println!("  Pages fetched:     {}", stats.pages_fetched);
    println!("  Articles written:  {}", stats.articles_written);
    println!("  Redirects dropped: {}", stats.redirects_dropped);
    println!("  Fetch failures:    {}", stats.fetch_failures);
    Ok(())
}
