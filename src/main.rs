use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wikiglean::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "wikiglean",
    version,
    about = "Wikipedia category-graph crawler with wikitext cleaning",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a category graph and write cleaned article records
    Crawl {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root category listing URL
        #[arg(short, long)]
        root_url: Option<String>,

        /// Output directory for state and article files
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exact number of exploration iterations
        #[arg(short, long)]
        depth: Option<u64>,

        /// Stop after this many pages have been discovered
        #[arg(long)]
        max_pages: Option<i64>,

        /// Stop after this many subcategories have been discovered
        #[arg(long)]
        max_categories: Option<i64>,

        /// Skip archiving raw export XML
        #[arg(long, default_value = "false")]
        no_raw: bool,
    },

    /// Re-run extraction and cleaning over already-downloaded export XML
    Extract {
        /// Export XML file or directory of .xml files
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for cleaned article records
        #[arg(short, long, default_value = "text_files")]
        output: PathBuf,

        /// Process category pages (namespace 14) instead of main articles
        #[arg(long, default_value = "false")]
        categories: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    tracing::info!("wikiglean starting");

    match cli.command {
        Commands::Crawl {
            config,
            root_url,
            output,
            depth,
            max_pages,
            max_categories,
            no_raw,
        } => {
            let mut config = match config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            };
            if let Some(root_url) = root_url {
                config.crawl.root_url = root_url;
            }
            if let Some(output) = output {
                config.crawl.output_dir = output;
            }
            if let Some(depth) = depth {
                config.crawl.depth = Some(depth);
            }
            if let Some(max_pages) = max_pages {
                config.crawl.max_pages = max_pages;
            }
            if let Some(max_categories) = max_categories {
                config.crawl.max_categories = max_categories;
            }
            if no_raw {
                config.crawl.keep_raw_exports = false;
            }
            config.validate()?;

            tracing::info!(
                root_url = %config.crawl.root_url,
                output = %config.crawl.output_dir.display(),
                depth = ?config.crawl.depth,
                "Starting crawl command"
            );
            commands::crawl(config).await?;
        }

        Commands::Extract {
            input,
            output,
            categories,
        } => {
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                categories = %categories,
                "Starting extract command"
            );
            commands::extract(input, output, categories).await?;
        }
    }

    tracing::info!("wikiglean completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("wikiglean=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("wikiglean=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
