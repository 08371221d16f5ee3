use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use wikiglean::extractor::{category_namespace, extract_pages, main_namespace};
use wikiglean::storage::ArticleWriter;
use wikiglean::transform::transform_page;

/// Offline extraction: run already-downloaded export XML through the
/// extract and transform stages without touching the network
pub async fn extract(input: PathBuf, output: PathBuf, categories: bool) -> Result<()> {
    let writer = ArticleWriter::new(&output).context("Failed to create output directory")?;

    let files: Vec<PathBuf> = if input.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&input)
            .with_context(|| format!("Failed to read {}", input.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "xml"))
            .collect();
        files.sort_unstable();
        files
    } else {
        vec![input]
    };

    let mut written = 0usize;
    let mut skipped = 0usize;
    let mut dropped = 0usize;

    for file in &files {
        let outcome = process_file(file, &writer, categories)?;
        written += outcome.written;
        skipped += outcome.skipped;
        dropped += outcome.dropped;
    }

    println!("Extraction finished");
    println!("  Files processed:   {}", files.len());
    println!("  Articles written:  {written}");
    println!("  Already existed:   {skipped}");
    println!("  Redirects dropped: {dropped}");
    Ok(())
}

struct FileOutcome {
    written: usize,
    skipped: usize,
    dropped: usize,
}

fn process_file(path: &Path, writer: &ArticleWriter, categories: bool) -> Result<FileOutcome> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut outcome = FileOutcome {
        written: 0,
        skipped: 0,
        dropped: 0,
    };

    let ns_filter = if categories {
        category_namespace
    } else {
        main_namespace
    };
    let pages = match extract_pages(&content, "", ns_filter) {
        Ok(pages) => pages,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "Skipping malformed export");
            return Ok(outcome);
        }
    };

    for page in pages {
        match transform_page(page) {
            Some(article) => match writer.save(&article)? {
                Some(_) => outcome.written += 1,
                None => outcome.skipped += 1,
            },
            None => outcome.dropped += 1,
        }
    }

    Ok(outcome)
}
