//! Durable frontier state for resumable crawling
//!
//! Five sets back the crawl graph: category names, category links, done
//! links, page names, page links. The outstanding work set is always
//! `category_links − done_links`, and `done_links` only ever grows. The sets
//! are owned exclusively by the explorer/driver; concurrent stages report
//! discoveries back as [`ListingDiscovery`] values which the driver merges.
//!
//! Each flush rewrites every file wholesale (one entry per line), so a crash
//! mid-flush can lose the latest iteration but can never leave stale
//! duplicate lines behind.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::ListingDiscovery;

const CATEGORY_NAMES_FILE: &str = "category_names.txt";
const CATEGORY_LINKS_FILE: &str = "category_links.txt";
const DONE_LINKS_FILE: &str = "done_links.txt";
const PAGE_NAMES_FILE: &str = "page_names.txt";
const PAGE_LINKS_FILE: &str = "page_links.txt";

/// The five durable crawl sets plus the directory they persist to
#[derive(Debug)]
pub struct FrontierState {
    dir: PathBuf,

    /// Subcategory display names seen so far
    pub category_names: HashSet<String>,

    /// Category links known so far (canonical form: absolute for the root,
    /// path-relative elsewhere)
    pub category_links: HashSet<String>,

    /// Category links fully processed; monotonically non-decreasing
    pub done_links: HashSet<String>,

    /// Member page names seen so far
    pub page_names: HashSet<String>,

    /// Member page links seen so far
    pub page_links: HashSet<String>,
}

impl FrontierState {
    /// Load persisted state from `dir`, creating fresh sets where files are
    /// missing
    ///
    /// On a fresh run the category-link set is seeded with the root URL so
    /// the first iteration has work to do.
    pub fn load(dir: &Path, root_url: &str) -> Result<Self> {
        let category_links_path = dir.join(CATEGORY_LINKS_FILE);
        let seeded = !category_links_path.exists();

        let mut state = Self {
            dir: dir.to_path_buf(),
            category_names: read_set(&dir.join(CATEGORY_NAMES_FILE))?,
            category_links: read_set(&category_links_path)?,
            done_links: read_set(&dir.join(DONE_LINKS_FILE))?,
            page_names: read_set(&dir.join(PAGE_NAMES_FILE))?,
            page_links: read_set(&dir.join(PAGE_LINKS_FILE))?,
        };

        if seeded {
            state.category_links.insert(root_url.to_string());
        }

        tracing::info!(
            categories = state.category_links.len(),
            done = state.done_links.len(),
            pages = state.page_names.len(),
            seeded,
            "Frontier state loaded"
        );

        Ok(state)
    }

    /// Merge one iteration's discoveries into the durable sets
    pub fn merge(&mut self, discovery: &ListingDiscovery) {
        self.category_names
            .extend(discovery.category_names.iter().cloned());
        self.category_links
            .extend(discovery.category_links.iter().cloned());
        self.done_links.extend(discovery.done_links.iter().cloned());
        self.page_names.extend(discovery.page_names.iter().cloned());
        self.page_links.extend(discovery.page_links.iter().cloned());
    }

    /// The links known but not yet crawled
    pub fn outstanding(&self) -> HashSet<String> {
        self.category_links
            .difference(&self.done_links)
            .cloned()
            .collect()
    }

    /// Rewrite every state file from the in-memory sets
    pub fn flush(&self) -> Result<()> {
        write_set(&self.dir.join(CATEGORY_NAMES_FILE), &self.category_names)?;
        write_set(&self.dir.join(CATEGORY_LINKS_FILE), &self.category_links)?;
        write_set(&self.dir.join(DONE_LINKS_FILE), &self.done_links)?;
        write_set(&self.dir.join(PAGE_NAMES_FILE), &self.page_names)?;
        write_set(&self.dir.join(PAGE_LINKS_FILE), &self.page_links)?;
        Ok(())
    }
}

fn read_set(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn write_set(path: &Path, set: &HashSet<String>) -> Result<()> {
    let mut lines: Vec<&str> = set.iter().map(String::as_str).collect();
    lines.sort_unstable();
    fs::write(path, lines.join("\n"))?;
    Ok(())
}
