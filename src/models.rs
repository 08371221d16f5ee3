// Core data structures for the wikiglean crawler

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A subcategory discovered on a category listing page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryRef {
    /// Display name of the category
    pub name: String,
    /// Link as it appeared on the page (usually path-relative `/wiki/...`)
    pub link: String,
}

/// A member page discovered on a category listing page
///
/// Queued for download exactly once per process lifetime; deduplicated
/// against already-completed output at enqueue time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRef {
    /// Page title as it appeared on the listing
    pub name: String,
    /// Link as it appeared on the page
    pub link: String,
}

/// Raw export document fetched for one page
///
/// Transient; fanned out to both the raw-archive sink and the parse sink.
/// The body is `Bytes` so the fan-out clones are cheap.
#[derive(Debug, Clone)]
pub struct ExportDocument {
    /// Page name the export was requested for
    pub page_name: String,
    /// Listing link the page was discovered under
    pub source_link: String,
    /// Raw export XML bytes
    pub content: Bytes,
}

/// One page record pulled out of an export document
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Page title from the export
    pub title: String,
    /// Raw wikitext body
    pub wikitext: String,
    /// Listing link the page was discovered under
    pub source_link: String,
}

/// Terminal record: cleaned article text plus extracted category tags
///
/// Serialized as one JSON line: `{"page": …, "sentences": …, "categories": […]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanedArticle {
    /// Page title
    pub page: String,
    /// Cleaned plain text
    pub sentences: String,
    /// Category tags in the order they appeared in the markup
    pub categories: Vec<String>,
    /// Listing link the page was discovered under (not persisted)
    #[serde(skip)]
    pub source_link: String,
}

/// Everything the explorer learned from one category listing
/// (including its pagination continuations)
#[derive(Debug, Clone, Default)]
pub struct ListingDiscovery {
    /// Subcategory display names
    pub category_names: HashSet<String>,
    /// Subcategory links
    pub category_links: HashSet<String>,
    /// Member page names
    pub page_names: HashSet<String>,
    /// Member page links
    pub page_links: HashSet<String>,
    /// Listing URLs now considered done (canonical form)
    pub done_links: HashSet<String>,
}

impl ListingDiscovery {
    /// Union another discovery into this one
    pub fn union(&mut self, other: ListingDiscovery) {
        self.category_names.extend(other.category_names);
        self.category_links.extend(other.category_links);
        self.page_names.extend(other.page_names);
        self.page_links.extend(other.page_links);
        self.done_links.extend(other.done_links);
    }

    /// True when nothing was discovered and nothing was marked done
    pub fn is_empty(&self) -> bool {
        self.category_names.is_empty()
            && self.category_links.is_empty()
            && self.page_names.is_empty()
            && self.page_links.is_empty()
            && self.done_links.is_empty()
    }
}

/// Summary returned by the explorer once the crawl loop exits
#[derive(Debug, Clone, Default)]
pub struct ExplorerReport {
    /// Number of frontier iterations performed (root listing excluded)
    pub iterations: u64,
    /// True when a category/page count limit stopped the crawl
    pub limit_tripped: bool,
}
