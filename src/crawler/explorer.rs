//! Breadth-first category graph exploration
//!
//! The explorer owns the frontier state and drives the crawl loop: each
//! iteration takes the outstanding listing URLs, walks every listing through
//! its pagination chain, merges the discoveries, enqueues newly seen member
//! pages for download, flushes state, and checks the discovery limits.
//!
//! Listing HTML is parsed in plain sync functions returning owned data;
//! `scraper`'s DOM types are never held across an await point.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tokio::sync::mpsc;

use crate::config::CrawlConfig;
use crate::crawler::fetcher::{ListingFetch, WikiFetcher};
use crate::error::Result;
use crate::frontier::FrontierState;
use crate::models::{CategoryRef, ExplorerReport, ListingDiscovery, PageRef};
use crate::storage::sanitize_page_name;

static SUBCAT_REGION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#mw-subcategories").unwrap());
static TREE_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.CategoryTreeItem").unwrap());
static PAGES_REGION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#mw-pages").unwrap());
static LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

const NEXT_PAGE_TEXT: &str = "next page";

/// Everything parsed out of one listing page body
#[derive(Debug, Default)]
pub struct ParsedListing {
    pub categories: Vec<CategoryRef>,
    pub pages: Vec<PageRef>,
    /// Continuation link when the listing is paginated
    pub next: Option<String>,
}

/// Parse the subcategory and member-page regions of a category listing
///
/// Either region may be absent (a leaf category has no subcategories, a
/// container category may have no pages). Anchors without an `href` are
/// logged and skipped.
pub fn parse_listing(html: &str) -> ParsedListing {
    let document = Html::parse_document(html);
    let mut listing = ParsedListing::default();

    if let Some(region) = document.select(&SUBCAT_REGION).next() {
        for item in region.select(&TREE_ITEM) {
            if let Some((name, link)) = anchor_parts(item) {
                listing.categories.push(CategoryRef { name, link });
            }
        }
    }

    if let Some(region) = document.select(&PAGES_REGION).next() {
        for item in region.select(&LIST_ITEM) {
            if let Some((name, link)) = anchor_parts(item) {
                listing.pages.push(PageRef { name, link });
            }
        }
        // Only the pages region paginates; subcategory listings are short.
        listing.next = next_link(region);
    }

    listing
}

fn anchor_parts(element: ElementRef<'_>) -> Option<(String, String)> {
    let anchor = element.select(&ANCHOR).next()?;
    let name = anchor.text().collect::<String>().trim().to_string();
    match anchor.value().attr("href") {
        Some(href) => Some((name, href.to_string())),
        None => {
            tracing::warn!(name = %name, "Listing anchor without href, skipping");
            None
        }
    }
}

fn next_link(region: ElementRef<'_>) -> Option<String> {
    region.select(&ANCHOR).find_map(|a| {
        let text = a.text().collect::<String>();
        if text.trim().starts_with(NEXT_PAGE_TEXT) {
            a.value().attr("href").map(str::to_string)
        } else {
            None
        }
    })
}

/// Drives the breadth-first crawl over the category graph
pub struct CategoryExplorer {
    fetcher: Arc<WikiFetcher>,
    config: CrawlConfig,
    /// Sanitized stems of pages already written to disk
    completed: HashSet<String>,
    page_tx: mpsc::Sender<PageRef>,
}

impl CategoryExplorer {
    pub fn new(
        fetcher: Arc<WikiFetcher>,
        config: CrawlConfig,
        completed: HashSet<String>,
        page_tx: mpsc::Sender<PageRef>,
    ) -> Self {
        Self {
            fetcher,
            config,
            completed,
            page_tx,
        }
    }

    /// Run the exploration loop until the frontier is exhausted, a limit
    /// trips, or the configured depth is reached
    ///
    /// Dropping the returned sender side happens in the caller: when this
    /// function returns and the explorer is dropped, the page channel closes
    /// and the pipeline drains to completion.
    pub async fn run(mut self, state: &mut FrontierState) -> Result<ExplorerReport> {
        let mut report = ExplorerReport::default();
        let mut iteration: u64 = 0;

        loop {
            if let Some(depth) = self.config.depth {
                if iteration >= depth {
                    tracing::info!(iteration, "Depth bound reached");
                    break;
                }
            }

            let mut frontier: Vec<String> = state.outstanding().into_iter().collect();
            if frontier.is_empty() {
                tracing::info!(iteration, "Frontier exhausted");
                break;
            }
            frontier.sort_unstable();

            tracing::info!(iteration, listings = frontier.len(), "Starting iteration");

            let mut discovered = ListingDiscovery::default();
            for url in &frontier {
                tokio::time::sleep(self.config.listing_delay(iteration)).await;
                let (found, pages) = self.crawl_listing(url).await;
                self.enqueue_pages(&pages, state).await;
                discovered.union(found);
            }

            state.merge(&discovered);
            state.flush()?;
            iteration += 1;
            report.iterations = iteration;

            if limit_hit(self.config.max_categories, state.category_names.len()) {
                tracing::info!(
                    categories = state.category_names.len(),
                    "Category limit reached"
                );
                report.limit_tripped = true;
                break;
            }
            if limit_hit(self.config.max_pages, state.page_names.len()) {
                tracing::info!(pages = state.page_names.len(), "Page limit reached");
                report.limit_tripped = true;
                break;
            }

            tokio::time::sleep(self.config.drain_delay(iteration - 1)).await;
        }

        Ok(report)
    }

    /// Walk one listing URL through its whole pagination chain
    ///
    /// Each successfully consumed page of the chain is marked done under the
    /// link form it was reached by. A 429 leaves the remaining chain not
    /// done so a later iteration retries it; any other failure ends the
    /// chain with the current URL marked done without data.
    async fn crawl_listing(&self, url: &str) -> (ListingDiscovery, Vec<PageRef>) {
        let mut discovered = ListingDiscovery::default();
        let mut pages = Vec::new();
        let mut work = vec![url.to_string()];

        while let Some(link) = work.pop() {
            let absolute = self.fetcher.absolute_url(&link);
            match self.fetcher.fetch_listing(&absolute).await {
                Ok(ListingFetch::Body(body)) => {
                    let listing = parse_listing(&body);
                    for category in listing.categories {
                        discovered.category_names.insert(category.name);
                        discovered.category_links.insert(category.link);
                    }
                    for page in listing.pages {
                        discovered.page_names.insert(page.name.clone());
                        discovered.page_links.insert(page.link.clone());
                        pages.push(page);
                    }
                    if let Some(next) = listing.next {
                        work.push(next);
                    }
                    discovered.done_links.insert(link);
                }
                Ok(ListingFetch::RateLimited) => {
                    tracing::warn!(url = %absolute, "Rate limited on listing, cooling down");
                    tokio::time::sleep(self.fetcher.cooldown()).await;
                    break;
                }
                Ok(ListingFetch::Gone(status)) => {
                    tracing::warn!(url = %absolute, status, "Listing gone, marking done");
                    discovered.done_links.insert(link);
                    break;
                }
                Err(e) => {
                    tracing::error!(url = %absolute, error = %e, "Listing fetch failed");
                    break;
                }
            }
        }

        (discovered, pages)
    }

    /// Queue newly discovered pages for download
    ///
    /// Pages already on disk or already seen this run are skipped. When the
    /// queue sits above its high-water mark the explorer pauses to let the
    /// download stages catch up.
    async fn enqueue_pages(&mut self, pages: &[PageRef], state: &FrontierState) {
        for page in pages {
            if state.page_names.contains(&page.name) {
                continue;
            }
            let stem = sanitize_page_name(&page.name);
            if self.completed.contains(&stem) {
                tracing::debug!(page = %page.name, "Already on disk, skipping");
                continue;
            }
            self.completed.insert(stem);

            if self.page_tx.capacity() < self.page_tx.max_capacity() / 5 {
                tracing::info!("Page queue near capacity, pausing");
                tokio::time::sleep(std::time::Duration::from_secs(
                    self.config.queue_pause_secs,
                ))
                .await;
            }

            if self.page_tx.send(page.clone()).await.is_err() {
                tracing::warn!("Page queue closed, discarding remaining discoveries");
                return;
            }
        }
    }
}

fn limit_hit(limit: i64, count: usize) -> bool {
    limit > 0 && count >= limit as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <div id="mw-subcategories">
          <div class="CategoryTreeItem"><a href="/wiki/Category:Mechanics">Mechanics</a></div>
          <div class="CategoryTreeItem"><a href="/wiki/Category:Optics">Optics</a></div>
        </div>
        <div id="mw-pages">
          <ul>
            <li><a href="/wiki/Force">Force</a></li>
            <li><a href="/wiki/Energy">Energy</a></li>
          </ul>
          <a href="/w/index.php?title=Category:Physics&amp;pagefrom=Energy">next page</a>
        </div>
        </body></html>"#;

    #[test]
    fn test_parse_listing_regions() {
        let listing = parse_listing(LISTING);
        assert_eq!(listing.categories.len(), 2);
        assert_eq!(listing.categories[0].name, "Mechanics");
        assert_eq!(listing.categories[0].link, "/wiki/Category:Mechanics");
        assert_eq!(listing.pages.len(), 2);
        assert_eq!(listing.pages[1].name, "Energy");
        assert_eq!(
            listing.next.as_deref(),
            Some("/w/index.php?title=Category:Physics&pagefrom=Energy")
        );
    }

    #[test]
    fn test_parse_listing_missing_regions() {
        let listing = parse_listing("<html><body><p>nothing here</p></body></html>");
        assert!(listing.categories.is_empty());
        assert!(listing.pages.is_empty());
        assert!(listing.next.is_none());
    }

    #[test]
    fn test_parse_listing_anchor_without_href() {
        let html = r#"
            <div id="mw-pages">
              <li><a>No link here</a></li>
              <li><a href="/wiki/Kept">Kept</a></li>
            </div>"#;
        let listing = parse_listing(html);
        assert_eq!(listing.pages.len(), 1);
        assert_eq!(listing.pages[0].name, "Kept");
    }

    #[test]
    fn test_subcategory_region_does_not_paginate() {
        let html = r#"
            <div id="mw-subcategories">
              <div class="CategoryTreeItem"><a href="/wiki/Category:A">A</a></div>
              <a href="/w/index.php?subcatfrom=A">next page</a>
            </div>
            <div id="mw-pages">
              <li><a href="/wiki/X">X</a></li>
            </div>"#;
        let listing = parse_listing(html);
        assert_eq!(listing.categories.len(), 1);
        assert!(listing.next.is_none());
    }

    #[test]
    fn test_previous_page_anchor_not_taken_as_next() {
        let html = r#"
            <div id="mw-pages">
              <a href="/w/back">previous page</a>
              <li><a href="/wiki/X">X</a></li>
            </div>"#;
        let listing = parse_listing(html);
        assert!(listing.next.is_none());
    }

    #[test]
    fn test_limit_hit() {
        assert!(!limit_hit(-1, 1_000_000));
        assert!(!limit_hit(0, 5));
        assert!(!limit_hit(10, 9));
        assert!(limit_hit(10, 10));
        assert!(limit_hit(10, 11));
    }
}
