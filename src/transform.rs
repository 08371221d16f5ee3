//! Article transform: cleaned text, category tags, redirect filtering
//!
//! Consumes a [`ParsedPage`], runs the wikitext cleaner, extracts the
//! `[[Category:…]]` tags (before the cosmetic bracket strip would mutate
//! them), cuts trailing "See also" material, and drops redirect stubs.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{CleanedArticle, ParsedPage};
use crate::wikitext::clean_text;

static CATEGORY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[Category:(.*?)\]\]").unwrap());

/// Marker left behind by redirect stubs; such pages carry no article content.
const REDIRECT_MARKER: &str = "REDIRECT";

/// Heading that starts the trailing material we discard.
const SEE_ALSO_MARKER: &str = "See also";

/// Transform one parsed page into its terminal cleaned record
///
/// Returns `None` for redirect stubs.
///
/// # Examples
///
/// ```
/// use wikiglean::models::ParsedPage;
/// use wikiglean::transform::transform_page;
///
/// let page = ParsedPage {
///     title: "Test".to_string(),
///     wikitext: "'''Hi''' [[Category:Demo]]".to_string(),
///     source_link: "/wiki/Test".to_string(),
/// };
///
/// let article = transform_page(page).unwrap();
/// assert_eq!(article.sentences, "Hi");
/// assert_eq!(article.categories, vec!["Demo".to_string()]);
/// ```
pub fn transform_page(page: ParsedPage) -> Option<CleanedArticle> {
    let text = clean_text(&page.wikitext);
    let (text, categories) = extract_categories(&text);

    if text.contains(REDIRECT_MARKER) {
        tracing::debug!(title = %page.title, "Dropping redirect stub");
        return None;
    }

    Some(CleanedArticle {
        page: page.title,
        sentences: text,
        categories,
        source_link: page.source_link,
    })
}

/// Pull category tags out of cleaned text and tidy the remainder
///
/// Tags are collected in document order with their whole `[[Category:…]]`
/// markers removed; the leftover `[[` / `]]` / `==` artifacts are rewritten
/// away and everything from the first "See also" heading onward is cut.
pub fn extract_categories(text: &str) -> (String, Vec<String>) {
    let categories: Vec<String> = CATEGORY_REGEX
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect();

    let text = CATEGORY_REGEX.replace_all(text, "");
    let text = text.replace("[[", "").replace("]]", "").replace("==", "");
    let text = match text.find(SEE_ALSO_MARKER) {
        Some(pos) => &text[..pos],
        None => &text,
    };

    (text.trim().to_string(), categories)
}
