//! Position-indexed link extraction from raw wikitext
//!
//! Walks `[[…]]` spans with the shared balanced scan and records where each
//! link's display text lands in a running cleaned buffer. Independent of the
//! main cleaning pipeline: it reads raw wikitext, not [`super::clean_text`]
//! output.

use super::scan::find_balanced_end;

/// One inline reference inside the link-cleaned text
///
/// Offsets are byte positions in the cleaned buffer returned alongside the
/// spans, not in the original markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    /// Byte offset where the display text begins
    pub begin: usize,
    /// Byte offset just past the display text
    pub end: usize,
    /// Link target (possibly namespace-qualified)
    pub target: String,
    /// Display text as it appears in the cleaned buffer
    pub text: String,
}

/// Replace `[[…]]` spans with their display text and index every span
///
/// Three link shapes are recognized:
/// - `[[Target]]` — target and display text are the same string;
/// - `[[Ns:Target]]` — the whole string is the target, the text after the
///   last `:` is the display text;
/// - `[[Target|Shown]]` — one pipe splits target from display text.
///
/// Links with two or more pipes contribute nothing to the buffer. An opener
/// that never closes leaves the tail verbatim.
///
/// # Examples
///
/// ```
/// use wikiglean::wikitext::extract_links;
///
/// let (text, links) = extract_links("see [[Physics|physics]] basics");
/// assert_eq!(text, "see physics basics");
/// assert_eq!(links[0].target, "Physics");
/// assert_eq!(&text[links[0].begin..links[0].end], "physics");
/// ```
pub fn extract_links(text: &str) -> (String, Vec<LinkSpan>) {
    let mut cleaned = String::with_capacity(text.len());
    let mut links = Vec::new();
    let mut begin = 0;

    while let Some(rel) = text[begin..].find("[[") {
        let pattern_begin = begin + rel;
        cleaned.push_str(&text[begin..pattern_begin]);

        let end = match find_balanced_end(text, pattern_begin + 2, b'[', b']') {
            Some(end) => end,
            None => {
                cleaned.push_str(&text[pattern_begin..]);
                return (cleaned.trim().to_string(), links);
            }
        };

        let interior = &text[pattern_begin + 2..end - 2];
        let parts: Vec<&str> = interior.split('|').collect();

        match parts.len() {
            1 => {
                let display = match interior.rsplit_once(':') {
                    Some((_, after)) => after,
                    None => interior,
                };
                links.push(LinkSpan {
                    begin: cleaned.len(),
                    end: cleaned.len() + display.len(),
                    target: interior.to_string(),
                    text: display.to_string(),
                });
                cleaned.push_str(display);
            }
            2 => {
                links.push(LinkSpan {
                    begin: cleaned.len(),
                    end: cleaned.len() + parts[1].len(),
                    target: parts[0].to_string(),
                    text: parts[1].to_string(),
                });
                cleaned.push_str(parts[1]);
            }
            _ => {}
        }

        begin = end;
    }

    cleaned.push_str(&text[begin..]);
    (cleaned.trim().to_string(), links)
}
