//! Balanced-region scanning for nested wiki delimiters
//!
//! Wikitext nests its own delimiters (`[[File:a [[b]] c]]`,
//! `{{outer|{{inner}}}}`), so a non-nesting regex cannot find the matching
//! close of a block. This module provides the single depth-counting scan that
//! the resource-link remover, the template remover, and the link indexer all
//! share; each caller supplies only its interior-handling policy.

/// Find the end of a balanced region.
///
/// `scan_from` is the byte offset just past the two-character opening marker
/// (e.g. past `[[` or `{{`), so the scan starts at depth 2: the marker itself
/// consumes one nesting level per character. Each `open` byte increments the
/// depth, each `close` byte decrements it; when the depth reaches zero the
/// offset just past that closing byte is returned.
///
/// Returns `None` when the region never closes. Both delimiters are ASCII, so
/// every returned offset lies on a UTF-8 character boundary.
///
/// # Examples
///
/// ```
/// use wikiglean::wikitext::scan::find_balanced_end;
///
/// let text = "{{outer|{{inner|x}}|y}} rest";
/// let end = find_balanced_end(text, 2, b'{', b'}').unwrap();
/// assert_eq!(&text[..end], "{{outer|{{inner|x}}|y}}");
///
/// assert_eq!(find_balanced_end("{{never closed", 2, b'{', b'}'), None);
/// ```
pub fn find_balanced_end(text: &str, scan_from: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 2u32;

    for (offset, &b) in bytes.iter().enumerate().skip(scan_from) {
        if b == open {
            depth += 1;
        } else if b == close {
            depth -= 1;
            if depth == 0 {
                return Some(offset + 1);
            }
        }
    }

    None
}
