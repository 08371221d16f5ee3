//! Streaming extraction of page records from MediaWiki export XML
//!
//! Export documents can be large and many are processed concurrently, so the
//! extractor is a state machine over `quick-xml` events rather than a
//! materialized tree. It tracks an explicit stack of open element names and
//! accumulates title/text character data, distinguishing an absent `<text>`
//! element from an empty one: only pages whose text element was actually
//! present (and whose namespace passes the filter) produce a record.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ParseError;
use crate::models::ParsedPage;

/// Namespace predicate for main articles (`<ns>0</ns>`)
pub fn main_namespace(ns: Option<i64>) -> bool {
    ns == Some(0)
}

/// Namespace predicate for category pages (`<ns>14</ns>`)
pub fn category_namespace(ns: Option<i64>) -> bool {
    ns == Some(14)
}

/// Extract every page record from one export document
///
/// `source_link` is carried through onto each record so downstream stages
/// know which listing the page was discovered under. `ns_filter` gates
/// emission; pass [`main_namespace`] for article crawls.
///
/// # Errors
///
/// Returns [`ParseError::Xml`] on malformed XML. Pages with no text payload
/// are skipped silently, not treated as errors.
pub fn extract_pages<F>(
    content: &[u8],
    source_link: &str,
    ns_filter: F,
) -> Result<Vec<ParsedPage>, ParseError>
where
    F: Fn(Option<i64>) -> bool,
{
    let mut reader = Reader::from_reader(content);
    let mut buf = Vec::new();

    // Only elements we care about are pushed; character data is routed by
    // whatever tracked element is on top when it arrives.
    let mut stack: Vec<String> = Vec::new();

    let mut title: Option<String> = None;
    let mut text: Option<String> = None;
    let mut namespace: Option<i64> = None;
    let mut ns_chars = String::new();

    let mut pages = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "ns" => {
                        namespace = None;
                        ns_chars.clear();
                    }
                    "page" => {
                        title = None;
                        text = None;
                    }
                    "title" => title = Some(String::new()),
                    "text" => text = Some(String::new()),
                    _ => {
                        buf.clear();
                        continue;
                    }
                }
                stack.push(name);
            }

            Event::Empty(e) => {
                // A self-closing <text/> still counts as present-but-empty.
                match e.name().as_ref() {
                    b"text" => text = Some(String::new()),
                    b"title" => title = Some(String::new()),
                    _ => {}
                }
            }

            Event::Text(t) => {
                let chunk = t.unescape()?;
                match stack.last().map(String::as_str) {
                    Some("text") => {
                        if let Some(acc) = text.as_mut() {
                            acc.push_str(&chunk);
                        }
                    }
                    Some("title") => {
                        if let Some(acc) = title.as_mut() {
                            acc.push_str(&chunk);
                        }
                    }
                    Some("ns") => ns_chars.push_str(&chunk),
                    _ => {}
                }
            }

            Event::CData(c) => {
                let chunk = std::str::from_utf8(&c)?.to_string();
                if let (Some("text"), Some(acc)) =
                    (stack.last().map(String::as_str), text.as_mut())
                {
                    acc.push_str(&chunk);
                }
            }

            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if stack.last() == Some(&name) {
                    stack.pop();
                }

                match name.as_str() {
                    "ns" => namespace = ns_chars.trim().parse().ok(),
                    "page" => {
                        if let Some(body) = text.take() {
                            if ns_filter(namespace) {
                                pages.push(ParsedPage {
                                    title: title.take().unwrap_or_default(),
                                    wikitext: body,
                                    source_link: source_link.to_string(),
                                });
                            }
                        }
                    }
                    _ => {}
                }
            }

            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(pages)
}
