//! Wikitext processing: markup cleaning and link indexing
//!
//! Pure text transforms with no I/O and no concurrency awareness. The
//! cleaning pipeline lives in [`cleaner`], the `[[…]]` link indexer in
//! [`links`], and the shared nested-delimiter scan in [`scan`].

pub mod cleaner;
pub mod links;
pub mod scan;

pub use cleaner::clean_text;
pub use links::{extract_links, LinkSpan};
