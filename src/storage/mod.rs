//! Idempotent one-file-per-page persistence
//!
//! Two writers: cleaned article records as one-line JSON files and raw
//! export documents as XML files. Both skip silently when the target file
//! already exists — together with the frontier state this is what makes
//! restart-without-reprocessing work at file granularity.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::CleanedArticle;

/// Characters replaced with `_` when deriving a filename from a page title
const UNSAFE_CHARS: &[char] = &[':', ' ', '/', '\\', '?', '*', '"', '\'', '(', ')'];

/// Derive a filesystem-safe stem from a page title
///
/// Every unsafe character becomes an underscore and runs of underscores are
/// collapsed, so `"A / B"` and `"A_?_B"` map to the same stem.
///
/// # Examples
///
/// ```
/// use wikiglean::storage::sanitize_page_name;
///
/// assert_eq!(sanitize_page_name("Isaac Newton (physicist)"), "Isaac_Newton_physicist_");
/// assert_eq!(sanitize_page_name("A/B: test"), "A_B_test");
/// ```
pub fn sanitize_page_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;

    for c in name.chars() {
        if UNSAFE_CHARS.contains(&c) || c == '_' {
            if !last_underscore {
                out.push('_');
                last_underscore = true;
            }
        } else {
            out.push(c);
            last_underscore = false;
        }
    }

    out
}

/// Writer for cleaned article records (`<dir>/<stem>.json`, one JSON line)
pub struct ArticleWriter {
    dir: PathBuf,
}

impl ArticleWriter {
    /// Create the writer, making the output directory if needed
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Target path for a page title
    pub fn path_for(&self, page: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_page_name(page)))
    }

    /// Whether a record for this page already exists on disk
    pub fn exists(&self, page: &str) -> bool {
        self.path_for(page).exists()
    }

    /// Write one record; returns `None` when the file already existed
    pub fn save(&self, article: &CleanedArticle) -> Result<Option<PathBuf>> {
        let path = self.path_for(&article.page);
        if path.exists() {
            return Ok(None);
        }

        let mut line = serde_json::to_string(article)?;
        line.push('\n');
        fs::write(&path, line)?;
        Ok(Some(path))
    }
}

/// Writer for raw export documents (`<dir>/<stem>.xml`)
pub struct RawExportWriter {
    dir: PathBuf,
}

impl RawExportWriter {
    /// Create the writer, making the output directory if needed
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Write one raw export; returns `None` when the file already existed
    pub fn save(&self, page_name: &str, content: &[u8]) -> Result<Option<PathBuf>> {
        let path = self
            .dir
            .join(format!("{}.xml", sanitize_page_name(page_name)));
        if path.exists() {
            return Ok(None);
        }

        fs::write(&path, content)?;
        Ok(Some(path))
    }
}

/// Sanitized stems of every article record already present in `dir`
///
/// Loaded once at startup; the explorer skips enqueueing pages whose stem is
/// in this set.
pub fn completed_pages(dir: &Path) -> Result<HashSet<String>> {
    let mut stems = HashSet::new();
    if !dir.exists() {
        return Ok(stems);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                stems.insert(stem.to_string());
            }
        }
    }

    Ok(stems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn article(page: &str) -> CleanedArticle {
        CleanedArticle {
            page: page.to_string(),
            sentences: "body".to_string(),
            categories: vec!["Demo".to_string()],
            source_link: "/wiki/x".to_string(),
        }
    }

    #[test]
    fn test_sanitize_replaces_and_collapses() {
        assert_eq!(sanitize_page_name("A: B"), "A_B");
        assert_eq!(sanitize_page_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_page_name("x (y)"), "x_y_");
        assert_eq!(sanitize_page_name("what?*\"'"), "what_");
        assert_eq!(sanitize_page_name("plain"), "plain");
    }

    #[test]
    fn test_article_writer_idempotent() {
        let dir = TempDir::new().unwrap();
        let writer = ArticleWriter::new(dir.path()).unwrap();

        let first = writer.save(&article("Test Page")).unwrap();
        assert!(first.is_some());
        let before = fs::read_to_string(first.as_ref().unwrap()).unwrap();

        // Second save is a silent skip; content unchanged.
        let second = writer.save(&article("Test Page")).unwrap();
        assert!(second.is_none());
        let after = fs::read_to_string(dir.path().join("Test_Page.json")).unwrap();
        assert_eq!(before, after);

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_article_record_is_one_json_line() {
        let dir = TempDir::new().unwrap();
        let writer = ArticleWriter::new(dir.path()).unwrap();
        let path = writer.save(&article("Test")).unwrap().unwrap();

        let content = fs::read_to_string(path).unwrap();
        assert!(content.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["page"], "Test");
        assert_eq!(parsed["sentences"], "body");
        assert_eq!(parsed["categories"][0], "Demo");
    }

    #[test]
    fn test_raw_writer_idempotent() {
        let dir = TempDir::new().unwrap();
        let writer = RawExportWriter::new(dir.path()).unwrap();

        assert!(writer.save("Page: one", b"<xml/>").unwrap().is_some());
        assert!(writer.save("Page: one", b"<other/>").unwrap().is_none());

        let content = fs::read(dir.path().join("Page_one.xml")).unwrap();
        assert_eq!(content, b"<xml/>");
    }

    #[test]
    fn test_completed_pages() {
        let dir = TempDir::new().unwrap();
        let writer = ArticleWriter::new(dir.path()).unwrap();
        writer.save(&article("Alpha Beta")).unwrap();
        writer.save(&article("Gamma")).unwrap();
        fs::write(dir.path().join("stray.txt"), "x").unwrap();

        let done = completed_pages(dir.path()).unwrap();
        assert_eq!(done.len(), 2);
        assert!(done.contains("Alpha_Beta"));
        assert!(done.contains("Gamma"));
    }

    #[test]
    fn test_completed_pages_missing_dir() {
        let done = completed_pages(Path::new("/nonexistent/wikiglean-test")).unwrap();
        assert!(done.is_empty());
    }
}
