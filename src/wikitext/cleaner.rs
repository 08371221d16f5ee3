//! Wikitext cleaning pipeline
//!
//! An order-dependent sequence of text transforms that strips wiki markup
//! down to plain prose. Later transforms assume earlier ones already ran:
//! resource links must go before external links, emphasis before templates,
//! templates before the bare tag strip, and so on. [`clean_text`] applies the
//! whole sequence; the individual steps are exposed where they are useful on
//! their own.
//!
//! Nested constructs (`[[File:…|a [[link]] in the caption]]`,
//! `{{outer|{{inner}}}}`) are handled with the depth-counting scan from
//! [`super::scan`], not regexes.

use regex::Regex;
use std::sync::LazyLock;

use super::scan::find_balanced_end;

// Pre-compiled patterns, in pipeline order
static FILE_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^File:.*$").unwrap());

static EXTERNAL_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[h[^ ]+ (.*?)\]").unwrap());

static REF_SELF_CLOSING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<ref[^/]*?/>").unwrap());

static REF_PAIRED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<ref.*?</ref>").unwrap());

static BOLD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)'''(.*?)'''").unwrap());

static ITALIC_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)''(.*?)''").unwrap());

static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static LANG_TEMPLATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)\{\{lang(-|\|).*?\|(.*?)\}\}").unwrap());

static CHOICE_ZH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)-\{.{0,100}?zh(-hans|-cn|-hk|):(.{0,100}?)(;.{0,100}?\}-|\}-)").unwrap()
});

static CHOICE_FIRST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)-\{.{0,100}?:(.{0,100}?)(;.{0,100}?\}-|\}-)").unwrap());

static CHOICE_BARE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)-\{(.{0,100}?)\}-").unwrap());

static HTML_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<(.*?)>").unwrap());

static LIST_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[*#]\s*").unwrap());

static INDENT_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[:;]\s*").unwrap());

static TABLE_STYLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is):?\{\| (style|class)=.*?\|\}").unwrap());

static MULTI_NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Clean raw wikitext into plain text
///
/// Applies every transform in its required order and trims the result.
/// Pure function: no I/O, no shared state.
///
/// # Examples
///
/// ```
/// use wikiglean::wikitext::clean_text;
///
/// let raw = "'''Physics''' is the study of <ref>citation</ref>matter.";
/// assert_eq!(clean_text(raw), "Physics is the study of matter.");
/// ```
pub fn clean_text(text: &str) -> String {
    let text = remove_resource_links(text, "File");
    let text = FILE_LINE_REGEX.replace_all(&text, "");
    let text = remove_resource_links(&text, "Image");
    let text = EXTERNAL_LINK_REGEX.replace_all(&text, "$1");
    let text = REF_SELF_CLOSING_REGEX.replace_all(&text, "");
    let text = REF_PAIRED_REGEX.replace_all(&text, "");
    let text = BOLD_REGEX.replace_all(&text, "$1");
    let text = ITALIC_REGEX.replace_all(&text, "$1");
    let text = COMMENT_REGEX.replace_all(&text, "");
    let text = LANG_TEMPLATE_REGEX.replace_all(&text, "$2");
    let text = remove_choices(&text);
    let text = remove_templates(&text);
    let text = HTML_TAG_REGEX.replace_all(&text, "");
    let text = LIST_MARKER_REGEX.replace_all(&text, "");
    let text = INDENT_MARKER_REGEX.replace_all(&text, "");
    let text = TABLE_STYLE_REGEX.replace_all(&text, "");
    let text = text.replace('\u{200B}', "");
    let text = MULTI_NEWLINE_REGEX.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Remove resource-reference blocks like `[[File:…]]` or `[[Image:…]]`
///
/// Uses the balanced-region scan so captions containing nested `[[…]]` links
/// do not close the block early. An opener that never closes leaves the tail
/// verbatim rather than corrupting the surrounding text.
///
/// # Examples
///
/// ```
/// use wikiglean::wikitext::cleaner::remove_resource_links;
///
/// let text = "A [[File:x.jpg|thumb|caption [[with]] nested]] B";
/// assert_eq!(remove_resource_links(text, "File"), "A  B");
/// ```
pub fn remove_resource_links(text: &str, resource: &str) -> String {
    let pattern = format!("[[{resource}:");
    let mut out = String::with_capacity(text.len());
    let mut begin = 0;

    while let Some(rel) = text[begin..].find(&pattern) {
        let pattern_begin = begin + rel;
        out.push_str(&text[begin..pattern_begin]);

        match find_balanced_end(text, pattern_begin + 2, b'[', b']') {
            Some(end) => begin = end,
            None => {
                out.push_str(&text[pattern_begin..]);
                return out;
            }
        }
    }

    out.push_str(&text[begin..]);
    out
}

/// Remove generic `{{…}}` templates
///
/// Most templates are deleted outright. Two interior shapes survive as text:
/// a single part made only of quote/space characters keeps its quotes
/// (quotation templates), and a 2–3 part template whose head is `le` or
/// starts with `link-` is replaced by its final part, the display label of
/// the citation shorthand. The allow-list is a literal site convention, not
/// extensible.
///
/// # Examples
///
/// ```
/// use wikiglean::wikitext::cleaner::remove_templates;
///
/// assert_eq!(remove_templates("see {{le|Foo|Bar}}"), "see Bar");
/// assert_eq!(remove_templates("x {{cite web|url=a}} y"), "x  y");
/// assert_eq!(remove_templates("a {{outer|{{inner|x}}|y}} b"), "a  b");
/// ```
pub fn remove_templates(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut begin = 0;

    while let Some(rel) = text[begin..].find("{{") {
        let pattern_begin = begin + rel;
        out.push_str(&text[begin..pattern_begin]);

        match find_balanced_end(text, pattern_begin + 2, b'{', b'}') {
            Some(end) => {
                out.push_str(&template_replacement(&text[pattern_begin + 2..end - 2]));
                begin = end;
            }
            None => {
                out.push_str(&text[pattern_begin..]);
                return out;
            }
        }
    }

    out.push_str(&text[begin..]);
    out
}

/// Decide what a fully-scanned template interior collapses to
fn template_replacement(interior: &str) -> String {
    let parts: Vec<&str> = interior.split('|').collect();

    match parts.len() {
        1 => {
            if parts[0].chars().all(|c| matches!(c, '"' | '\'' | ' ')) {
                parts[0].replace(' ', "")
            } else {
                String::new()
            }
        }
        2 | 3 => {
            let head = parts[0]
                .split(' ')
                .next()
                .unwrap_or_default()
                .to_lowercase();
            if head == "le" || head.starts_with("link-") {
                parts[parts.len() - 1].to_string()
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}

/// Collapse language-variant choice blocks `-{…}-`
///
/// Prefers a Simplified-Chinese-tagged variant, falls back to the first
/// colon-delimited variant, then to the raw interior.
fn remove_choices(text: &str) -> String {
    let text = CHOICE_ZH_REGEX.replace_all(text, "$2");
    let text = CHOICE_FIRST_REGEX.replace_all(&text, "$1");
    CHOICE_BARE_REGEX.replace_all(&text, "$1").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plain_text_is_trimmed_identity() {
        // No markup: cleaning only trims.
        let text = "  Plain prose with no markup.\nSecond line.  ";
        assert_eq!(clean_text(text), text.trim());
    }

    #[test]
    fn test_emphasis_unwrap() {
        assert_eq!(clean_text("'''bold''' and ''italic''"), "bold and italic");
    }

    #[test]
    fn test_resource_link_with_nested_brackets() {
        let text = "A [[File:x.jpg|thumb|caption [[with]] nested]] B";
        assert_eq!(clean_text(text), "A  B");
    }

    #[test]
    fn test_image_links_removed() {
        let text = "Start [[Image:foo.png|border]] end";
        assert_eq!(clean_text(text), "Start  end");
    }

    #[test]
    fn test_bare_file_line_stripped() {
        let text = "keep\nFile:orphan.jpg\nkeep too";
        assert_eq!(clean_text(text), "keep\nkeep too");
    }

    #[test]
    fn test_external_link_collapses_to_caption() {
        let text = "See [https://example.org the docs] here";
        assert_eq!(clean_text(text), "See the docs here");
    }

    #[test]
    fn test_refs_removed_both_forms() {
        let text = "a<ref name=x/>b<REF>long\nnote</REF>c";
        assert_eq!(clean_text(text), "abc");
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(clean_text("a<!-- hidden\nstuff -->b"), "ab");
    }

    #[test]
    fn test_lang_template_unwrapped() {
        assert_eq!(clean_text("{{lang-fr|bonjour}} world"), "bonjour world");
    }

    #[test]
    fn test_choice_prefers_simplified_chinese() {
        let text = "-{zh-hant:電腦; zh-hans:计算机}-";
        // The zh-hans variant is matched by the first choice pattern.
        assert!(clean_text(text).contains("计算机"));
    }

    #[test]
    fn test_choice_bare_interior() {
        assert_eq!(clean_text("-{plain}-"), "plain");
    }

    #[test]
    fn test_nested_template_removed_as_unit() {
        let text = "before {{outer|{{inner|x}}|y}} after";
        assert_eq!(clean_text(text), "before  after");
    }

    #[test]
    fn test_unbalanced_template_left_verbatim() {
        let text = "before {{open with no close";
        assert_eq!(clean_text(text), text);
    }

    #[test]
    fn test_template_le_special_case() {
        assert_eq!(remove_templates("{{le|Foo|Bar}}"), "Bar");
        assert_eq!(remove_templates("{{link-en|Foo|Bar}}"), "Bar");
        assert_eq!(remove_templates("{{cite web|url=http://x}}"), "");
    }

    #[test]
    fn test_template_le_two_parts_keeps_target() {
        // Without a display label the target itself is the final part.
        assert_eq!(remove_templates("{{le|Foo}}"), "Foo");
        assert_eq!(remove_templates("{{link-fr|Paris}}"), "Paris");
    }

    #[test]
    fn test_template_quote_only_interior() {
        // The interior is quote-space-quote; only the space is dropped.
        assert_eq!(remove_templates(r#"{{" "}}"#), "\"\"");
        assert_eq!(remove_templates("{{}}"), "");
    }

    #[test]
    fn test_template_four_parts_removed() {
        assert_eq!(remove_templates("{{le|a|b|c|d}}"), "");
    }

    #[test]
    fn test_html_tags_stripped() {
        assert_eq!(clean_text("<div class=\"x\">text</div>"), "text");
    }

    #[test]
    fn test_list_and_indent_markers_stripped() {
        let text = "* item one\n# item two\n: indented\n; term";
        assert_eq!(clean_text(text), "item one\nitem two\nindented\nterm");
    }

    #[test]
    fn test_table_style_block_removed() {
        let text = "a{| style=\"width:100%\" cells |}b";
        assert_eq!(clean_text(text), "ab");
    }

    #[test]
    fn test_zero_width_space_removed() {
        assert_eq!(clean_text("a\u{200B}b"), "ab");
    }

    #[test]
    fn test_newline_runs_collapsed() {
        assert_eq!(clean_text("a\n\n\n\nb"), "a\nb");
    }

    #[test]
    fn test_category_links_survive_cleaning() {
        // Category markers are not resource links; the article transform
        // extracts them after cleaning.
        let text = "'''Hi''' [[Category:Demo]]";
        assert_eq!(clean_text(text), "Hi [[Category:Demo]]");
    }
}
