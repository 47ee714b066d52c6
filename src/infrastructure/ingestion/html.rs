//! HTML page text extraction

use scraper::{ElementRef, Html, Selector};

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "head", "nav", "footer", "svg", "form", "button",
];

const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "section",
    "article",
    "main",
    "ul",
    "ol",
    "table",
    "tr",
    "blockquote",
    "pre",
    "figure",
    "figcaption",
];

/// Readable text of one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Extracts block-structured text from HTML.
///
/// Headings become `#`-prefixed lines and blocks are separated by blank
/// lines, so the recursive chunker can split on both.
#[derive(Debug, Clone, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, url: impl Into<String>, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);

        ParsedPage {
            url: url.into(),
            title: Self::extract_title(&document),
            text: Self::extract_text(&document),
        }
    }

    fn extract_title(document: &Html) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;
        document
            .select(&title_selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty())
    }

    /// Prefer the `<article>` element, then `<body>`, then the whole tree
    fn extract_text(document: &Html) -> String {
        let root = ["article", "body"]
            .iter()
            .filter_map(|tag| Selector::parse(tag).ok())
            .find_map(|sel| document.select(&sel).next())
            .unwrap_or_else(|| document.root_element());

        let mut text = String::new();
        Self::walk(&root, &mut text);

        normalize_blocks(&text)
    }

    fn walk(element: &ElementRef, out: &mut String) {
        for node in element.children() {
            if let Some(el) = ElementRef::wrap(node) {
                let tag = el.value().name();

                if SKIPPED_TAGS.contains(&tag) {
                    continue;
                }

                if let Some(level) = heading_level(tag) {
                    out.push_str("\n\n");
                    out.push_str(&"#".repeat(level));
                    out.push(' ');
                    Self::walk(&el, out);
                    out.push_str("\n\n");
                } else if tag == "br" {
                    out.push('\n');
                } else if tag == "li" {
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                    out.push_str("- ");
                    Self::walk(&el, out);
                    out.push('\n');
                } else if BLOCK_TAGS.contains(&tag) {
                    out.push_str("\n\n");
                    Self::walk(&el, out);
                    out.push_str("\n\n");
                } else {
                    Self::walk(&el, out);
                }
            } else if let Some(text) = node.value().as_text() {
                push_inline(out, text);
            }
        }
    }
}

fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append a text node with internal whitespace collapsed, keeping one space
/// at either edge so adjacent inline elements stay separated
fn push_inline(out: &mut String, text: &str) {
    let collapsed = collapse_whitespace(text);

    if collapsed.is_empty() {
        if !text.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        return;
    }

    if text.starts_with(char::is_whitespace) && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&collapsed);
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

/// Trim every line and keep at most one blank line between blocks
fn normalize_blocks(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut blank_run = false;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            blank_run = !result.is_empty();
            continue;
        }

        if !result.is_empty() {
            result.push_str(if blank_run { "\n\n" } else { "\n" });
        }
        result.push_str(line);
        blank_run = false;
    }

    result
}
