//! RISS page parsing.
//!
//! Detail pages render the abstract, table of contents and keyword line as
//! plain blocks inside `body`. Collapsed sections are hidden with CSS only,
//! so the full text is already present in the served HTML.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::matching::is_riss_detail_link;

/// Abstract fallback when nothing could be extracted.
pub const NO_ABSTRACT: &str = "초록 없음";

/// Title fallback when the page has no `h3`.
pub const NO_TITLE: &str = "제목_없음";

/// Excerpt length when an abstract has no terminating section.
const ABSTRACT_EXCERPT: usize = 1500;

/// Keyword lines at or above this length are body text, not a keyword list.
const KEYWORD_LINE_LIMIT: usize = 300;

/// Content shorter than this triggers the whole-body fallback.
const MIN_CONTENT_CHARS: usize = 50;

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "dt", "dd", "table", "ul",
    "ol", "section", "article",
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid static selector")
}

/// Visible text of an element, one line per block element.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);

    out.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if matches!(name, "script" | "style" | "noscript") {
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            collect_text(child_el, out);
            if block {
                out.push('\n');
            }
        }
    }
}

/// Visible text of `body`.
#[must_use]
pub fn document_text(document: &Html) -> String {
    document.select(&selector("body")).next().map(element_text).unwrap_or_default()
}

/// Text of the first element matching `css`, if any.
#[must_use]
pub fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    document.select(&sel).next().map(element_text)
}

/// Longest `h3` text on the page.
#[must_use]
pub fn extract_title(document: &Html) -> String {
    document
        .select(&selector("h3"))
        .map(element_text)
        .max_by_key(|t| t.chars().count())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}

fn section_after(text: &str, marker: &str, terminator: &str) -> Option<String> {
    let (_, rest) = text.split_once(marker)?;
    Some(match rest.split_once(terminator) {
        Some((body, _)) => body.to_string(),
        None => rest.chars().take(ABSTRACT_EXCERPT).collect(),
    })
}

/// Abstract: Korean section first, then English, then `div.additionalInfo`.
#[must_use]
pub fn extract_abstract(text: &str, document: &Html) -> String {
    section_after(text, "국문초록", "목차")
        .or_else(|| section_after(text, "Abstract", "Table of Contents"))
        .or_else(|| first_text(document, "div.additionalInfo"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| NO_ABSTRACT.to_string())
}

/// Keyword line with its label removed, or empty.
#[must_use]
pub fn extract_keywords(text: &str) -> String {
    for line in text.lines() {
        if line.chars().count() >= KEYWORD_LINE_LIMIT {
            continue;
        }
        if line.contains("주제어") {
            return line.replace("주제어", "").trim().to_string();
        }
        if line.contains("Keywords") {
            return line.replace("Keywords", "").trim().to_string();
        }
    }
    String::new()
}

/// Long-form content for a text dump: additional info plus the body block,
/// falling back to everything after the Korean abstract marker.
#[must_use]
pub fn extract_content(document: &Html) -> String {
    let mut content = String::new();
    if let Some(info) = first_text(document, "div.additionalInfo") {
        content.push_str(&info);
        content.push_str("\n\n");
    }
    if let Some(body) = first_text(document, "div.text") {
        content.push_str(&body);
    }

    if content.chars().count() < MIN_CONTENT_CHARS {
        let full = document_text(document);
        if let Some((_, rest)) = full.split_once("국문초록") {
            content = rest.to_string();
        }
    }

    content
}

/// `(anchor text, absolute URL)` for every detail-page link on a search
/// results page. Duplicate URLs keep their first anchor.
#[must_use]
pub fn search_result_anchors(document: &Html, base: &Url) -> Vec<(String, String)> {
    let mut seen = std::collections::HashSet::new();

    document
        .select(&selector("a[href]"))
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let absolute = base.join(href).ok()?.to_string();
            if !is_riss_detail_link(&absolute) {
                return None;
            }
            let text = element_text(a).replace('\n', " ");
            if text.trim().is_empty() || !seen.insert(absolute.clone()) {
                return None;
            }
            Some((text.trim().to_string(), absolute))
        })
        .collect()
}
