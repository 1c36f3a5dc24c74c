//! Title normalization, similarity scoring and search query variants.
//!
//! Thesis titles in the roster are typed by students and rarely match the
//! repository record exactly: Hanja glosses in brackets, subtitles after a
//! colon, stray punctuation. Matching therefore works on normalized text and
//! a character-level diff ratio.

use std::sync::LazyLock;

use regex::Regex;
use similar::TextDiff;
use url::Url;

use crate::config::matching::MAX_QUERY_CHARS;

/// Site restriction prepended to every search query.
pub const SITE_FILTER: &str = "site:riss.kr";

/// Lowercase, then keep alphanumeric characters only (Hangul included).
#[must_use]
pub fn normalize(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).filter(|c| c.is_alphanumeric()).collect()
}

/// Similarity ratio in `[0, 1]` between two titles after normalization.
///
/// Computed as `2 * matches / total_chars` over a character diff. Two empty
/// strings score 0 so blank anchors never win.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    f64::from(TextDiff::from_chars(a.as_str(), b.as_str()).ratio())
}

/// Remove `(...)` and `[...]` groups and collapse whitespace.
///
/// Returns the original title when fewer than two characters would remain.
#[must_use]
pub fn clean_brackets(title: &str) -> String {
    static GROUPS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").expect("valid bracket pattern"));

    let stripped = GROUPS.replace_all(title, "");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() < 2 { title.to_string() } else { cleaned }
}

/// Main title: text before the first `:`, `-` or `=`, trimmed.
#[must_use]
pub fn main_title(title: &str) -> String {
    title.split([':', '-', '=']).next().unwrap_or("").trim().to_string()
}

/// Cut a query to the search API limit on a character boundary.
#[must_use]
pub fn truncate_query(query: &str) -> String {
    query.chars().take(MAX_QUERY_CHARS).collect()
}

/// One search attempt of the staged fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryVariant {
    /// 1-based stage number.
    pub stage: u8,

    /// Human-readable label for logs.
    pub label: &'static str,

    /// Full query string including the site filter.
    pub query: String,
}

/// Build the staged query list for a title and author.
///
/// 1. strict: quoted title
/// 2. loose: unquoted title
/// 3. brackets removed (only if that changes the title)
/// 4. subtitle removed (only if different from 1 and 3 and at least two chars)
#[must_use]
pub fn query_variants(title: &str, author: &str) -> Vec<QueryVariant> {
    let title = title.trim();
    let author = author.trim();
    let build = |body: &str| truncate_query(format!("{SITE_FILTER} {body} {author}").trim_end());

    let mut variants = vec![
        QueryVariant { stage: 1, label: "strict", query: build(&format!("\"{title}\"")) },
        QueryVariant { stage: 2, label: "loose", query: build(title) },
    ];

    let cleaned = clean_brackets(title);
    if cleaned != title {
        variants.push(QueryVariant { stage: 3, label: "brackets-removed", query: build(&cleaned) });
    }

    let main = main_title(title);
    if main != title && main != cleaned && main.chars().count() >= 2 {
        variants.push(QueryVariant { stage: 4, label: "subtitle-removed", query: build(&main) });
    }

    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| seen.insert(v.query.clone()));
    variants
}

/// True for RISS detail-page URLs.
#[must_use]
pub fn is_riss_detail_link(link: &str) -> bool {
    link.contains("riss.kr") && link.contains("DetailView")
}

/// `control_no` query parameter of a RISS URL, or an empty string.
#[must_use]
pub fn control_no(link: &str) -> String {
    Url::parse(link)
        .ok()
        .and_then(|url| {
            url.query_pairs().find(|(k, _)| k == "control_no").map(|(_, v)| v.into_owned())
        })
        .unwrap_or_default()
}

/// A candidate link with its similarity to the wanted title.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// Anchor text.
    pub text: String,

    /// Target URL.
    pub link: String,

    /// Similarity to the wanted title.
    pub score: f64,
}

/// Score candidates, drop those below `min_score`, best first.
/// Ties keep page order.
#[must_use]
pub fn rank_candidates(
    title: &str,
    candidates: &[(String, String)],
    min_score: f64,
) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|(text, link)| ScoredCandidate {
            text: text.clone(),
            link: link.clone(),
            score: similarity(title, text),
        })
        .filter(|c| c.score >= min_score)
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Best candidate, only if it reaches `accept_score`.
#[must_use]
pub fn best_match(
    title: &str,
    candidates: &[(String, String)],
    min_score: f64,
    accept_score: f64,
) -> Option<ScoredCandidate> {
    rank_candidates(title, candidates, min_score)
        .into_iter()
        .next()
        .filter(|c| c.score >= accept_score)
}

/// File-name-safe stem: alphanumerics, space and `_`, at most 30 chars.
#[must_use]
pub fn safe_file_stem(title: &str) -> String {
    let kept: String =
        title.chars().filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_').collect();
    kept.trim().chars().take(30).collect()
}
