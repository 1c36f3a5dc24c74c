//! Link search for thesis titles.
//!
//! Two strategies, tried in order:
//! 1. Staged web search through the search API (strict, loose,
//!    bracket-stripped, subtitle-stripped), first RISS detail link wins.
//! 2. The repository's own search, candidates ranked by title similarity.

use std::time::Duration;

use crate::error::ClientResult;
use crate::matching::{self, ScoredCandidate};
use crate::models::{OrganicResult, ThesisDetails};

/// A web search backend.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Run one query.
    async fn search(&self, query: &str, num: u32) -> ClientResult<Vec<OrganicResult>>;
}

/// A thesis repository.
#[async_trait::async_trait]
pub trait ThesisSource: Send + Sync {
    /// Scrape a detail page.
    async fn fetch_details(&self, url: &str) -> ClientResult<ThesisDetails>;

    /// `(anchor text, detail URL)` candidates for a title.
    async fn search_candidates(&self, title: &str) -> ClientResult<Vec<(String, String)>>;
}

/// How a link was found.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOrigin {
    /// Staged web search; carries the stage number and label.
    WebSearch {
        /// 1-based stage.
        stage: u8,
        /// Stage label.
        label: &'static str,
    },
    /// Repository search; carries the similarity score.
    Direct {
        /// Similarity of the accepted anchor.
        score: f64,
    },
}

/// A detail link found for a title.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkHit {
    /// Detail page URL.
    pub link: String,

    /// Strategy that produced it.
    pub origin: LinkOrigin,
}

/// Thresholds for repository search.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Drop candidates below this score.
    pub min_score: f64,
    /// Accept the best candidate only at or above this score.
    pub accept_score: f64,
}

/// Staged web search. Errors on one stage are logged and the next stage runs.
pub async fn find_riss_link(
    search: &dyn WebSearch,
    title: &str,
    author: &str,
    num: u32,
    delay: Duration,
) -> Option<LinkHit> {
    for variant in matching::query_variants(title, author) {
        tracing::info!(
            stage = variant.stage,
            label = variant.label,
            query = %variant.query,
            "Search attempt"
        );

        match search.search(&variant.query, num).await {
            Ok(results) => {
                if let Some(hit) = results.iter().find(|r| matching::is_riss_detail_link(&r.link)) {
                    tracing::info!(stage = variant.stage, link = %hit.link, "Link found");
                    return Some(LinkHit {
                        link: hit.link.clone(),
                        origin: LinkOrigin::WebSearch { stage: variant.stage, label: variant.label },
                    });
                }
            }
            Err(e) => {
                tracing::warn!(stage = variant.stage, error = %e, "Search API error");
            }
        }

        tokio::time::sleep(delay).await;
    }

    None
}

/// Repository search ranked by title similarity.
pub async fn find_riss_direct(
    source: &dyn ThesisSource,
    title: &str,
    thresholds: Thresholds,
) -> Option<ScoredCandidate> {
    let candidates = match source.search_candidates(title).await {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(title, error = %e, "Repository search failed");
            return None;
        }
    };

    let best =
        matching::best_match(title, &candidates, thresholds.min_score, thresholds.accept_score);
    match &best {
        Some(c) => tracing::info!(score = c.score, link = %c.link, "Direct match accepted"),
        None => tracing::debug!(title, candidates = candidates.len(), "No direct match"),
    }
    best
}

/// Web search first, repository search as fallback.
#[derive(Clone, Copy)]
pub struct LinkFinder<'a> {
    /// Web search backend.
    pub search: &'a dyn WebSearch,
    /// Repository backend.
    pub source: &'a dyn ThesisSource,
    /// Results requested per query variant.
    pub results_per_query: u32,
    /// Pause between query variants.
    pub delay: Duration,
    /// Repository search thresholds.
    pub thresholds: Thresholds,
}

impl LinkFinder<'_> {
    /// Find a detail link for a title.
    pub async fn find(&self, title: &str, author: &str) -> Option<LinkHit> {
        if let Some(hit) =
            find_riss_link(self.search, title, author, self.results_per_query, self.delay).await
        {
            return Some(hit);
        }

        find_riss_direct(self.source, title, self.thresholds)
            .await
            .map(|c| LinkHit { link: c.link, origin: LinkOrigin::Direct { score: c.score } })
    }
}
