//! One-off search API probe.

use crate::error::TaskResult;
use crate::matching::SITE_FILTER;
use crate::models::OrganicResult;
use crate::search::WebSearch;

/// Run one RISS-restricted search and return its organic results.
pub async fn probe(search: &dyn WebSearch, query: &str, num: u32) -> TaskResult<Vec<OrganicResult>> {
    let query = if query.contains(SITE_FILTER) {
        query.trim().to_string()
    } else {
        format!("{SITE_FILTER} {}", query.trim())
    };

    let results = search.search(&query, num).await?;
    tracing::info!(query = %query, results = results.len(), "Probe finished");
    Ok(results)
}

/// Human-readable listing: title, link and the first 50 characters of the
/// snippet per result.
#[must_use]
pub fn format_results(results: &[OrganicResult]) -> String {
    let mut out = String::new();
    for (i, item) in results.iter().enumerate() {
        let snippet: String = item.snippet.chars().take(50).collect();
        out.push_str(&format!("[{}] {}\n    {}\n    {snippet}...\n", i + 1, item.title, item.link));
        out.push_str(&"-".repeat(40));
        out.push('\n');
    }
    out
}
