//! Batch enrichment of the paper tab with RISS metadata.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::sheets;
use crate::error::TaskResult;
use crate::google::RecordStore;
use crate::matching;
use crate::models::ThesisDetails;
use crate::search::LinkFinder;

/// Collection run settings.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Tab holding the papers.
    pub tab: String,

    /// Pause after each searched row.
    pub row_delay: Duration,

    /// Stop after this many searched rows.
    pub limit: Option<usize>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self { tab: sheets::PAPER.to_string(), row_delay: Duration::ZERO, limit: None }
    }
}

/// Outcome counts of a collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectSummary {
    /// Rows searched.
    pub searched: usize,

    /// Rows that got a link.
    pub found: usize,

    /// Rows where every search failed.
    pub not_found: usize,

    /// Rows skipped (no title, or already linked).
    pub skipped: usize,

    /// Rows whose results could not be written.
    pub write_errors: usize,
}

impl fmt::Display for CollectSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "searched {}, found {}, not found {}, skipped {}, write errors {}",
            self.searched, self.found, self.not_found, self.skipped, self.write_errors
        )
    }
}

/// Find a RISS link for every unlinked paper and write its id, link,
/// abstract and keywords back to the sheet.
pub async fn collect(
    store: &dyn RecordStore,
    finder: &LinkFinder<'_>,
    options: &CollectOptions,
) -> TaskResult<CollectSummary> {
    let mut table = store.read_table(&options.tab).await?;
    table.require_column(sheets::TITLE)?;

    let columns = store.ensure_columns(&mut table, &sheets::ENRICHMENT_COLUMNS).await?;
    let [id_col, link_col, abstract_col, keywords_col] = [columns[0], columns[1], columns[2], columns[3]];

    tracing::info!(tab = %options.tab, rows = table.len(), "Collection started");
    let mut summary = CollectSummary::default();

    for record in table.records() {
        if options.limit.is_some_and(|limit| summary.searched >= limit) {
            break;
        }

        let title = record.get(sheets::TITLE);
        let author = record.get(sheets::AUTHOR);
        let existing = record.get(sheets::RISS_LINK);

        if title.is_empty() || existing.contains("http") {
            summary.skipped += 1;
            continue;
        }

        summary.searched += 1;
        tracing::info!(row = record.row_number, title, author, "Searching");

        if let Some(hit) = finder.find(title, author).await {
            summary.found += 1;
            let details = match finder.source.fetch_details(&hit.link).await {
                Ok(details) => details,
                Err(e) => {
                    tracing::warn!(link = %hit.link, error = %e, "Detail scrape failed");
                    ThesisDetails { control_no: matching::control_no(&hit.link), ..Default::default() }
                }
            };

            let abstract_cell: String =
                details.abstract_text.chars().take(sheets::ABSTRACT_LIMIT).collect();
            let writes = [
                (id_col, details.control_no.as_str()),
                (link_col, hit.link.as_str()),
                (abstract_col, abstract_cell.as_str()),
                (keywords_col, details.keywords.as_str()),
            ];

            for (col, value) in writes {
                if let Err(e) = store.update_cell(&table.name, record.row_number, col, value).await {
                    tracing::warn!(row = record.row_number, error = %e, "Write failed");
                    summary.write_errors += 1;
                    break;
                }
            }
            tracing::info!(row = record.row_number, control_no = %details.control_no, "Collected");
        } else {
            summary.not_found += 1;
            tracing::warn!(row = record.row_number, title, "Every search attempt failed");

            if existing.is_empty() {
                if let Err(e) = store
                    .update_cell(&table.name, record.row_number, link_col, sheets::SEARCH_FAILED)
                    .await
                {
                    tracing::warn!(row = record.row_number, error = %e, "Write failed");
                    summary.write_errors += 1;
                }
            }
        }

        tokio::time::sleep(options.row_delay).await;
    }

    tracing::info!(%summary, "Collection finished");
    Ok(summary)
}
