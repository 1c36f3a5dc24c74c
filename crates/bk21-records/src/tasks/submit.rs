//! Append a student's submission to the intake sheet.

use std::path::Path;

use crate::error::TaskResult;
use crate::google::RecordStore;
use crate::models::Submission;

/// Read a submission from a JSON file.
pub async fn load_submission(path: &Path) -> TaskResult<Submission> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}

/// Validate and append one row per output to `tab`. Returns the number of
/// rows written.
pub async fn submit(
    store: &dyn RecordStore,
    tab: &str,
    submission: &Submission,
    timestamp: &str,
) -> TaskResult<usize> {
    submission.validate()?;

    let rows = submission.to_rows(timestamp);
    store.append_rows(tab, &rows).await?;

    tracing::info!(
        student = %submission.student_id,
        rows = rows.len(),
        tab,
        "Submission saved"
    );
    Ok(rows.len())
}
