//! Undo a provisioning run.

use std::fmt;

use serde::Serialize;

use super::TaskContext;
use crate::config::sheets;
use crate::error::TaskResult;
use crate::google::RecordStore;

/// What the reset did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResetSummary {
    /// The campaign folder existed and was deleted.
    pub folder_deleted: bool,

    /// The link column was cleared.
    pub links_cleared: bool,
}

impl fmt::Display for ResetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let folder = if self.folder_deleted { "deleted" } else { "not present" };
        let links = if self.links_cleared { "cleared" } else { "untouched" };
        write!(f, "campaign folder {folder}, personal links {links}")
    }
}

/// Delete the campaign folder and clear the personal link column.
///
/// A missing or undeletable folder is logged; the links are cleared either way.
pub async fn reset(ctx: &TaskContext) -> TaskResult<ResetSummary> {
    let mut summary = ResetSummary::default();

    match delete_campaign_folder(ctx).await {
        Ok(deleted) => summary.folder_deleted = deleted,
        Err(e) => tracing::warn!(folder = sheets::CAMPAIGN_FOLDER, error = %e, "Could not delete campaign folder"),
    }

    let master = ctx.master()?;
    let roster = master.read_table(sheets::STUDENT_LIST).await?;
    let link_col = roster.require_column(sheets::PERSONAL_LINK)?;

    master.clear_column(sheets::STUDENT_LIST, link_col, 2).await?;
    summary.links_cleared = true;

    tracing::info!(%summary, "Reset finished");
    Ok(summary)
}

/// True when the folder existed and is now gone.
async fn delete_campaign_folder(ctx: &TaskContext) -> TaskResult<bool> {
    let Some(root) = ctx.drive.find_folder(sheets::ROOT_FOLDER, None).await? else {
        tracing::warn!(folder = sheets::ROOT_FOLDER, "Root folder not found");
        return Ok(false);
    };

    match ctx.drive.find_folder(sheets::CAMPAIGN_FOLDER, Some(&root)).await? {
        Some(folder) => {
            ctx.drive.delete(&folder).await?;
            Ok(true)
        }
        None => {
            tracing::info!(folder = sheets::CAMPAIGN_FOLDER, "Nothing to delete");
            Ok(false)
        }
    }
}
