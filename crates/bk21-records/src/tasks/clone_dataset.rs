//! Copy the source dataset into the project folder.

use std::fmt;

use serde::Serialize;

use super::TaskContext;
use crate::config::sheets;
use crate::error::{ClientError, TaskError, TaskResult};
use crate::google::sheets::spreadsheet_id_from_url;

/// The copy that was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneSummary {
    /// Project folder id.
    pub folder_id: String,

    /// Name of the source file.
    pub source_name: String,

    /// Id of the copy.
    pub copy_id: String,

    /// Browser link of the copy.
    pub link: Option<String>,
}

impl fmt::Display for CloneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "copied '{}' into folder {}", self.source_name, self.folder_id)?;
        writeln!(f, "new dataset id: {}", self.copy_id)?;
        if let Some(link) = &self.link {
            writeln!(f, "link: {link}")?;
        }
        write!(f, "set TARGET_SHEET_ID to the new id before running `collect`")
    }
}

/// Find or create the project folder and copy the source spreadsheet into it.
pub async fn clone_dataset(ctx: &TaskContext, new_name: &str) -> TaskResult<CloneSummary> {
    let source = ctx
        .config
        .source_sheet
        .as_deref()
        .map(spreadsheet_id_from_url)
        .ok_or_else(|| TaskError::config("GOOGLE_SHEET_ID is not set"))?;

    let folder_id = ctx.drive.find_or_create_folder(sheets::PROJECT_FOLDER, None).await?;

    let origin = ctx.drive.get(&source).await.map_err(|e| match e {
        ClientError::NotFound { .. } => {
            TaskError::Missing(format!("source spreadsheet {source}; check GOOGLE_SHEET_ID"))
        }
        other => other.into(),
    })?;
    tracing::info!(name = %origin.name, "Source dataset found");

    let copy = ctx.drive.copy_file(&source, &folder_id, new_name).await?;

    Ok(CloneSummary {
        folder_id,
        source_name: origin.name,
        copy_id: copy.id,
        link: copy.web_view_link,
    })
}
