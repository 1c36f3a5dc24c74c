//! Rewrite existing personal sheets from the master data.

use std::fmt;

use chrono::Local;
use serde::Serialize;

use super::provision::{OutputTables, Student, write_formatted};
use super::{TaskContext, is_link};
use crate::config::sheets;
use crate::error::TaskResult;
use crate::google::{RecordStore, spreadsheet_id_from_url};
use crate::models::Table;
use crate::retry::{QuotaBackoff, with_quota_retry};

/// Grid size of a tab added during refresh.
const NEW_TAB_ROWS: usize = 100;
const NEW_TAB_COLS: usize = 20;

/// Outcome counts of a refresh run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Students with a personal sheet.
    pub targets: usize,

    /// Sheets refreshed.
    pub updated: usize,

    /// Sheets that failed.
    pub failed: usize,
}

impl fmt::Display for RefreshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "updated {}/{}, failed {}", self.updated, self.targets, self.failed)
    }
}

/// Rewrite the output tabs of every linked personal sheet.
pub async fn refresh(ctx: &TaskContext) -> TaskResult<RefreshSummary> {
    let master = ctx.master()?;
    let roster = master.read_table(sheets::STUDENT_LIST).await?;
    let outputs = OutputTables::load(&master).await?;

    let students: Vec<Student> = roster
        .records()
        .filter_map(|r| Student::from_record(&r))
        .filter(|s| is_link(&s.link))
        .collect();

    let mut summary = RefreshSummary { targets: students.len(), ..Default::default() };
    tracing::info!(targets = summary.targets, "Refresh started");

    for (n, student) in students.iter().enumerate() {
        tracing::info!(progress = n + 1, total = summary.targets, student = %student.label(), "Refreshing");

        match refresh_student(ctx, student, &outputs).await {
            Ok(()) => {
                summary.updated += 1;
                tokio::time::sleep(ctx.config.tab_delay).await;
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(student = %student.label(), error = %e, "Refresh failed");
                tokio::time::sleep(ctx.config.student_delay).await;
            }
        }
    }

    tracing::info!(%summary, "Refresh finished");
    Ok(summary)
}

async fn refresh_student(ctx: &TaskContext, student: &Student, outputs: &OutputTables) -> TaskResult<()> {
    let spreadsheet_id = spreadsheet_id_from_url(&student.link);
    let policy = QuotaBackoff::refresh(ctx.config.quota_backoff_unit);

    let tables = outputs.for_student(&student.student_id);
    for (i, table) in tables.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(ctx.config.tab_delay).await;
        }
        with_quota_retry(policy, || rewrite_tab(ctx, &spreadsheet_id, table)).await?;
    }

    let info = ctx.sheets.info(&spreadsheet_id).await?;
    if let Some(first) = info.first_sheet() {
        let stamp = format!("✅ 업데이트 완료: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        if let Err(e) = ctx.sheets.update_cell(&spreadsheet_id, &first.title, 6, 0, &stamp).await {
            tracing::warn!(student = %student.label(), error = %e, "Could not stamp update time");
        }
    }
    Ok(())
}

/// Clear a tab (or add it when missing), then write and format the table.
async fn rewrite_tab(ctx: &TaskContext, spreadsheet_id: &str, table: &Table) -> TaskResult<()> {
    let info = ctx.sheets.info(spreadsheet_id).await?;

    let sheet_id = if let Some(existing) = info.sheet(&table.name) {
        ctx.sheets.clear_range(spreadsheet_id, &table.name, "A:ZZ").await?;
        existing.sheet_id
    } else {
        ctx.sheets.add_sheet(spreadsheet_id, &table.name, NEW_TAB_ROWS, NEW_TAB_COLS).await?.sheet_id
    };

    write_formatted(&ctx.sheets, spreadsheet_id, sheet_id, table).await
}
