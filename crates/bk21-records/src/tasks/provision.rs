//! Per-student review folders and sheets.

use std::fmt;

use serde::Serialize;

use super::{TaskContext, is_link};
use crate::config::sheets;
use crate::error::{TaskError, TaskResult};
use crate::google::{RecordStore, SheetsClient, Spreadsheet};
use crate::layout;
use crate::models::{Record, Table};
use crate::retry::{QuotaBackoff, with_quota_retry};

/// Intro tab column width, in pixels.
const INTRO_WIDTH: u32 = 500;
/// Empty rows added below the data of a new tab.
const EXTRA_ROWS: usize = 20;
/// Empty columns added after the data of a new tab.
const EXTRA_COLS: usize = 5;

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    /// Sheet row of the roster entry.
    pub row_number: usize,

    /// Display name.
    pub name: String,

    /// Student number.
    pub student_id: String,

    /// Personal sheet link, possibly empty.
    pub link: String,
}

impl Student {
    /// Read a roster row; `None` when name or student number is missing.
    #[must_use]
    pub fn from_record(record: &Record<'_>) -> Option<Self> {
        let name = record.get(sheets::NAME);
        let student_id = record.get(sheets::STUDENT_NO);
        if name.is_empty() || student_id.is_empty() {
            return None;
        }
        Some(Self {
            row_number: record.row_number,
            name: name.to_string(),
            student_id: student_id.to_string(),
            link: record.get(sheets::PERSONAL_LINK).to_string(),
        })
    }

    /// `<name>_<student id>`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}_{}", self.name, self.student_id)
    }
}

/// The three output tabs of the master spreadsheet.
#[derive(Debug, Clone)]
pub struct OutputTables {
    tables: Vec<Table>,
}

impl OutputTables {
    /// Read every output tab.
    pub async fn load(store: &dyn RecordStore) -> TaskResult<Self> {
        let mut tables = Vec::with_capacity(sheets::OUTPUT_TABS.len());
        for tab in sheets::OUTPUT_TABS {
            tables.push(store.read_table(tab).await?);
        }
        Ok(Self { tables })
    }

    /// Build from tables already in memory.
    #[must_use]
    pub fn from_tables(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Rows of one student, per tab, matched on `학번`.
    #[must_use]
    pub fn for_student(&self, student_id: &str) -> Vec<Table> {
        self.tables.iter().map(|t| t.filter_by(sheets::STUDENT_ID, student_id)).collect()
    }
}

/// Outcome counts of a provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionSummary {
    /// Sheets created.
    pub created: usize,

    /// Roster rows skipped (incomplete, or already linked).
    pub skipped: usize,

    /// Students that failed.
    pub failed: usize,
}

impl fmt::Display for ProvisionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "created {}, skipped {}, failed {}", self.created, self.skipped, self.failed)
    }
}

fn intro_lines(name: &str) -> Vec<Vec<String>> {
    [
        format!("안녕하세요 {name}님,"),
        "이 시트는 본인이 앱을 통해 입력한 연구성과를 확인하는 페이지입니다.".to_string(),
        "각 탭(논문, 저서, 학술대회)을 눌러 입력 내용을 확인해 주세요.".to_string(),
        "⚠️ 내용이 길어 잘린 부분은 자동으로 줄바꿈 되어 표시됩니다.".to_string(),
        "수정 요청은 회신 메일로 주시면 반영하겠습니다.".to_string(),
    ]
    .into_iter()
    .map(|line| vec![line])
    .collect()
}

/// Write a table at A1 of a tab and apply the column layout.
pub(crate) async fn write_formatted(
    sheets: &SheetsClient,
    spreadsheet_id: &str,
    sheet_id: i64,
    table: &Table,
) -> TaskResult<()> {
    sheets.update_range(spreadsheet_id, &table.name, "A1", &table.to_values()).await?;
    sheets.batch_update(spreadsheet_id, layout::tab_format_requests(sheet_id, table)).await?;
    Ok(())
}

/// Create every personal folder and sheet that does not exist yet.
pub async fn provision(ctx: &TaskContext) -> TaskResult<ProvisionSummary> {
    let master = ctx.master()?;
    let roster = master.read_table(sheets::STUDENT_LIST).await?;
    let link_col = roster.require_column(sheets::PERSONAL_LINK)?;
    let outputs = OutputTables::load(&master).await?;

    let root = ctx
        .drive
        .find_folder(sheets::ROOT_FOLDER, None)
        .await?
        .ok_or_else(|| TaskError::Missing(format!("Drive folder '{}'", sheets::ROOT_FOLDER)))?;
    let campaign = ctx.drive.find_or_create_folder(sheets::CAMPAIGN_FOLDER, Some(&root)).await?;

    let policy = QuotaBackoff::provisioning(ctx.config.quota_backoff_unit);
    let mut summary = ProvisionSummary::default();

    for record in roster.records() {
        let Some(student) = Student::from_record(&record) else {
            summary.skipped += 1;
            continue;
        };
        if is_link(&student.link) {
            summary.skipped += 1;
            continue;
        }

        tracing::info!(student = %student.label(), "Provisioning");
        match provision_student(ctx, policy, &master, &campaign, &student, &outputs, link_col).await {
            Ok(url) => {
                summary.created += 1;
                tracing::info!(student = %student.label(), %url, "Personal sheet ready");
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(student = %student.label(), error = %e, "Provisioning failed");
            }
        }

        tokio::time::sleep(ctx.config.student_delay).await;
    }

    tracing::info!(%summary, "Provisioning finished");
    Ok(summary)
}

/// Each API call is retried on its own, so a quota error never repeats a
/// step that already succeeded.
async fn provision_student(
    ctx: &TaskContext,
    policy: QuotaBackoff,
    master: &Spreadsheet,
    campaign: &str,
    student: &Student,
    outputs: &OutputTables,
    link_col: usize,
) -> TaskResult<String> {
    let label = student.label();
    let folder =
        with_quota_retry(policy, || ctx.drive.find_or_create_folder(&label, Some(campaign))).await?;
    if let Err(e) = with_quota_retry(policy, || ctx.drive.make_public(&folder)).await {
        tracing::warn!(folder = %folder, error = %e, "Could not share folder");
    }

    let title = format!("[성과확인] {label}");
    let created = with_quota_retry(policy, || ctx.sheets.create_spreadsheet(&title)).await?;
    let id = created.id.as_str();
    with_quota_retry(policy, || ctx.drive.move_file(id, &folder)).await?;

    let intro_id = created.first_sheet().map_or(0, |s| s.sheet_id);
    let intro = intro_lines(&student.name);
    with_quota_retry(policy, || ctx.sheets.rename_sheet(id, intro_id, sheets::INTRO)).await?;
    with_quota_retry(policy, || ctx.sheets.update_range(id, sheets::INTRO, "A1", &intro)).await?;
    with_quota_retry(policy, || {
        ctx.sheets.batch_update(id, vec![layout::column_width_request(intro_id, 0, INTRO_WIDTH)])
    })
    .await?;

    for table in outputs.for_student(&student.student_id) {
        let rows = table.len() + 1 + EXTRA_ROWS;
        let cols = table.headers.len() + EXTRA_COLS;
        let tab = with_quota_retry(policy, || ctx.sheets.add_sheet(id, &table.name, rows, cols)).await?;
        with_quota_retry(policy, || write_formatted(&ctx.sheets, id, tab.sheet_id, &table)).await?;
    }

    with_quota_retry(policy, || {
        master.update_cell(sheets::STUDENT_LIST, student.row_number, link_col, &created.url)
    })
    .await?;
    Ok(created.url)
}
