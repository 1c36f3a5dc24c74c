//! Batch tasks, one per CLI subcommand.
//!
//! Every task returns a summary; per-record failures are logged and
//! counted, only setup failures abort a run.

pub mod clone_dataset;
pub mod collect;
pub mod dump;
pub mod mailing;
pub mod probe;
pub mod provision;
pub mod refresh;
pub mod reset;
pub mod submit;

use crate::config::Config;
use crate::error::{ClientResult, TaskError, TaskResult};
use crate::google::{DriveClient, GoogleClient, SheetsClient, Spreadsheet};

pub use clone_dataset::{CloneSummary, clone_dataset};
pub use collect::{CollectOptions, CollectSummary, collect};
pub use dump::dump;
pub use mailing::{Campaign, MailOptions, MailSummary, run_campaign};
pub use probe::probe;
pub use provision::{ProvisionSummary, provision};
pub use refresh::{RefreshSummary, refresh};
pub use reset::{ResetSummary, reset};
pub use submit::{load_submission, submit};

/// Shared Google clients for the Drive/Sheets tasks.
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Runtime configuration.
    pub config: Config,

    /// Sheets client.
    pub sheets: SheetsClient,

    /// Drive client.
    pub drive: DriveClient,
}

impl TaskContext {
    /// Build the clients on one authenticated base client.
    #[must_use]
    pub fn new(config: Config, google: GoogleClient) -> Self {
        Self {
            sheets: SheetsClient::new(&config, google.clone()),
            drive: DriveClient::new(&config, google),
            config,
        }
    }

    /// Build the clients with credentials discovered from the config paths.
    pub fn from_config(config: Config) -> ClientResult<Self> {
        let google = GoogleClient::from_config(&config)?;
        Ok(Self::new(config, google))
    }

    /// The master spreadsheet (`GOOGLE_SHEET_ID`).
    pub fn master(&self) -> TaskResult<Spreadsheet> {
        self.config
            .source_sheet
            .as_deref()
            .map(|id| self.sheets.open(id))
            .ok_or_else(|| TaskError::config("GOOGLE_SHEET_ID is not set"))
    }

    /// The working dataset (`TARGET_SHEET_ID`).
    pub fn target(&self) -> TaskResult<Spreadsheet> {
        self.config
            .target_sheet
            .as_deref()
            .map(|id| self.sheets.open(id))
            .ok_or_else(|| TaskError::config("TARGET_SHEET_ID is not set"))
    }
}

/// A link cell that already holds a URL.
pub(crate) fn is_link(value: &str) -> bool {
    value.trim().starts_with("http")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_link() {
        assert!(is_link(" https://docs.google.com/x"));
        assert!(!is_link("검색실패"));
        assert!(!is_link(""));
    }

    #[test]
    fn test_master_requires_sheet_id() {
        let config = Config::for_testing("http://localhost:1");
        let google = GoogleClient::new(
            &config,
            std::sync::Arc::new(crate::google::TokenProvider::fixed(&config, "t").unwrap()),
        )
        .unwrap();
        let ctx = TaskContext::new(config, google);

        assert!(matches!(ctx.master(), Err(TaskError::Config(_))));
        assert!(matches!(ctx.target(), Err(TaskError::Config(_))));
    }
}
