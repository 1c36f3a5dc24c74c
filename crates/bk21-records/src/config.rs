//! Configuration for the BK21 records toolkit.

use std::path::PathBuf;
use std::time::Duration;

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Serper search endpoint.
    pub const SERPER_SEARCH: &str = "https://google.serper.dev/search";

    /// RISS web root.
    pub const RISS_BASE: &str = "https://www.riss.kr";

    /// Google Sheets v4 REST root.
    pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4";

    /// Google Drive v3 REST root.
    pub const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";

    /// Gmail v1 REST root.
    pub const GMAIL_API: &str = "https://gmail.googleapis.com/gmail/v1";

    /// OAuth token endpoint.
    pub const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

    /// Browser-like user agent; RISS serves an empty shell to unknown agents.
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Pause between query variants sent to the search API.
    pub const SEARCH_DELAY: Duration = Duration::from_millis(500);

    /// Pause between spreadsheet rows during a collection run.
    pub const ROW_DELAY: Duration = Duration::from_secs(2);

    /// Pause between students during provisioning and refresh.
    pub const STUDENT_DELAY: Duration = Duration::from_secs(5);

    /// Pause between tabs of one student sheet during refresh.
    pub const TAB_DELAY: Duration = Duration::from_secs(2);

    /// Transport-level retries for transient failures.
    pub const MAX_TRANSPORT_RETRIES: u32 = 3;

    /// Google OAuth scopes used by every Google call.
    pub const SCOPES: &[&str] = &[
        "https://www.googleapis.com/auth/drive",
        "https://www.googleapis.com/auth/spreadsheets",
        "https://www.googleapis.com/auth/gmail.send",
    ];
}

/// Sheet tabs, column headers and status markers of the master spreadsheet.
pub mod sheets {
    /// Student roster used by provisioning.
    pub const STUDENT_LIST: &str = "mail_list";
    /// Roster used by the check campaign.
    pub const CHECK_LIST: &str = "check_list";
    /// Roster used by the remind campaign.
    pub const REMIND_LIST: &str = "remind_list";
    /// Roster used by the invite campaign.
    pub const INVITE_LIST: &str = "test";

    /// Journal papers.
    pub const PAPER: &str = "논문";
    /// Books.
    pub const BOOK: &str = "저서";
    /// Conference talks.
    pub const CONFERENCE: &str = "학술대회";
    /// Intro tab of a personal sheet.
    pub const INTRO: &str = "안내";

    /// Output tabs copied into every personal sheet, in order.
    pub const OUTPUT_TABS: [&str; 3] = [PAPER, BOOK, CONFERENCE];

    /// Display name column of the rosters.
    pub const NAME: &str = "Name_2";
    /// Lowercase display name column used by the mail rosters.
    pub const NAME_LOWER: &str = "name_2";
    /// Student number column of the rosters.
    pub const STUDENT_NO: &str = "Student_No";
    /// Student number column of the output tabs.
    pub const STUDENT_ID: &str = "학번";
    /// Author name column of the paper tab.
    pub const AUTHOR: &str = "이름";
    /// Paper title column.
    pub const TITLE: &str = "논문명";
    /// Email columns, in lookup order.
    pub const EMAIL: &[&str] = &["email", "E-mail"];
    /// Personal sheet link column.
    pub const PERSONAL_LINK: &str = "개별시트링크";
    /// Mail status column.
    pub const MAIL_STATUS: &str = "발송여부";
    /// "Has results" flag column of the paper tab.
    pub const HAS_RESULTS: &str = "연구성과유무";

    /// Enrichment columns appended by a collection run.
    pub const PAPER_ID: &str = "논문ID";
    pub const RISS_LINK: &str = "RISS_링크";
    pub const ABSTRACT: &str = "초록";
    pub const KEYWORDS: &str = "주제어";
    pub const ENRICHMENT_COLUMNS: [&str; 4] = [PAPER_ID, RISS_LINK, ABSTRACT, KEYWORDS];

    /// Marker written after a mail was sent.
    pub const SENT: &str = "Sent";
    /// Marker written when every search attempt failed.
    pub const SEARCH_FAILED: &str = "검색실패";
    /// Value of the "has results" flag meaning no output.
    pub const NO_RESULTS: &str = "X";

    /// Abstract cells are cut to this many characters.
    pub const ABSTRACT_LIMIT: usize = 4000;

    /// Drive folder holding campaign folders.
    pub const ROOT_FOLDER: &str = "05. Temporary";
    /// Campaign folder holding one folder per student.
    pub const CAMPAIGN_FOLDER: &str = "[중요] 2025 연구성과 개인별 확인";
    /// Project folder for the cloned dataset.
    pub const PROJECT_FOLDER: &str = "[Project] R-E_Network_DB (Research-Education Linkage)";
    /// Name of the cloned dataset.
    pub const DATASET_NAME: &str = "MASTER_DATASET_v1 (Do Not Delete)";
}

/// Fuzzy title matching thresholds.
pub mod matching {
    /// Candidates scoring below this are discarded.
    pub const MIN_SCORE: f64 = 0.3;
    /// The best candidate is accepted only at or above this score.
    pub const ACCEPT_SCORE: f64 = 0.6;
    /// Search API queries are cut to this many characters.
    pub const MAX_QUERY_CHARS: usize = 300;
    /// Results requested per query variant.
    pub const RESULTS_PER_QUERY: u32 = 3;
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Serper API key.
    pub serper_api_key: Option<String>,

    /// Serper search endpoint (for testing with mock servers).
    pub serper_url: String,

    /// RISS web root.
    pub riss_url: String,

    /// Sheets API root.
    pub sheets_api_url: String,

    /// Drive API root.
    pub drive_api_url: String,

    /// Gmail API root.
    pub gmail_api_url: String,

    /// Token endpoint override. `None` uses the one in the credentials file.
    pub token_url: Option<String>,

    /// Service account key file.
    pub service_account_path: PathBuf,

    /// Authorized-user token file with a refresh token.
    pub token_path: PathBuf,

    /// Source dataset spreadsheet (id or URL).
    pub source_sheet: Option<String>,

    /// Working dataset spreadsheet (id or URL).
    pub target_sheet: Option<String>,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Transport retries for transient failures.
    pub max_transport_retries: u32,

    /// Pause between search query variants.
    pub search_delay: Duration,

    /// Pause between rows of a collection run.
    pub row_delay: Duration,

    /// Pause between students.
    pub student_delay: Duration,

    /// Pause between tabs of one student sheet.
    pub tab_delay: Duration,

    /// Base wait of the quota backoff policies.
    pub quota_backoff_unit: Duration,

    /// Minimum candidate score for direct search.
    pub min_score: f64,

    /// Acceptance score for direct search.
    pub accept_score: f64,
}

impl Config {
    /// Create a configuration with production endpoints.
    #[must_use]
    pub fn new(serper_api_key: Option<String>) -> Self {
        Self {
            serper_api_key,
            serper_url: api::SERPER_SEARCH.to_string(),
            riss_url: api::RISS_BASE.to_string(),
            sheets_api_url: api::SHEETS_API.to_string(),
            drive_api_url: api::DRIVE_API.to_string(),
            gmail_api_url: api::GMAIL_API.to_string(),
            token_url: None,
            service_account_path: PathBuf::from("service_account.json"),
            token_path: PathBuf::from("token.json"),
            source_sheet: None,
            target_sheet: None,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            max_transport_retries: api::MAX_TRANSPORT_RETRIES,
            search_delay: api::SEARCH_DELAY,
            row_delay: api::ROW_DELAY,
            student_delay: api::STUDENT_DELAY,
            tab_delay: api::TAB_DELAY,
            quota_backoff_unit: Duration::from_secs(1),
            min_score: matching::MIN_SCORE,
            accept_score: matching::ACCEPT_SCORE,
        }
    }

    /// Create a test configuration with every endpoint on one mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            serper_api_key: Some("test-key".to_string()),
            serper_url: format!("{base_url}/search"),
            riss_url: format!("{base_url}/riss"),
            sheets_api_url: format!("{base_url}/sheets/v4"),
            drive_api_url: format!("{base_url}/drive/v3"),
            gmail_api_url: format!("{base_url}/gmail/v1"),
            token_url: Some(format!("{base_url}/token")),
            service_account_path: PathBuf::from("service_account.json"),
            token_path: PathBuf::from("token.json"),
            source_sheet: None,
            target_sheet: None,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            max_transport_retries: 0,
            search_delay: Duration::ZERO,
            row_delay: Duration::ZERO,
            student_delay: Duration::ZERO,
            tab_delay: Duration::ZERO,
            quota_backoff_unit: Duration::ZERO,
            min_score: matching::MIN_SCORE,
            accept_score: matching::ACCEPT_SCORE,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// | Variable                 | Default                 |
    /// |--------------------------|-------------------------|
    /// | `SERPER_API_KEY`         | none                    |
    /// | `GOOGLE_SHEET_ID`        | none                    |
    /// | `TARGET_SHEET_ID`        | none                    |
    /// | `GOOGLE_SERVICE_ACCOUNT` | `service_account.json`  |
    /// | `GOOGLE_TOKEN_FILE`      | `token.json`            |
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::new(non_empty_var("SERPER_API_KEY"));
        config.source_sheet = non_empty_var("GOOGLE_SHEET_ID");
        config.target_sheet = non_empty_var("TARGET_SHEET_ID");
        if let Some(path) = non_empty_var("GOOGLE_SERVICE_ACCOUNT") {
            config.service_account_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty_var("GOOGLE_TOKEN_FILE") {
            config.token_path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// Check if a search API key is configured.
    #[must_use]
    pub const fn has_search_key(&self) -> bool {
        self.serper_api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
