//! Data models for spreadsheet records, search results and submissions.
//!
//! Wire types use `#[serde(default)]` for optional fields so partial API
//! responses still parse.

pub mod a1;
mod search;
mod submission;
mod table;
mod thesis;

pub use search::{OrganicResult, SearchRequest, SearchResponse};
pub use submission::{OutputKind, Role, Submission, SubmissionItem};
pub use table::{Record, Table};
pub use thesis::{ThesisDetails, ThesisDump};
