//! BK21 Records
//!
//! Batch tooling for the research records of a BK21 graduate programme:
//! thesis lookup on RISS, per-student review sheets on Google Drive and
//! status mail campaigns driven by a Google spreadsheet.
//!
//! # Features
//!
//! - **Link search**: staged Serper queries, RISS search as fallback with
//!   fuzzy title matching
//! - **Enrichment**: abstract and keywords scraped from RISS detail pages
//! - **Provisioning**: one shared folder and review sheet per student,
//!   retried through quota backoff
//! - **Mail merge**: SMTP or Gmail API delivery, `Sent` marks make reruns safe
//!
//! # Example
//!
//! ```no_run
//! use bk21_records::{Config, tasks::TaskContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let ctx = TaskContext::from_config(config)?;
//!
//!     let summary = bk21_records::tasks::provision(&ctx).await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod google;
pub mod layout;
pub mod mail;
pub mod matching;
pub mod models;
pub mod retry;
pub mod scrape;
pub mod search;
pub mod tasks;

pub use client::{RissClient, SerperClient};
pub use config::Config;
pub use error::{ClientError, MailError, TaskError};
pub use search::LinkFinder;
