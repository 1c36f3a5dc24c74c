//! Mail merge: templates, message assembly and delivery backends.
//!
//! Delivery backends implementing [`Mailer`]:
//! - [`SmtpMailer`]: implicit-TLS SMTP (Naver by default)
//! - [`GmailMailer`]: Gmail API `users/me/messages/send`
//! - [`DryRunMailer`]: logs only

pub mod gmail;
pub mod smtp;
pub mod template;

use std::path::Path;

use lettre::Message;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use serde::Deserialize;

use crate::error::{MailError, MailResult, TaskError, TaskResult};

pub use gmail::GmailMailer;
pub use smtp::SmtpMailer;
pub use template::{MailTemplate, styled};

/// One message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Recipient address.
    pub to: String,

    /// Subject line.
    pub subject: String,

    /// HTML body.
    pub html: String,
}

/// A delivery backend.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    async fn send(&self, mail: &OutgoingMail) -> MailResult<()>;
}

/// Backend for dry runs: logs each message and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunMailer;

#[async_trait::async_trait]
impl Mailer for DryRunMailer {
    async fn send(&self, mail: &OutgoingMail) -> MailResult<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "Dry run, not sent");
        Ok(())
    }
}

/// SMTP login loaded from a JSON file `{"id": ..., "password": ...}`.
#[derive(Clone, Deserialize)]
pub struct MailCredentials {
    /// Account id (the part before `@`).
    pub id: String,

    /// Application password.
    pub password: String,
}

impl MailCredentials {
    /// Load credentials from a JSON file.
    pub fn load(path: &Path) -> TaskResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TaskError::config(format!("cannot read mail credentials {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("id", &self.id)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Assemble an HTML message.
pub fn build_message(from: &Mailbox, mail: &OutgoingMail) -> MailResult<Message> {
    Message::builder()
        .from(from.clone())
        .to(mail.to.parse()?)
        .subject(mail.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(mail.html.clone())
        .map_err(|e| MailError::Build(e.to_string()))
}
