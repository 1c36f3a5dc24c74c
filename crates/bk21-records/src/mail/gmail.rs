//! Gmail API delivery.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use lettre::message::Mailbox;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::{Mailer, OutgoingMail, build_message};
use crate::config::Config;
use crate::error::MailResult;
use crate::google::GoogleClient;

#[derive(Debug, Deserialize)]
struct SentMessage {
    #[serde(default)]
    id: String,
}

/// Sends through `users/me/messages/send` as the authorized user.
#[derive(Debug, Clone)]
pub struct GmailMailer {
    google: GoogleClient,
    send_url: String,
    from: Mailbox,
}

impl GmailMailer {
    /// Create a mailer; `from` must be the authorized account or an alias.
    pub fn new(config: &Config, google: GoogleClient, from: &str) -> MailResult<Self> {
        Ok(Self {
            google,
            send_url: format!(
                "{}/users/me/messages/send",
                config.gmail_api_url.trim_end_matches('/')
            ),
            from: from.parse()?,
        })
    }
}

/// Base64url encoding of a raw RFC 5322 message.
#[must_use]
pub fn encode_raw(message: &[u8]) -> String {
    URL_SAFE.encode(message)
}

#[async_trait::async_trait]
impl Mailer for GmailMailer {
    async fn send(&self, mail: &OutgoingMail) -> MailResult<()> {
        let message = build_message(&self.from, mail)?;
        let body = json!({ "raw": encode_raw(&message.formatted()) });

        let sent: SentMessage = self.google.send_json(Method::POST, &self.send_url, &[], &body).await?;
        tracing::info!(to = %mail.to, id = %sent.id, "Mail sent through Gmail API");
        Ok(())
    }
}
