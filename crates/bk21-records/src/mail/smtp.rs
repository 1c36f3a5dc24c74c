//! SMTP delivery over implicit TLS.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use super::{MailCredentials, Mailer, OutgoingMail, build_message};
use crate::error::{MailError, MailResult};

/// Default SMTP relay.
pub const DEFAULT_HOST: &str = "smtp.naver.com";

/// Implicit-TLS SMTP port.
pub const DEFAULT_PORT: u16 = 465;

/// Domain appended to the account id to form the sender address.
pub const DEFAULT_DOMAIN: &str = "naver.com";

/// SMTP mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Mailer for the default relay; the sender is `<id>@naver.com`.
    pub fn naver(credentials: &MailCredentials) -> MailResult<Self> {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_DOMAIN, credentials)
    }

    /// Mailer for any implicit-TLS relay.
    pub fn new(
        host: &str,
        port: u16,
        domain: &str,
        credentials: &MailCredentials,
    ) -> MailResult<Self> {
        let from: Mailbox = format!("{}@{domain}", credentials.id).parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .port(port)
            .credentials(Credentials::new(credentials.id.clone(), credentials.password.clone()))
            .build();

        Ok(Self { transport, from })
    }

    /// Sender address.
    #[must_use]
    pub fn from_address(&self) -> &Mailbox {
        &self.from
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail) -> MailResult<()> {
        let message = build_message(&self.from, mail)?;
        self.transport.send(message).await.map_err(MailError::from)?;

        tracing::info!(to = %mail.to, "Mail sent over SMTP");
        Ok(())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from.to_string()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sender_is_account_at_domain() {
        let creds = MailCredentials { id: "bk21office".into(), password: "pw".into() };
        let mailer = SmtpMailer::naver(&creds).unwrap();
        assert_eq!(mailer.from_address().email.to_string(), "bk21office@naver.com");
    }

    #[test]
    fn test_invalid_account_id() {
        let creds = MailCredentials { id: "".into(), password: "pw".into() };
        assert!(matches!(SmtpMailer::naver(&creds), Err(MailError::Address(_))));
    }
}
