// SMTP transport.
//
// Server settings are global; recipients come from each box's options.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::{Notification, Notifier, Transport};
use crate::error::CoreError;
use crate::model::{TransportConfig, TransportKind};

/// Default submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Port that expects TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

const SENDER_NAME: &str = "openSenseMap Notifier";

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct EmailTransport {
    settings: SmtpSettings,
}

impl EmailTransport {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn mailer(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, CoreError> {
        let s = &self.settings;
        let builder = if s.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&s.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&s.host)
        }
        .map_err(|e| CoreError::configuration(format!("invalid SMTP host '{}': {e}", s.host)))?
        .port(s.port);

        let builder = match (&s.user, &s.password) {
            (Some(user), Some(pass)) => builder.credentials(Credentials::new(
                user.clone(),
                pass.expose_secret().to_owned(),
            )),
            _ => builder,
        };
        Ok(builder.build())
    }
}

impl Transport for EmailTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Email
    }

    fn configure(&self, config: &TransportConfig) -> Result<Box<dyn Notifier>, CoreError> {
        let TransportConfig::Email(options) = config else {
            return Err(CoreError::configuration(format!(
                "email transport cannot use {} options",
                config.kind()
            )));
        };
        if options.recipients.is_empty() {
            return Err(CoreError::configuration(
                "email transport needs at least one recipient",
            ));
        }

        let recipients = options
            .recipients
            .iter()
            .map(|r| {
                r.parse::<Mailbox>()
                    .map_err(|e| CoreError::configuration(format!("invalid recipient '{r}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let from = self.settings.from.parse::<Address>().map_err(|e| {
            CoreError::configuration(format!("invalid sender '{}': {e}", self.settings.from))
        })?;

        Ok(Box::new(EmailNotifier {
            mailer: self.mailer()?,
            from: Mailbox::new(Some(SENDER_NAME.into()), from),
            recipients,
        }))
    }
}

struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn submit(&self, notification: &Notification) -> Result<(), CoreError> {
        let delivery = |message: String| CoreError::Delivery {
            transport: TransportKind::Email.to_string(),
            message,
        };

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for r in &self.recipients {
            builder = builder.to(r.clone());
        }
        let message = builder
            .body(notification.body.clone())
            .map_err(|e| delivery(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| delivery(e.to_string()))?;

        debug!(recipients = self.recipients.len(), "email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::EmailOptions;

    fn transport(from: &str) -> EmailTransport {
        EmailTransport::new(SmtpSettings {
            host: "smtp.example.org".into(),
            port: DEFAULT_SMTP_PORT,
            user: Some("notifier".into()),
            password: Some(SecretString::from("hunter2")),
            from: from.into(),
        })
    }

    fn email(recipients: &[&str]) -> TransportConfig {
        TransportConfig::Email(EmailOptions {
            recipients: recipients.iter().map(ToString::to_string).collect(),
        })
    }

    fn config_error(result: Result<Box<dyn Notifier>, CoreError>) -> String {
        match result {
            Err(CoreError::Configuration { message }) => message,
            Err(other) => panic!("expected configuration error, got: {other:?}"),
            Ok(_) => panic!("expected configuration error"),
        }
    }

    #[test]
    fn requires_recipients() {
        let msg = config_error(transport("osem@example.org").configure(&email(&[])));
        assert!(msg.contains("at least one recipient"));
    }

    #[test]
    fn rejects_invalid_recipient() {
        let msg = config_error(transport("osem@example.org").configure(&email(&["not an address"])));
        assert!(msg.contains("invalid recipient 'not an address'"));
    }

    #[test]
    fn rejects_invalid_sender() {
        let msg = config_error(transport("nobody").configure(&email(&["a@example.org"])));
        assert!(msg.contains("invalid sender"));
    }

    #[test]
    fn rejects_other_transport_options() {
        let msg = config_error(transport("osem@example.org").configure(&TransportConfig::Slack));
        assert!(msg.contains("slack"));
    }
}
