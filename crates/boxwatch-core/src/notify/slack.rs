// Slack incoming-webhook transport.
//
// The webhook URL is global; a box selecting `slack` has no options.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{Notification, Notifier, Transport};
use crate::error::CoreError;
use crate::model::{CheckStatus, TransportConfig, TransportKind};

const USERNAME: &str = "osem_notify box healthcheck";

#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    text: &'a str,
    username: &'a str,
    attachments: [SlackAttachment<'a>; 1],
}

#[derive(Debug, Serialize)]
struct SlackAttachment<'a> {
    text: &'a str,
    color: &'static str,
}

fn color(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Ok => "#00ff00",
        CheckStatus::Failed => "#ff0000",
    }
}

#[derive(Debug, Clone)]
pub struct SlackTransport {
    webhook: SecretString,
    http: reqwest::Client,
}

impl SlackTransport {
    pub fn new(webhook: SecretString, http: reqwest::Client) -> Self {
        Self { webhook, http }
    }
}

impl Transport for SlackTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Slack
    }

    fn configure(&self, config: &TransportConfig) -> Result<Box<dyn Notifier>, CoreError> {
        if config.kind() != TransportKind::Slack {
            return Err(CoreError::configuration(format!(
                "slack transport cannot use {} options",
                config.kind()
            )));
        }
        // Parse errors would echo the secret URL, so keep the message generic.
        let webhook = Url::parse(self.webhook.expose_secret())
            .map_err(|_| CoreError::configuration("slack.webhook is not a valid URL"))?;

        Ok(Box::new(SlackNotifier {
            webhook,
            http: self.http.clone(),
        }))
    }
}

struct SlackNotifier {
    webhook: Url,
    http: reqwest::Client,
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn submit(&self, notification: &Notification) -> Result<(), CoreError> {
        let delivery = |message: String| CoreError::Delivery {
            transport: TransportKind::Slack.to_string(),
            message,
        };

        let message = SlackMessage {
            text: &notification.subject,
            username: USERNAME,
            attachments: [SlackAttachment {
                text: &notification.body,
                color: color(notification.status),
            }],
        };

        let resp = self
            .http
            .post(self.webhook.clone())
            .json(&message)
            .send()
            .await
            .map_err(|e| delivery(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(delivery(format!("webhook returned {status}: {body}")));
        }

        debug!("slack message sent");
        Ok(())
    }
}
