use crate::config::toml_config::MailConfig;
use crate::core::{MailAddress, MailMessage, Notifier, Result};
use crate::utils::error::DirectoryError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Request body of the v3 `mail/send` API.
#[derive(Debug, Serialize)]
struct MailBody<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: MailAddress,
    reply_to: &'a MailAddress,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<&'a MailAddress>,
    subject: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

pub struct MailNotifier {
    client: Client,
    config: MailConfig,
}

impl MailNotifier {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn body<'a>(&self, message: &'a MailMessage) -> MailBody<'a> {
        MailBody {
            personalizations: vec![Personalization {
                to: vec![&message.to],
                subject: &message.subject,
            }],
            from: MailAddress {
                email: self.config.from_email.clone(),
                name: self.config.from_name.clone(),
            },
            reply_to: &message.reply_to,
            content: vec![Content {
                kind: "text/plain",
                value: &message.body,
            }],
        }
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    async fn notify(&self, message: &MailMessage) -> Result<()> {
        tracing::debug!("Sending mail to {}", message.to.email);

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&self.body(message))
            .send()
            .await
            .map_err(DirectoryError::notification)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::notification(format!(
                "mail API returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
