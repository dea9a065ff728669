//! Generic HTTP webhook notifier.
//!
//! Delivers notifications as JSON payloads to the URL carried in the
//! action's recipient field, with an optional shared-secret header.

use nexus_core::config::NotifyConfig;

use crate::traits::{NotificationMessage, Notifier, NotifyError};

/// Delivers notifications as JSON over HTTP POST.
#[derive(Debug)]
pub struct WebhookNotifier {
    /// Optional value for the `X-Webhook-Secret` header.
    secret: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn from_config(config: &NotifyConfig) -> Self {
        Self {
            secret: config.webhook_secret.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    /// POST the notification as JSON to the recipient URL.
    async fn send(
        &self,
        recipient: &str,
        message: &NotificationMessage,
    ) -> Result<(), NotifyError> {
        if !recipient.starts_with("http://") && !recipient.starts_with("https://") {
            return Err(NotifyError::Config(format!(
                "webhook recipient is not an HTTP URL: {recipient}"
            )));
        }

        let mut request = self
            .client
            .post(recipient)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(message);

        if let Some(ref secret) = self.secret {
            request = request.header("X-Webhook-Secret", secret.as_str());
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                url = recipient,
                %status,
                body = %body_text,
                "webhook returned non-2xx status"
            );
            return Err(NotifyError::Api(format!(
                "webhook returned {status}: {body_text}"
            )));
        }

        tracing::debug!(url = recipient, %status, "webhook notification delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::config::NotifyConfig;

    #[tokio::test]
    async fn non_http_recipient_rejected() {
        let notifier = WebhookNotifier::from_config(&NotifyConfig::mocked());
        let message = NotificationMessage::new("s", "b");
        let err = notifier.send("ops@example.com", &message).await.unwrap_err();
        assert!(err.to_string().contains("not an HTTP URL"));
    }

    #[test]
    fn secret_comes_from_config() {
        let mut config = NotifyConfig::mocked();
        config.webhook_secret = Some("hunter2".to_string());
        let notifier = WebhookNotifier::from_config(&config);
        assert_eq!(notifier.secret.as_deref(), Some("hunter2"));
    }

    #[test]
    fn channel_name_is_webhook() {
        let notifier = WebhookNotifier::from_config(&NotifyConfig::mocked());
        assert_eq!(notifier.channel_name(), "webhook");
    }
}
