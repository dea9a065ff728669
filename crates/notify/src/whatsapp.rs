//! WhatsApp Business API notifier (Meta Graph API).
//!
//! Delivers notifications as text messages through the
//! `/{version}/{phone_id}/messages` Graph endpoint.

use nexus_core::config::NotifyConfig;

use crate::traits::{NotificationMessage, Notifier, NotifyError};

/// Sends notifications via the Meta WhatsApp Business API.
#[derive(Debug)]
pub struct WhatsAppNotifier {
    phone_id: String,
    token: String,
    api_version: String,
    client: reqwest::Client,
}

impl WhatsAppNotifier {
    /// Build a notifier from channel credentials.
    ///
    /// Fails with [`NotifyError::Config`] when the phone id or access
    /// token is missing.
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let phone_id = config
            .whatsapp_phone_id
            .clone()
            .ok_or_else(|| NotifyError::Config("WHATSAPP_PHONE_ID is not set".to_string()))?;
        let token = config
            .whatsapp_token
            .clone()
            .ok_or_else(|| NotifyError::Config("WHATSAPP_ACCESS_TOKEN is not set".to_string()))?;

        Ok(Self {
            phone_id,
            token,
            api_version: config.whatsapp_api_version.clone(),
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "https://graph.facebook.com/{}/{}/messages",
            self.api_version, self.phone_id
        )
    }
}

/// Strip `+`, spaces, and dashes; the Graph API wants bare digits.
fn normalize_phone(number: &str) -> String {
    number
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-'))
        .collect()
}

#[async_trait::async_trait]
impl Notifier for WhatsAppNotifier {
    async fn send(
        &self,
        recipient: &str,
        message: &NotificationMessage,
    ) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": normalize_phone(recipient),
            "type": "text",
            "text": { "body": message.body },
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await?;

        if !status.is_success() {
            let description = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("unknown WhatsApp API error");
            return Err(NotifyError::Api(format!(
                "WhatsApp API returned {status}: {description}"
            )));
        }

        let message_id = body
            .get("messages")
            .and_then(|m| m.get(0))
            .and_then(|m| m.get("id"))
            .and_then(|id| id.as_str())
            .unwrap_or("<none>");
        tracing::info!(
            channel = "whatsapp",
            message_id,
            "notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "whatsapp"
    }
}
