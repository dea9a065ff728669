//! Routes resolved action payloads to channel adapters.
//!
//! Every dispatch attempt produces a [`NotificationResult`] — delivery
//! failures are recorded, never thrown, so one unreachable channel can't
//! halt the simulation loop or other channels' deliveries. There is no
//! inline retry; a caller wanting retries issues a fresh `dispatch`.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;

use nexus_core::config::NotifyConfig;
use nexus_core::{Channel, DispatchStatus, NotificationResult};

use crate::email::EmailNotifier;
use crate::traits::{NotificationMessage, Notifier, NotifyError};
use crate::webhook::WebhookNotifier;
use crate::whatsapp::WhatsAppNotifier;

/// Dispatches rendered notifications to channel adapters.
///
/// Mock mode is an explicit construction-time value: a mocked dispatcher
/// records `mocked` results without touching any adapter, so concurrent
/// test runs stay isolated.
pub struct Dispatcher {
    adapters: HashMap<Channel, Box<dyn Notifier>>,
    mock_mode: bool,
    timeout: Duration,
}

impl Dispatcher {
    /// Build a dispatcher from channel configuration.
    ///
    /// In mock mode no adapters are constructed. In real mode the email
    /// and webhook adapters are always available; WhatsApp is attached
    /// only when its credentials are configured (dispatching to it
    /// without credentials records a `failed` result).
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let mut adapters: HashMap<Channel, Box<dyn Notifier>> = HashMap::new();

        if !config.mock_mode {
            adapters.insert(Channel::Email, Box::new(EmailNotifier::from_config(config)?));
            adapters.insert(
                Channel::Webhook,
                Box::new(WebhookNotifier::from_config(config)),
            );
            if config.whatsapp_configured() {
                adapters.insert(
                    Channel::WhatsApp,
                    Box::new(WhatsAppNotifier::from_config(config)?),
                );
            } else {
                tracing::warn!("whatsapp credentials not configured; channel unavailable");
            }
        }

        Ok(Self {
            adapters,
            mock_mode: config.mock_mode,
            timeout: config.dispatch_timeout(),
        })
    }

    /// Dispatcher with caller-supplied adapters (tests, embedding).
    pub fn with_adapters(
        adapters: HashMap<Channel, Box<dyn Notifier>>,
        timeout: Duration,
    ) -> Self {
        Self {
            adapters,
            mock_mode: false,
            timeout,
        }
    }

    /// Dispatcher that records every attempt as `mocked`.
    pub fn mocked() -> Self {
        Self {
            adapters: HashMap::new(),
            mock_mode: true,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.mock_mode
    }

    /// Deliver one rendered message for one action node.
    ///
    /// Always returns a result; the status tells the caller what
    /// happened. The adapter call is bounded by the configured timeout,
    /// and a timeout degrades to `failed` rather than a hang.
    pub async fn dispatch(
        &self,
        action_node_id: &str,
        channel: Channel,
        recipient: &str,
        message: &NotificationMessage,
    ) -> NotificationResult {
        let attempted_at = Utc::now();

        if self.mock_mode {
            tracing::info!(
                action_node_id,
                channel = %channel,
                recipient,
                body = %message.body,
                "mock dispatch"
            );
            return NotificationResult {
                id: uuid::Uuid::new_v4(),
                action_node_id: action_node_id.to_string(),
                channel,
                recipient: recipient.to_string(),
                status: DispatchStatus::Mocked,
                error: None,
                attempted_at,
            };
        }

        let outcome = match self.adapters.get(&channel) {
            Some(adapter) => {
                match tokio::time::timeout(self.timeout, adapter.send(recipient, message)).await {
                    Ok(result) => result,
                    Err(_) => Err(NotifyError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }),
                }
            }
            None => Err(NotifyError::Config(format!(
                "channel '{channel}' is not configured"
            ))),
        };

        let (status, error) = match outcome {
            Ok(()) => {
                tracing::info!(action_node_id, channel = %channel, "notification delivered");
                (DispatchStatus::Sent, None)
            }
            Err(e) => {
                tracing::warn!(
                    action_node_id,
                    channel = %channel,
                    error = %e,
                    "notification delivery failed"
                );
                (DispatchStatus::Failed, Some(e.to_string()))
            }
        };

        NotificationResult {
            id: uuid::Uuid::new_v4(),
            action_node_id: action_node_id.to_string(),
            channel,
            recipient: recipient.to_string(),
            status,
            error,
            attempted_at,
        }
    }
}
