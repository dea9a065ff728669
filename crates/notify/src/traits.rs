//! Notifier trait definition and shared error types.

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("channel API error: {0}")]
    Api(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("channel call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationMessage {
    /// Short subject/title (email subject line; ignored by plain-text channels).
    pub subject: String,
    /// The rendered body content.
    pub body: String,
}

impl NotificationMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Trait for notification channel implementations.
///
/// Adapters hold credentials and transport state; the recipient comes in
/// per call because one action node carries its own recipient.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to one recipient through this channel.
    async fn send(&self, recipient: &str, message: &NotificationMessage)
        -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "webhook", "email").
    fn channel_name(&self) -> &str;
}
