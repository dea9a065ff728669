use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub notify: NotifyConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            simulation: SimulationConfig::from_env(),
            notify: NotifyConfig::from_env(),
        }
    }
}

// ── Simulation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for the deterministic signal generator.
    pub seed: u64,
    /// Wall-clock interval between simulation ticks, in milliseconds.
    pub tick_interval_ms: u64,
}

impl SimulationConfig {
    pub fn from_env() -> Self {
        Self {
            seed: env_u64("NEXUS_SIM_SEED", 0),
            tick_interval_ms: env_u64("NEXUS_TICK_INTERVAL_MS", 1000),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// ── Notification channels ─────────────────────────────────────

/// Channel credentials and dispatch behaviour, loaded once before a run.
///
/// With `mock_mode` set, every adapter short-circuits and records a
/// `mocked` result without any outbound call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    // WhatsApp Business API (Meta Graph)
    pub whatsapp_phone_id: Option<String>,
    pub whatsapp_token: Option<String>,
    pub whatsapp_api_version: String,

    // SMTP email
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_from: String,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,

    // Webhook
    pub webhook_secret: Option<String>,

    pub mock_mode: bool,
    /// Upper bound on a single channel call, in seconds.
    pub dispatch_timeout_secs: u64,
}

impl NotifyConfig {
    pub fn from_env() -> Self {
        Self {
            whatsapp_phone_id: env_opt("WHATSAPP_PHONE_ID"),
            whatsapp_token: env_opt("WHATSAPP_ACCESS_TOKEN"),
            whatsapp_api_version: env_or("WHATSAPP_API_VERSION", "v18.0"),
            smtp_host: env_or("EMAIL_SMTP_HOST", "smtp.gmail.com"),
            smtp_port: env_u16("EMAIL_SMTP_PORT", 587),
            smtp_from: env_or("EMAIL_FROM", "Nexus Alerts <alerts@localhost>"),
            smtp_username: env_opt("EMAIL_USERNAME"),
            smtp_password: env_opt("EMAIL_APP_PASSWORD"),
            webhook_secret: env_opt("WEBHOOK_SECRET"),
            mock_mode: env_bool("NOTIFICATION_MOCK_MODE", true),
            dispatch_timeout_secs: env_u64("NEXUS_DISPATCH_TIMEOUT_SECS", 10),
        }
    }

    /// A config that dispatches nothing; every channel records `mocked`.
    pub fn mocked() -> Self {
        Self {
            whatsapp_phone_id: None,
            whatsapp_token: None,
            whatsapp_api_version: "v18.0".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_from: "Nexus Alerts <alerts@localhost>".to_string(),
            smtp_username: None,
            smtp_password: None,
            webhook_secret: None,
            mock_mode: true,
            dispatch_timeout_secs: 10,
        }
    }

    pub fn whatsapp_configured(&self) -> bool {
        self.whatsapp_phone_id.is_some() && self.whatsapp_token.is_some()
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}
