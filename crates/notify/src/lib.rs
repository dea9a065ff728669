//! Notification dispatch for triggered workflow actions.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - WhatsApp, email, and webhook notifier implementations
//! - Minijinja rendering of action message templates
//! - Dispatcher with mock mode and per-call bounded timeouts

pub mod dispatcher;
pub mod email;
pub mod templating;
pub mod traits;
pub mod webhook;
pub mod whatsapp;

pub use dispatcher::Dispatcher;
pub use templating::{AlertContext, TemplateRenderer};
pub use traits::{NotificationMessage, Notifier, NotifyError};
