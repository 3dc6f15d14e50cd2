//! Mail transport boundary.
//!
//! The engine treats delivery as an opaque operation that either succeeds or
//! fails with a human-readable message. Transport internals (SMTP, provider
//! APIs) live behind this trait.

use thiserror::Error;
use tracing::info;

/// Transport-level delivery failure. Treated as transient and retried up to
/// the configured maximum.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Sends one message to one recipient.
pub trait MailTransport: Send + Sync {
    fn send(&self, recipient: &str, subject: &str, html_body: &str)
        -> Result<(), TransportError>;
}

/// Development transport: logs the message instead of delivering it.
#[derive(Debug, Default)]
pub struct TracingMailTransport;

impl MailTransport for TracingMailTransport {
    fn send(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), TransportError> {
        info!(recipient, subject, body_bytes = html_body.len(), "mail sent (dev transport)");
        Ok(())
    }
}
