//! Durable accounting of delivery attempts.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use provend_core::{DomainError, NotificationId, OrderId};

/// Delivery status of a notification record.
///
/// `FAILED` covers both retryable and permanent failure; the two are
/// distinguished only by comparing the attempt count to the configured
/// maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Failed => "FAILED",
        }
    }
}

impl core::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(NotificationStatus::Pending),
            "SENT" => Ok(NotificationStatus::Sent),
            "FAILED" => Ok(NotificationStatus::Failed),
            other => Err(DomainError::validation(format!(
                "unknown notification status: {other}"
            ))),
        }
    }
}

/// One attempted delivery to one recipient for one triggering event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: NotificationStatus,
    /// Monotonically non-decreasing; bounded by the configured maximum.
    /// Incremented *before* each send is evaluated, so a first-try success
    /// stores 1.
    pub attempts: u32,
    pub last_error: Option<String>,
    pub order_id: OrderId,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl NotificationRecord {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            status: NotificationStatus::Pending,
            attempts: 0,
            last_error: None,
            order_id,
            created_at: now,
            sent_at: None,
        }
    }

    /// Count the attempt that is about to run.
    pub fn begin_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Terminal success: freezes the record.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        self.status = NotificationStatus::Sent;
        self.sent_at = Some(now);
        self.last_error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = NotificationStatus::Failed;
        self.last_error = Some(error.into());
    }

    /// Failed with attempts to spare. Exhausted records stay `FAILED` but
    /// are never retried again.
    pub fn is_retryable(&self, max_attempts: u32) -> bool {
        self.status == NotificationStatus::Failed && self.attempts < max_attempts
    }
}
