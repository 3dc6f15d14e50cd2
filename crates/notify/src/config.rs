//! Notification engine configuration.
//!
//! All knobs are explicit values passed in at construction; nothing reads
//! ambient state after startup.

use std::time::Duration;

use provend_core::DomainError;

/// Configuration consumed by the dispatcher and sweeper.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Recipients of `OrderSubmitted` notifications.
    pub approver_recipients: Vec<String>,
    /// Upper bound on delivery attempts per record. At least 1.
    pub max_attempts: u32,
    /// Fixed delay between attempts within one retry loop.
    pub retry_delay: Duration,
    /// How often the sweeper re-scans for retryable records.
    pub sweep_interval: Duration,
}

impl NotifyConfig {
    pub fn new(
        approvers: &str,
        max_attempts: u32,
        retry_delay: Duration,
        sweep_interval: Duration,
    ) -> Result<Self, DomainError> {
        if max_attempts < 1 {
            return Err(DomainError::validation("max_attempts must be at least 1"));
        }
        Ok(Self {
            approver_recipients: parse_recipient_list(approvers),
            max_attempts,
            retry_delay,
            sweep_interval,
        })
    }

    /// Load configuration from the environment, with development defaults:
    /// `NOTIFY_APPROVERS`, `NOTIFY_MAX_ATTEMPTS` (default 3),
    /// `NOTIFY_RETRY_DELAY_MS` (default 5000),
    /// `NOTIFY_SWEEP_INTERVAL_SECS` (default 600).
    pub fn from_env() -> Result<Self, DomainError> {
        let approvers = std::env::var("NOTIFY_APPROVERS").unwrap_or_default();
        let max_attempts = env_parse("NOTIFY_MAX_ATTEMPTS", 3)?;
        let retry_delay_ms: u64 = env_parse("NOTIFY_RETRY_DELAY_MS", 5_000)?;
        let sweep_secs: u64 = env_parse("NOTIFY_SWEEP_INTERVAL_SECS", 600)?;
        Self::new(
            &approvers,
            max_attempts,
            Duration::from_millis(retry_delay_ms),
            Duration::from_secs(sweep_secs),
        )
    }
}

/// Split a comma-separated address list, trimming whitespace and dropping
/// empty entries.
pub fn parse_recipient_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, DomainError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| DomainError::validation(format!("{key} is not a valid value: {raw}"))),
        Err(_) => Ok(default),
    }
}
