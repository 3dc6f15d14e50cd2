//! `provend-notify` — asynchronous, failure-tolerant notification delivery.
//!
//! Lifecycle events arrive over a channel on a dedicated worker thread; the
//! dispatcher renders email content, writes one durable record per recipient
//! and drives a bounded retry loop against the mail transport. A periodic
//! sweeper re-runs the loop for records that are still retryable. Delivery
//! failures are absorbed here and surfaced only through the record store.

pub mod config;
pub mod dispatcher;
pub mod record;
pub mod store;
pub mod sweeper;
pub mod template;
pub mod transport;
pub mod worker;

pub use config::NotifyConfig;
pub use dispatcher::NotificationDispatcher;
pub use record::{NotificationRecord, NotificationStatus};
pub use store::{InMemoryNotificationStore, NotificationStore, NotificationStoreError};
pub use sweeper::{RetrySweeper, RetrySweeperHandle};
pub use template::{render, FsTemplateSource, TemplateError, TemplateSource};
pub use transport::{MailTransport, TracingMailTransport, TransportError};
pub use worker::{NotifyHandle, NotifyWorker, NotifyWorkerHandle};
