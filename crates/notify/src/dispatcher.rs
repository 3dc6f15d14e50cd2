//! Notification dispatcher: event → records → bounded retry delivery.

use std::sync::{Arc, Mutex};
use std::thread;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, error, info, warn};

use provend_core::{format_cents, NotificationId};
use provend_orders::{Order, OrderEvent};
use provend_vendors::VendorStore;

use crate::config::NotifyConfig;
use crate::record::{NotificationRecord, NotificationStatus};
use crate::store::NotificationStore;
use crate::template::{fallback_body, render, TemplateSource};
use crate::transport::MailTransport;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.format(DATE_FORMAT).to_string()
}

/// Turns a lifecycle event into one delivery attempt per recipient, with
/// bounded retry and durable per-attempt accounting.
///
/// All failures are absorbed here: a caller invoking [`notify`] or
/// [`retry_all`] never observes a delivery error.
///
/// [`notify`]: NotificationDispatcher::notify
/// [`retry_all`]: NotificationDispatcher::retry_all
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    vendors: Arc<dyn VendorStore>,
    transport: Arc<dyn MailTransport>,
    templates: Arc<dyn TemplateSource>,
    config: NotifyConfig,
    // One mutex per record id. Retries for the same record serialize here;
    // retries for different records proceed in parallel.
    record_locks: DashMap<NotificationId, Arc<Mutex<()>>>,
}

impl NotificationDispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        vendors: Arc<dyn VendorStore>,
        transport: Arc<dyn MailTransport>,
        templates: Arc<dyn TemplateSource>,
        config: NotifyConfig,
    ) -> Self {
        Self {
            store,
            vendors,
            transport,
            templates,
            config,
            record_locks: DashMap::new(),
        }
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Handle one lifecycle event: render content, create one PENDING record
    /// per recipient, then drive the bounded retry loop for each.
    pub fn notify(&self, event: &OrderEvent, order: &Order) {
        let (subject, body, recipients) = self.compose(event, order);
        if recipients.is_empty() {
            warn!(
                event = event.event_type(),
                order_number = %order.order_number,
                "no recipients configured; nothing to deliver"
            );
            return;
        }

        for recipient in recipients {
            let record =
                NotificationRecord::new(recipient, subject.clone(), body.clone(), order.id, Utc::now());
            if let Err(e) = self.store.save(&record) {
                error!(error = %e, recipient = %record.recipient, "failed to persist notification record");
                continue;
            }
            self.run_retry_loop(record.id);
        }
    }

    /// Re-run the retry loop for every record that is still retryable.
    ///
    /// Idempotent and safe to call concurrently: records that are SENT or
    /// exhausted are skipped, and the per-record lock prevents two callers
    /// from double-sending or over-counting the same record.
    pub fn retry_all(&self) -> usize {
        let eligible = match self.store.find_retryable(self.config.max_attempts) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "failed to scan for retryable notifications");
                return 0;
            }
        };
        if eligible.is_empty() {
            return 0;
        }

        info!(count = eligible.len(), "retrying failed notifications");
        for record in &eligible {
            self.run_retry_loop(record.id);
        }
        eligible.len()
    }

    /// Bounded retry loop for one record: attempt, persist, optionally wait,
    /// repeat until SENT or the attempt budget is spent.
    ///
    /// The record is re-read under the per-record lock, so a caller that
    /// lost the race observes the winner's terminal state and does nothing.
    fn run_retry_loop(&self, id: NotificationId) {
        let lock = self.record_lock(id);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut record = match self.store.get(id) {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                error!(error = %e, notification_id = %id, "failed to load notification record");
                return;
            }
        };

        while record.status != NotificationStatus::Sent
            && record.attempts < self.config.max_attempts
        {
            // Attempt counting precedes evaluation: a first-try success is
            // stored with attempt count 1.
            record.begin_attempt();
            match self
                .transport
                .send(&record.recipient, &record.subject, &record.body)
            {
                Ok(()) => {
                    record.mark_sent(Utc::now());
                    debug!(
                        recipient = %record.recipient,
                        attempt = record.attempts,
                        "notification delivered"
                    );
                }
                Err(e) => {
                    record.mark_failed(e.to_string());
                    warn!(
                        recipient = %record.recipient,
                        attempt = record.attempts,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "notification delivery failed"
                    );
                }
            }

            // Persist before the next attempt so the stored attempt count is
            // always truthful, even across a crash mid-loop.
            if let Err(e) = self.store.save(&record) {
                error!(error = %e, notification_id = %id, "failed to persist attempt result");
                return;
            }

            if record.status == NotificationStatus::Sent {
                break;
            }
            if record.attempts < self.config.max_attempts && !self.config.retry_delay.is_zero() {
                thread::sleep(self.config.retry_delay);
            }
        }

        // Terminal either way; drop the lock entry so the map stays bounded.
        if record.status == NotificationStatus::Sent || record.attempts >= self.config.max_attempts
        {
            self.record_locks.remove(&id);
        }
    }

    fn record_lock(&self, id: NotificationId) -> Arc<Mutex<()>> {
        self.record_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn compose(&self, event: &OrderEvent, order: &Order) -> (String, String, Vec<String>) {
        let vendor_name = self
            .vendors
            .get(order.vendor_id)
            .ok()
            .flatten()
            .map(|v| v.name)
            .unwrap_or_else(|| order.vendor_id.to_string());
        let total = format_cents(order.total_amount_cents);

        match event {
            OrderEvent::Submitted { submitted_at } => {
                let subject = format!(
                    "New Procurement Order Awaiting Approval - {}",
                    order.order_number
                );
                let notes = order
                    .notes
                    .clone()
                    .unwrap_or_else(|| "No additional notes".to_string());
                let vars = [
                    ("orderNumber", order.order_number.clone()),
                    ("vendorName", vendor_name),
                    ("requestedBy", order.requested_by.clone()),
                    ("totalAmount", total),
                    ("submittedAt", fmt_ts(*submitted_at)),
                    ("notes", notes),
                ];
                let body = self.render_template("order-submitted", &vars);
                (subject, body, self.config.approver_recipients.clone())
            }
            OrderEvent::Approved => {
                let subject = format!("Procurement Order Approved - {}", order.order_number);
                let vars = [
                    ("orderNumber", order.order_number.clone()),
                    ("vendorName", vendor_name),
                    ("requestedBy", order.requested_by.clone()),
                    ("totalAmount", total),
                    ("approvedBy", order.approved_by.clone().unwrap_or_default()),
                    (
                        "approvedAt",
                        order.approved_at.map(fmt_ts).unwrap_or_default(),
                    ),
                ];
                let body = self.render_template("order-approved", &vars);
                (subject, body, vec![order.requested_by.clone()])
            }
        }
    }

    fn render_template(&self, name: &str, vars: &[(&str, String)]) -> String {
        match self.templates.load(name) {
            Ok(template) => render(&template, vars),
            Err(e) => {
                warn!(template = name, error = %e, "template load failed; using fallback body");
                fallback_body()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryNotificationStore;
    use crate::template::TemplateError;
    use crate::transport::TransportError;
    use chrono::Utc;
    use provend_orders::LineItem;
    use provend_vendors::{InMemoryVendorStore, Vendor};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    /// Succeeds after failing the first `fail_first` calls; counts sends.
    struct FlakyTransport {
        fail_first: u32,
        calls: AtomicU32,
        successes: AtomicU32,
    }

    impl FlakyTransport {
        fn new(fail_first: u32) -> Self {
            Self {
                fail_first,
                calls: AtomicU32::new(0),
                successes: AtomicU32::new(0),
            }
        }

        fn always_failing() -> Self {
            Self::new(u32::MAX)
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn successes(&self) -> u32 {
            self.successes.load(Ordering::SeqCst)
        }
    }

    impl MailTransport for FlakyTransport {
        fn send(&self, _r: &str, _s: &str, _b: &str) -> Result<(), TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(TransportError::new("smtp connection refused"))
            } else {
                self.successes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    struct StaticTemplates;

    impl TemplateSource for StaticTemplates {
        fn load(&self, name: &str) -> Result<String, TemplateError> {
            Ok(format!(
                "<html><body>{name}: {{{{orderNumber}}}} {{{{vendorName}}}} {{{{totalAmount}}}}</body></html>"
            ))
        }
    }

    struct BrokenTemplates;

    impl TemplateSource for BrokenTemplates {
        fn load(&self, name: &str) -> Result<String, TemplateError> {
            Err(TemplateError::Load {
                name: name.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    struct Fixture {
        dispatcher: Arc<NotificationDispatcher>,
        store: Arc<InMemoryNotificationStore>,
        transport: Arc<FlakyTransport>,
        order: Order,
    }

    fn fixture_with(
        transport: FlakyTransport,
        templates: Arc<dyn TemplateSource>,
        approvers: &str,
        max_attempts: u32,
    ) -> Fixture {
        let store = InMemoryNotificationStore::arc();
        let vendors = InMemoryVendorStore::arc();
        let vendor = Vendor::new("Acme Supplies", 90.0, 4.0, 70.0);
        vendors.save(&vendor).unwrap();

        let mut order = Order::new(
            vendor.id,
            "requester@corp.test",
            vec![
                LineItem::new("Laptop", "Dev laptop", 3, 1000).unwrap(),
                LineItem::new("Mouse", "Wireless", 1, 500).unwrap(),
            ],
            Some("Urgent".to_string()),
            Utc::now(),
        )
        .unwrap();
        order.submit().unwrap();

        let transport = Arc::new(transport);
        let config =
            NotifyConfig::new(approvers, max_attempts, Duration::ZERO, Duration::from_secs(600))
                .unwrap();
        let dispatcher = Arc::new(NotificationDispatcher::new(
            store.clone(),
            vendors,
            transport.clone(),
            templates,
            config,
        ));
        Fixture {
            dispatcher,
            store,
            transport,
            order,
        }
    }

    fn fixture(transport: FlakyTransport, approvers: &str, max_attempts: u32) -> Fixture {
        fixture_with(transport, Arc::new(StaticTemplates), approvers, max_attempts)
    }

    fn submitted_event() -> OrderEvent {
        OrderEvent::Submitted {
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn submitted_creates_one_sent_record_per_approver() {
        let f = fixture(
            FlakyTransport::new(0),
            "alice@corp.test, bob@corp.test",
            3,
        );
        f.dispatcher.notify(&submitted_event(), &f.order);

        let records = f.store.find_by_order(f.order.id).unwrap();
        assert_eq!(records.len(), 2);
        let mut recipients: Vec<_> = records.iter().map(|r| r.recipient.clone()).collect();
        recipients.sort();
        assert_eq!(recipients, vec!["alice@corp.test", "bob@corp.test"]);
        for record in &records {
            assert_eq!(record.status, NotificationStatus::Sent);
            assert_eq!(record.attempts, 1); // first-try success still counts 1
            assert!(record.sent_at.is_some());
            assert!(record.body.contains(&f.order.order_number));
            assert!(record.body.contains("Acme Supplies"));
            assert!(record.body.contains("35.00"));
            assert!(record
                .subject
                .starts_with("New Procurement Order Awaiting Approval - PO-"));
        }
    }

    #[test]
    fn approved_notifies_only_the_requester() {
        let f = fixture(FlakyTransport::new(0), "alice@corp.test", 3);
        let mut order = f.order.clone();
        order.approve("alice", Utc::now()).unwrap();

        f.dispatcher.notify(&OrderEvent::Approved, &order);

        let records = f.store.find_by_order(order.id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].recipient, "requester@corp.test");
        assert!(records[0]
            .subject
            .starts_with("Procurement Order Approved - PO-"));
    }

    #[test]
    fn transport_failure_exhausts_the_attempt_budget() {
        let f = fixture(FlakyTransport::always_failing(), "alice@corp.test", 3);
        f.dispatcher.notify(&submitted_event(), &f.order);

        let records = f.store.find_by_order(f.order.id).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.status, NotificationStatus::Failed);
        assert_eq!(record.attempts, 3);
        assert_eq!(record.last_error.as_deref(), Some("smtp connection refused"));
        assert!(record.sent_at.is_none());

        // Exhausted records are invisible to future sweeps.
        assert!(f.store.find_retryable(3).unwrap().is_empty());
        assert_eq!(f.dispatcher.retry_all(), 0);
        assert_eq!(f.transport.calls(), 3);
    }

    #[test]
    fn success_mid_budget_stops_retrying_immediately() {
        let f = fixture(FlakyTransport::new(1), "alice@corp.test", 5);
        f.dispatcher.notify(&submitted_event(), &f.order);

        let record = &f.store.find_by_order(f.order.id).unwrap()[0];
        assert_eq!(record.status, NotificationStatus::Sent);
        assert_eq!(record.attempts, 2);
        let frozen = record.clone();

        // Subsequent sweeps are no-ops for a SENT record.
        assert_eq!(f.dispatcher.retry_all(), 0);
        assert_eq!(f.store.get(frozen.id).unwrap().unwrap(), frozen);
        assert_eq!(f.transport.calls(), 2);
    }

    #[test]
    fn retry_all_with_nothing_eligible_is_a_no_op() {
        let f = fixture(FlakyTransport::new(0), "alice@corp.test", 3);
        assert_eq!(f.dispatcher.retry_all(), 0);
        assert_eq!(f.transport.calls(), 0);
    }

    #[test]
    fn retry_all_resumes_an_interrupted_record() {
        // Simulates a record left mid-count by a crashed process.
        let f = fixture(FlakyTransport::new(0), "alice@corp.test", 3);
        let mut record = NotificationRecord::new(
            "alice@corp.test",
            "subject",
            "body",
            f.order.id,
            Utc::now(),
        );
        record.begin_attempt();
        record.mark_failed("smtp connection refused");
        f.store.save(&record).unwrap();

        assert_eq!(f.dispatcher.retry_all(), 1);
        let resumed = f.store.get(record.id).unwrap().unwrap();
        assert_eq!(resumed.status, NotificationStatus::Sent);
        assert_eq!(resumed.attempts, 2);
    }

    #[test]
    fn concurrent_retries_of_one_record_send_at_most_once() {
        let f = fixture(FlakyTransport::new(0), "alice@corp.test", 5);
        let mut record = NotificationRecord::new(
            "alice@corp.test",
            "subject",
            "body",
            f.order.id,
            Utc::now(),
        );
        record.begin_attempt();
        record.mark_failed("smtp connection refused");
        f.store.save(&record).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let dispatcher = f.dispatcher.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    dispatcher.retry_all();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let final_record = f.store.get(record.id).unwrap().unwrap();
        assert_eq!(final_record.status, NotificationStatus::Sent);
        assert_eq!(final_record.attempts, 2); // exactly one more attempt
        assert_eq!(f.transport.successes(), 1); // no duplicate send
    }

    #[test]
    fn template_load_failure_degrades_to_fallback_body() {
        let f = fixture_with(
            FlakyTransport::new(0),
            Arc::new(BrokenTemplates),
            "alice@corp.test",
            3,
        );
        f.dispatcher.notify(&submitted_event(), &f.order);

        let record = &f.store.find_by_order(f.order.id).unwrap()[0];
        assert_eq!(record.status, NotificationStatus::Sent);
        assert_eq!(record.body, fallback_body());
    }

    #[test]
    fn no_recipients_creates_no_records() {
        let f = fixture(FlakyTransport::new(0), "", 3);
        f.dispatcher.notify(&submitted_event(), &f.order);
        assert!(f.store.list_all().unwrap().is_empty());
        assert_eq!(f.transport.calls(), 0);
    }
}
