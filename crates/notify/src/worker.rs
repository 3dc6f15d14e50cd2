//! Background dispatch workers.
//!
//! Lifecycle operations hand events to [`NotifyHandle::emit`], which only
//! pushes onto a channel; rendering, record creation and the retry loop all
//! run on a small fixed pool of worker threads sharing the receiver. The
//! triggering caller never waits on delivery, and one event stuck in a retry
//! loop does not hold up delivery for later events.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{info, warn};

use provend_orders::{EventSink, Order, OrderEvent};

use crate::dispatcher::NotificationDispatcher;

const DEFAULT_WORKERS: usize = 4;

/// One queued dispatch request.
#[derive(Debug)]
struct DispatchRequest {
    event: OrderEvent,
    order: Order,
}

/// Cloneable sender half handed to lifecycle services.
#[derive(Debug, Clone)]
pub struct NotifyHandle {
    tx: mpsc::Sender<DispatchRequest>,
}

impl EventSink for NotifyHandle {
    fn emit(&self, event: OrderEvent, order: Order) {
        // The workers own the receiver; a send error means they have stopped.
        // The transition is already committed, so the event is just dropped.
        if self.tx.send(DispatchRequest { event, order }).is_err() {
            warn!("notification workers have stopped; dropping event");
        }
    }
}

/// Handle to the running worker threads.
#[derive(Debug)]
pub struct NotifyWorkerHandle {
    joins: Vec<thread::JoinHandle<()>>,
}

impl NotifyWorkerHandle {
    /// Wait for the workers to drain and exit. They stop once every
    /// [`NotifyHandle`] clone has been dropped.
    pub fn join(self) {
        for join in self.joins {
            let _ = join.join();
        }
    }
}

/// Spawner for the dispatch worker pool.
pub struct NotifyWorker;

impl NotifyWorker {
    pub fn spawn(dispatcher: Arc<NotificationDispatcher>) -> (NotifyHandle, NotifyWorkerHandle) {
        Self::spawn_pool(dispatcher, DEFAULT_WORKERS)
    }

    /// Spawn `workers` threads (at least one) draining a shared channel.
    pub fn spawn_pool(
        dispatcher: Arc<NotificationDispatcher>,
        workers: usize,
    ) -> (NotifyHandle, NotifyWorkerHandle) {
        let (tx, rx) = mpsc::channel::<DispatchRequest>();
        let rx = Arc::new(Mutex::new(rx));

        let joins = (0..workers.max(1))
            .map(|i| {
                let dispatcher = dispatcher.clone();
                let rx = rx.clone();
                thread::Builder::new()
                    .name(format!("notify-worker-{i}"))
                    .spawn(move || {
                        info!(worker = i, "notification worker started");
                        loop {
                            // Hold the lock only around recv; dispatch runs
                            // unlocked so the other workers keep draining.
                            let request = {
                                let rx = rx.lock().unwrap_or_else(|p| p.into_inner());
                                rx.recv()
                            };
                            match request {
                                Ok(request) => {
                                    dispatcher.notify(&request.event, &request.order)
                                }
                                Err(_) => break,
                            }
                        }
                        info!(worker = i, "notification worker stopped");
                    })
                    .expect("failed to spawn notification worker thread")
            })
            .collect();

        (NotifyHandle { tx }, NotifyWorkerHandle { joins })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifyConfig;
    use crate::record::NotificationStatus;
    use crate::store::{InMemoryNotificationStore, NotificationStore};
    use crate::template::{TemplateError, TemplateSource};
    use crate::transport::{MailTransport, TransportError};
    use chrono::Utc;
    use provend_orders::LineItem;
    use provend_vendors::{InMemoryVendorStore, Vendor, VendorStore};
    use std::time::{Duration, Instant};

    struct OkTransport;

    impl MailTransport for OkTransport {
        fn send(&self, _r: &str, _s: &str, _b: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    /// Blocks sends to one recipient until the gate channel fires.
    struct GatedTransport {
        blocked_recipient: String,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl MailTransport for GatedTransport {
        fn send(&self, recipient: &str, _s: &str, _b: &str) -> Result<(), TransportError> {
            if recipient == self.blocked_recipient {
                let _ = self.gate.lock().unwrap().recv();
            }
            Ok(())
        }
    }

    struct PlainTemplates;

    impl TemplateSource for PlainTemplates {
        fn load(&self, _name: &str) -> Result<String, TemplateError> {
            Ok("<html><body>{{orderNumber}}</body></html>".to_string())
        }
    }

    fn make_dispatcher(
        store: Arc<InMemoryNotificationStore>,
        vendors: Arc<InMemoryVendorStore>,
        transport: Arc<dyn MailTransport>,
        approvers: &str,
    ) -> Arc<NotificationDispatcher> {
        let config = NotifyConfig::new(
            approvers,
            3,
            Duration::ZERO,
            Duration::from_secs(600),
        )
        .unwrap();
        Arc::new(NotificationDispatcher::new(
            store,
            vendors,
            transport,
            Arc::new(PlainTemplates),
            config,
        ))
    }

    fn submitted_order(vendors: &Arc<InMemoryVendorStore>) -> Order {
        let vendor = Vendor::new("Acme Supplies", 90.0, 4.0, 70.0);
        vendors.save(&vendor).unwrap();
        let mut order = Order::new(
            vendor.id,
            "requester@corp.test",
            vec![LineItem::new("Widget", "", 1, 100).unwrap()],
            None,
            Utc::now(),
        )
        .unwrap();
        order.submit().unwrap();
        order
    }

    #[test]
    fn emitted_events_are_delivered_off_thread() {
        let store = InMemoryNotificationStore::arc();
        let vendors = InMemoryVendorStore::arc();
        let order = submitted_order(&vendors);
        let dispatcher =
            make_dispatcher(store.clone(), vendors, Arc::new(OkTransport), "alice@corp.test");

        let (handle, workers) = NotifyWorker::spawn(dispatcher);

        handle.emit(
            OrderEvent::Submitted {
                submitted_at: Utc::now(),
            },
            order.clone(),
        );

        // Dropping the only handle stops the pool after it drains.
        drop(handle);
        workers.join();

        let records = store.find_by_order(order.id).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, NotificationStatus::Sent);
    }

    #[test]
    fn a_blocked_delivery_does_not_stall_later_events() {
        let store = InMemoryNotificationStore::arc();
        let vendors = InMemoryVendorStore::arc();
        let mut order = submitted_order(&vendors);

        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let transport = Arc::new(GatedTransport {
            blocked_recipient: "blocked@corp.test".to_string(),
            gate: Mutex::new(gate_rx),
        });
        let dispatcher =
            make_dispatcher(store.clone(), vendors, transport, "blocked@corp.test");

        let (handle, workers) = NotifyWorker::spawn_pool(dispatcher, 2);

        // First event parks one worker inside the transport.
        handle.emit(
            OrderEvent::Submitted {
                submitted_at: Utc::now(),
            },
            order.clone(),
        );

        // Second event goes to the requester; the other worker must take it.
        order.approve("alice", Utc::now()).unwrap();
        handle.emit(OrderEvent::Approved, order.clone());

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let sent = store
                .find_by_order(order.id)
                .unwrap()
                .into_iter()
                .any(|r| {
                    r.recipient == "requester@corp.test" && r.status == NotificationStatus::Sent
                });
            if sent {
                break;
            }
            assert!(
                Instant::now() < deadline,
                "approval notification stalled behind a blocked delivery"
            );
            thread::sleep(Duration::from_millis(10));
        }

        // Release the parked worker and drain.
        gate_tx.send(()).unwrap();
        drop(gate_tx);
        drop(handle);
        workers.join();

        let records = store.find_by_order(order.id).unwrap();
        assert!(records
            .iter()
            .all(|r| r.status == NotificationStatus::Sent));
    }
}
