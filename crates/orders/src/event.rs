//! Lifecycle events emitted by successful order transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::order::Order;

/// Event emitted after a transition is durably committed.
///
/// Only transitions that notify stakeholders emit events; `create`, `start`,
/// `deliver` and `cancel` are silent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    /// The order entered `PENDING_APPROVAL`; approvers are notified.
    Submitted { submitted_at: DateTime<Utc> },
    /// The order was approved; the requester is notified.
    Approved,
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Submitted { .. } => "procurement.order.submitted",
            OrderEvent::Approved => "procurement.order.approved",
        }
    }
}

/// Seam between the lifecycle engine and the notification engine.
///
/// `emit` must not block on delivery: implementations hand the event to an
/// independent execution path. A lost or failed notification never affects
/// the transition that produced the event.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OrderEvent, order: Order);
}

/// Sink that drops every event. Useful where notifications are irrelevant.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: OrderEvent, _order: Order) {}
}
