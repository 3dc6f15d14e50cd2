//! `provend-orders` — the procurement order lifecycle engine.
//!
//! Owns the order state machine (`DRAFT → PENDING_APPROVAL → APPROVED →
//! IN_PROGRESS → DELIVERED`, with `CANCELLED` reachable from any non-delivered
//! state), order storage, and the service that applies transitions and emits
//! lifecycle events toward the notification engine.

pub mod event;
pub mod order;
pub mod service;
pub mod store;

pub use event::{EventSink, NullEventSink, OrderEvent};
pub use order::{LineItem, Order, OrderStatus};
pub use service::{NewLineItem, NewOrder, ProcurementService};
pub use store::{InMemoryOrderStore, OrderStore, OrderStoreError};
