//! Lifecycle engine service.
//!
//! Applies transitions with read-modify-write atomicity per order: the order
//! is loaded, mutated on a copy, and committed with a single `save`. Events
//! are emitted only after the commit and travel through an [`EventSink`], so
//! notification latency and failures never reach the caller.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use provend_core::{DomainError, DomainResult, OrderId, VendorId};
use provend_vendors::VendorStore;

use crate::event::{EventSink, OrderEvent};
use crate::order::{LineItem, Order, OrderStatus};
use crate::store::{OrderStore, OrderStoreError};

/// Input for one line of a new order.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Input for order creation.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub vendor_id: VendorId,
    pub requested_by: String,
    pub notes: Option<String>,
    pub items: Vec<NewLineItem>,
}

/// Owns order lifecycle transitions and the queries over stored orders.
pub struct ProcurementService {
    orders: Arc<dyn OrderStore>,
    vendors: Arc<dyn VendorStore>,
    sink: Arc<dyn EventSink>,
}

impl ProcurementService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        vendors: Arc<dyn VendorStore>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            orders,
            vendors,
            sink,
        }
    }

    /// Create a new order in `DRAFT`.
    ///
    /// Validation (vendor exists, non-empty items, positive quantities,
    /// non-negative prices) happens before anything is persisted.
    pub fn create(&self, input: NewOrder) -> DomainResult<Order> {
        if self
            .vendors
            .get(input.vendor_id)
            .map_err(|e| DomainError::storage(e.to_string()))?
            .is_none()
        {
            return Err(DomainError::validation(format!(
                "vendor does not exist: {}",
                input.vendor_id
            )));
        }

        let items = input
            .items
            .into_iter()
            .map(|i| LineItem::new(i.name, i.description, i.quantity, i.unit_price_cents))
            .collect::<Result<Vec<_>, _>>()?;

        let order = Order::new(
            input.vendor_id,
            input.requested_by,
            items,
            input.notes,
            Utc::now(),
        )?;
        self.orders.save(&order).map_err(store_err)?;
        debug!(order_id = %order.id, order_number = %order.order_number, "order created");
        Ok(order)
    }

    /// `DRAFT → PENDING_APPROVAL`; notifies the configured approvers.
    pub fn submit(&self, id: OrderId) -> DomainResult<Order> {
        let mut order = self.load(id)?;
        order.submit()?;
        self.orders.save(&order).map_err(store_err)?;
        self.sink.emit(
            OrderEvent::Submitted {
                submitted_at: Utc::now(),
            },
            order.clone(),
        );
        Ok(order)
    }

    /// `PENDING_APPROVAL → APPROVED`; notifies the requester.
    pub fn approve(&self, id: OrderId, approver: &str) -> DomainResult<Order> {
        let mut order = self.load(id)?;
        order.approve(approver, Utc::now())?;
        self.orders.save(&order).map_err(store_err)?;
        self.sink.emit(OrderEvent::Approved, order.clone());
        Ok(order)
    }

    /// `APPROVED → IN_PROGRESS`.
    pub fn start(&self, id: OrderId) -> DomainResult<Order> {
        let mut order = self.load(id)?;
        order.start()?;
        self.orders.save(&order).map_err(store_err)?;
        Ok(order)
    }

    /// `IN_PROGRESS → DELIVERED`.
    pub fn deliver(&self, id: OrderId) -> DomainResult<Order> {
        let mut order = self.load(id)?;
        order.deliver(Utc::now())?;
        self.orders.save(&order).map_err(store_err)?;
        Ok(order)
    }

    /// Any non-delivered status → `CANCELLED`.
    pub fn cancel(&self, id: OrderId) -> DomainResult<Order> {
        let mut order = self.load(id)?;
        order.cancel()?;
        self.orders.save(&order).map_err(store_err)?;
        Ok(order)
    }

    pub fn get(&self, id: OrderId) -> DomainResult<Order> {
        self.load(id)
    }

    pub fn list_all(&self) -> DomainResult<Vec<Order>> {
        self.orders.list_all().map_err(store_err)
    }

    pub fn list_by_status(&self, status: &str) -> DomainResult<Vec<Order>> {
        let status: OrderStatus = status.parse()?;
        self.orders.list_by_status(status).map_err(store_err)
    }

    pub fn list_by_vendor(&self, vendor_id: VendorId) -> DomainResult<Vec<Order>> {
        self.orders.list_by_vendor(vendor_id).map_err(store_err)
    }

    fn load(&self, id: OrderId) -> DomainResult<Order> {
        self.orders
            .get(id)
            .map_err(store_err)?
            .ok_or(DomainError::NotFound)
    }
}

fn store_err(err: OrderStoreError) -> DomainError {
    DomainError::storage(err.to_string())
}
