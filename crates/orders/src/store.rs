//! Order storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use provend_core::{OrderId, VendorId};

use crate::order::{Order, OrderStatus};

/// Order store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderStoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Order store abstraction.
///
/// `save` is an atomic upsert of the whole order: a transition is committed
/// by writing the mutated copy in one call, so a failed transition leaves the
/// stored order byte-for-byte unchanged.
pub trait OrderStore: Send + Sync {
    fn save(&self, order: &Order) -> Result<(), OrderStoreError>;

    fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// All orders, newest first.
    fn list_all(&self) -> Result<Vec<Order>, OrderStoreError>;

    fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderStoreError>;

    fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, OrderStoreError>;
}

/// In-memory order store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn collect_sorted<F>(&self, predicate: F) -> Vec<Order>
    where
        F: Fn(&Order) -> bool,
    {
        let orders = self.orders.read().unwrap();
        let mut result: Vec<_> = orders.values().filter(|o| predicate(o)).cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }
}

impl OrderStore for InMemoryOrderStore {
    fn save(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut orders = self.orders.write().unwrap();
        orders.insert(order.id, order.clone());
        Ok(())
    }

    fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        let orders = self.orders.read().unwrap();
        Ok(orders.get(&id).cloned())
    }

    fn list_all(&self) -> Result<Vec<Order>, OrderStoreError> {
        Ok(self.collect_sorted(|_| true))
    }

    fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderStoreError> {
        Ok(self.collect_sorted(|o| o.status == status))
    }

    fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, OrderStoreError> {
        Ok(self.collect_sorted(|o| o.vendor_id == vendor_id))
    }
}

impl<S: OrderStore + ?Sized> OrderStore for Arc<S> {
    fn save(&self, order: &Order) -> Result<(), OrderStoreError> {
        (**self).save(order)
    }

    fn get(&self, id: OrderId) -> Result<Option<Order>, OrderStoreError> {
        (**self).get(id)
    }

    fn list_all(&self) -> Result<Vec<Order>, OrderStoreError> {
        (**self).list_all()
    }

    fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, OrderStoreError> {
        (**self).list_by_status(status)
    }

    fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Order>, OrderStoreError> {
        (**self).list_by_vendor(vendor_id)
    }
}
