//! Vendor storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use provend_core::VendorId;

use crate::vendor::Vendor;

/// Vendor store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VendorStoreError {
    #[error("vendor not found: {0}")]
    NotFound(VendorId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Vendor store abstraction.
pub trait VendorStore: Send + Sync {
    /// Insert or replace a vendor.
    fn save(&self, vendor: &Vendor) -> Result<(), VendorStoreError>;

    /// Fetch a vendor by id.
    fn get(&self, id: VendorId) -> Result<Option<Vendor>, VendorStoreError>;

    /// List all vendors, sorted by name.
    fn list(&self) -> Result<Vec<Vendor>, VendorStoreError>;

    /// Delete a vendor.
    fn delete(&self, id: VendorId) -> Result<(), VendorStoreError>;
}

/// In-memory vendor store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryVendorStore {
    vendors: RwLock<HashMap<VendorId, Vendor>>,
}

impl InMemoryVendorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl VendorStore for InMemoryVendorStore {
    fn save(&self, vendor: &Vendor) -> Result<(), VendorStoreError> {
        let mut vendors = self.vendors.write().unwrap();
        vendors.insert(vendor.id, vendor.clone());
        Ok(())
    }

    fn get(&self, id: VendorId) -> Result<Option<Vendor>, VendorStoreError> {
        let vendors = self.vendors.read().unwrap();
        Ok(vendors.get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Vendor>, VendorStoreError> {
        let vendors = self.vendors.read().unwrap();
        let mut result: Vec<_> = vendors.values().cloned().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn delete(&self, id: VendorId) -> Result<(), VendorStoreError> {
        let mut vendors = self.vendors.write().unwrap();
        vendors
            .remove(&id)
            .map(|_| ())
            .ok_or(VendorStoreError::NotFound(id))
    }
}

impl<S: VendorStore + ?Sized> VendorStore for Arc<S> {
    fn save(&self, vendor: &Vendor) -> Result<(), VendorStoreError> {
        (**self).save(vendor)
    }

    fn get(&self, id: VendorId) -> Result<Option<Vendor>, VendorStoreError> {
        (**self).get(id)
    }

    fn list(&self) -> Result<Vec<Vendor>, VendorStoreError> {
        (**self).list()
    }

    fn delete(&self, id: VendorId) -> Result<(), VendorStoreError> {
        (**self).delete(id)
    }
}
