//! `provend-vendors` — vendor records and performance scoring.

pub mod store;
pub mod vendor;

pub use store::{InMemoryVendorStore, VendorStore, VendorStoreError};
pub use vendor::{performance_score, Vendor};
