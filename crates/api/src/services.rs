//! Application service wiring shared by all routes.

use std::sync::Arc;

use provend_notify::{NotificationDispatcher, NotificationStore};
use provend_orders::ProcurementService;
use provend_vendors::VendorStore;

pub struct AppServices {
    pub procurement: ProcurementService,
    pub vendors: Arc<dyn VendorStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AppServices {
    pub fn new(
        procurement: ProcurementService,
        vendors: Arc<dyn VendorStore>,
        notifications: Arc<dyn NotificationStore>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            procurement,
            vendors,
            notifications,
            dispatcher,
        }
    }
}
