//! Notification record storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use provend_core::{NotificationId, OrderId};

use crate::record::{NotificationRecord, NotificationStatus};

/// Notification store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotificationStoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Notification record store abstraction.
///
/// `save` is an atomic upsert; the retry loop persists after every attempt,
/// so the stored record always reflects the true attempt count even if the
/// process dies mid-retry.
pub trait NotificationStore: Send + Sync {
    fn save(&self, record: &NotificationRecord) -> Result<(), NotificationStoreError>;

    fn get(&self, id: NotificationId)
        -> Result<Option<NotificationRecord>, NotificationStoreError>;

    fn find_by_status(
        &self,
        status: NotificationStatus,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError>;

    /// Records with status `FAILED` and attempt count below `max_attempts`.
    fn find_retryable(
        &self,
        max_attempts: u32,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError>;

    fn find_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError>;

    /// All records, newest first.
    fn list_all(&self) -> Result<Vec<NotificationRecord>, NotificationStoreError>;
}

/// In-memory notification store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    records: RwLock<HashMap<NotificationId, NotificationRecord>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn collect_sorted<F>(&self, predicate: F) -> Vec<NotificationRecord>
    where
        F: Fn(&NotificationRecord) -> bool,
    {
        let records = self.records.read().unwrap();
        let mut result: Vec<_> = records.values().filter(|r| predicate(r)).cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn save(&self, record: &NotificationRecord) -> Result<(), NotificationStoreError> {
        let mut records = self.records.write().unwrap();
        records.insert(record.id, record.clone());
        Ok(())
    }

    fn get(
        &self,
        id: NotificationId,
    ) -> Result<Option<NotificationRecord>, NotificationStoreError> {
        let records = self.records.read().unwrap();
        Ok(records.get(&id).cloned())
    }

    fn find_by_status(
        &self,
        status: NotificationStatus,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError> {
        Ok(self.collect_sorted(|r| r.status == status))
    }

    fn find_retryable(
        &self,
        max_attempts: u32,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError> {
        Ok(self.collect_sorted(|r| r.is_retryable(max_attempts)))
    }

    fn find_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError> {
        Ok(self.collect_sorted(|r| r.order_id == order_id))
    }

    fn list_all(&self) -> Result<Vec<NotificationRecord>, NotificationStoreError> {
        Ok(self.collect_sorted(|_| true))
    }
}

impl<S: NotificationStore + ?Sized> NotificationStore for Arc<S> {
    fn save(&self, record: &NotificationRecord) -> Result<(), NotificationStoreError> {
        (**self).save(record)
    }

    fn get(
        &self,
        id: NotificationId,
    ) -> Result<Option<NotificationRecord>, NotificationStoreError> {
        (**self).get(id)
    }

    fn find_by_status(
        &self,
        status: NotificationStatus,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError> {
        (**self).find_by_status(status)
    }

    fn find_retryable(
        &self,
        max_attempts: u32,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError> {
        (**self).find_retryable(max_attempts)
    }

    fn find_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<NotificationRecord>, NotificationStoreError> {
        (**self).find_by_order(order_id)
    }

    fn list_all(&self) -> Result<Vec<NotificationRecord>, NotificationStoreError> {
        (**self).list_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(order_id: OrderId) -> NotificationRecord {
        NotificationRecord::new("a@corp.test", "s", "b", order_id, Utc::now())
    }

    #[test]
    fn find_retryable_excludes_sent_pending_and_exhausted() {
        let store = InMemoryNotificationStore::new();
        let order_id = OrderId::new();

        let pending = record(order_id);
        store.save(&pending).unwrap();

        let mut sent = record(order_id);
        sent.begin_attempt();
        sent.mark_sent(Utc::now());
        store.save(&sent).unwrap();

        let mut retryable = record(order_id);
        retryable.begin_attempt();
        retryable.mark_failed("boom");
        store.save(&retryable).unwrap();

        let mut exhausted = record(order_id);
        for _ in 0..3 {
            exhausted.begin_attempt();
        }
        exhausted.mark_failed("boom");
        store.save(&exhausted).unwrap();

        let found = store.find_retryable(3).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, retryable.id);
    }

    #[test]
    fn find_by_order_filters_and_save_upserts() {
        let store = InMemoryNotificationStore::new();
        let order_a = OrderId::new();
        let order_b = OrderId::new();

        let mut r = record(order_a);
        store.save(&r).unwrap();
        store.save(&record(order_b)).unwrap();

        r.begin_attempt();
        r.mark_failed("boom");
        store.save(&r).unwrap();

        let found = store.find_by_order(order_a).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].attempts, 1);
        assert_eq!(store.list_all().unwrap().len(), 2);
    }
}
