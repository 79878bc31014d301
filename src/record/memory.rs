// ABOUTME: In-memory RecordStore backed by a parking_lot RwLock.
// ABOUTME: Used by the CLI for single-process runs and by tests.

use super::{DeploymentRecord, DeploymentStatus, RecordError, RecordStore};
use crate::types::DeploymentId;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Default)]
struct Inner {
    next_id: u64,
    records: BTreeMap<DeploymentId, DeploymentRecord>,
}

/// Process-local record store.
///
/// Identifiers are assigned from a monotonically increasing counter, so
/// "most recent first" listing is descending id order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, mut record: DeploymentRecord) -> Result<DeploymentId, RecordError> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = DeploymentId::new(inner.next_id);
        record.id = id;
        inner.records.insert(id, record);
        Ok(id)
    }

    async fn get(&self, id: DeploymentId) -> Result<DeploymentRecord, RecordError> {
        self.inner
            .read()
            .records
            .get(&id)
            .cloned()
            .ok_or(RecordError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<DeploymentRecord>, RecordError> {
        Ok(self.inner.read().records.values().rev().cloned().collect())
    }

    async fn update(&self, record: &DeploymentRecord) -> Result<(), RecordError> {
        let mut inner = self.inner.write();
        match inner.records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(RecordError::NotFound(record.id)),
        }
    }

    async fn update_status(
        &self,
        id: DeploymentId,
        status: DeploymentStatus,
        error_message: &str,
    ) -> Result<(), RecordError> {
        let mut inner = self.inner.write();
        match inner.records.get_mut(&id) {
            Some(record) => {
                record.status = status;
                record.error_message = error_message.to_string();
                record.updated_at = Utc::now();
                Ok(())
            }
            None => Err(RecordError::NotFound(id)),
        }
    }

    async fn ping(&self) -> Result<(), RecordError> {
        Ok(())
    }
}
