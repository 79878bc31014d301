// ABOUTME: File-backed RecordStore persisting records as a JSON document.
// ABOUTME: Keeps CLI invocations able to read outcomes of earlier runs.

use super::{DeploymentRecord, DeploymentStatus, RecordError, RecordStore};
use crate::types::DeploymentId;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    next_id: u64,
    records: BTreeMap<u64, DeploymentRecord>,
}

/// Record store backed by a single JSON file.
///
/// All operations load and rewrite the whole document under one lock. That
/// serializes every write, which is stricter than the per-record requirement
/// but fine at CLI scale.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Document, RecordError> {
        match std::fs::read(&self.path) {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| RecordError::Unavailable(format!("corrupt store file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(RecordError::Unavailable(e.to_string())),
        }
    }

    fn save(&self, doc: &Document) -> Result<(), RecordError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RecordError::Unavailable(e.to_string()))?;
        }
        let raw = serde_json::to_vec_pretty(doc)
            .map_err(|e| RecordError::Unavailable(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| RecordError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn create(&self, mut record: DeploymentRecord) -> Result<DeploymentId, RecordError> {
        let _guard = self.lock.lock();
        let mut doc = self.load()?;
        doc.next_id += 1;
        let id = DeploymentId::new(doc.next_id);
        record.id = id;
        doc.records.insert(id.value(), record);
        self.save(&doc)?;
        Ok(id)
    }

    async fn get(&self, id: DeploymentId) -> Result<DeploymentRecord, RecordError> {
        let _guard = self.lock.lock();
        self.load()?
            .records
            .remove(&id.value())
            .ok_or(RecordError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<DeploymentRecord>, RecordError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.records.into_values().rev().collect())
    }

    async fn update(&self, record: &DeploymentRecord) -> Result<(), RecordError> {
        let _guard = self.lock.lock();
        let mut doc = self.load()?;
        if !doc.records.contains_key(&record.id.value()) {
            return Err(RecordError::NotFound(record.id));
        }
        doc.records.insert(record.id.value(), record.clone());
        self.save(&doc)
    }

    async fn update_status(
        &self,
        id: DeploymentId,
        status: DeploymentStatus,
        error_message: &str,
    ) -> Result<(), RecordError> {
        let _guard = self.lock.lock();
        let mut doc = self.load()?;
        let record = doc
            .records
            .get_mut(&id.value())
            .ok_or(RecordError::NotFound(id))?;
        record.status = status;
        record.error_message = error_message.to_string();
        record.updated_at = Utc::now();
        self.save(&doc)
    }

    async fn ping(&self) -> Result<(), RecordError> {
        let _guard = self.lock.lock();
        self.load().map(|_| ())
    }
}
