// ABOUTME: Deployment record model and the persistent store boundary.
// ABOUTME: Records are immutable snapshots; stages produce new values.

mod file;
mod memory;
mod status;
mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use status::DeploymentStatus;
pub use store::{RecordError, RecordStore};

use crate::types::{DeploymentId, PlacementId, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Durable state of one deployment run.
///
/// The store exclusively owns the persisted copy; the orchestrator holds a
/// transient snapshot during a run and writes the latest snapshot back.
/// Invariants: `Deployed` implies a non-empty target URL, `Failed` implies a
/// non-empty error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: DeploymentId,
    pub project_name: String,
    pub status: DeploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    pub placements: BTreeMap<String, PlacementId>,
    pub transactions: Vec<TransactionId>,
    pub target_env: String,
    pub total_cost: u64,
    #[serde(default)]
    pub error_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Create the initial `Pending` snapshot. The store assigns the real id
    /// on `create`; until then the id is a placeholder.
    pub fn pending(project_name: &str, target_env: &str) -> Self {
        let now = Utc::now();
        Self {
            id: DeploymentId::new(0),
            project_name: project_name.to_string(),
            status: DeploymentStatus::Pending,
            target_url: None,
            placements: BTreeMap::new(),
            transactions: Vec::new(),
            target_env: target_env.to_string(),
            total_cost: 0,
            error_message: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot for the start of stage work.
    pub fn started_building(mut self) -> Self {
        self.status = DeploymentStatus::Building;
        self.updated_at = Utc::now();
        self
    }

    /// Terminal failure snapshot. Placement and transaction fields keep
    /// whatever the run had reconciled before it failed.
    pub fn failed(mut self, message: String) -> Self {
        self.status = DeploymentStatus::Failed;
        self.error_message = message;
        self.updated_at = Utc::now();
        self
    }

    /// Terminal success snapshot carrying the normalized publish outcome.
    pub fn deployed(
        mut self,
        target_url: String,
        placements: BTreeMap<String, PlacementId>,
        transactions: Vec<TransactionId>,
        total_cost: u64,
    ) -> Self {
        self.status = DeploymentStatus::Deployed;
        self.target_url = Some(target_url);
        self.placements = placements;
        self.transactions = transactions;
        self.total_cost = total_cost;
        self.error_message = String::new();
        self.updated_at = Utc::now();
        self
    }
}
