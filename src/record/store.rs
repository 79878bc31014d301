// ABOUTME: RecordStore trait defining the persistence boundary.
// ABOUTME: Create, get, list, update, and the narrow status-only update.

use super::{DeploymentRecord, DeploymentStatus};
use crate::types::DeploymentId;
use async_trait::async_trait;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("deployment not found: {0}")]
    NotFound(DeploymentId),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable mapping from deployment identifier to deployment state.
///
/// A single record is only ever written by the run that owns it, but the
/// store must be safe for concurrent writes across different identifiers.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record, assigning and returning its identifier.
    async fn create(&self, record: DeploymentRecord) -> Result<DeploymentId, RecordError>;

    /// Fetch a record by identifier.
    async fn get(&self, id: DeploymentId) -> Result<DeploymentRecord, RecordError>;

    /// List all records, most recent first.
    async fn list(&self) -> Result<Vec<DeploymentRecord>, RecordError>;

    /// Write back a full record snapshot.
    async fn update(&self, record: &DeploymentRecord) -> Result<(), RecordError>;

    /// Narrow update of status and error message, used for failure
    /// short-circuits and the building transition.
    async fn update_status(
        &self,
        id: DeploymentId,
        status: DeploymentStatus,
        error_message: &str,
    ) -> Result<(), RecordError>;

    /// Reachability probe for the health surface.
    async fn ping(&self) -> Result<(), RecordError>;
}
