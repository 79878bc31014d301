// ABOUTME: Publisher boundary for placing compiled artifacts in a target environment.
// ABOUTME: Defines PublishReceipt, PublishError, and the Publisher trait.

mod http;

pub use http::HttpPublisher;

use crate::stage::BuildArtifact;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw per-artifact response from a publish call.
///
/// Every field is optional: the target environment does not guarantee any of
/// them, and reconciliation decides how to treat absences. The cost figure is
/// kept as the wire string and parsed during reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
}

/// Errors from publisher operations.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("publish endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("publish request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed publish response: {0}")]
    MalformedResponse(String),
}

/// Opaque collaborator that places one compiled artifact into a target
/// environment and reports placement, transaction, and cost metadata.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a single artifact with the given constructor arguments.
    async fn publish(
        &self,
        target_env: &str,
        artifact: &BuildArtifact,
        init_args: &[serde_json::Value],
    ) -> Result<PublishReceipt, PublishError>;

    /// Health probe with no side effects.
    async fn test_connection(&self) -> Result<(), PublishError>;
}
