// ABOUTME: Core identifier and name types shared across the crate.
// ABOUTME: Exports phantom-typed IDs and the validated ProjectName.

mod id;
mod project_name;

pub use id::{DeploymentId, Id, PlacementId, PlacementMarker, TransactionId, TransactionMarker};
pub use project_name::{ProjectName, ProjectNameError};
