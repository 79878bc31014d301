// ABOUTME: Stage executor boundary for fetching, classifying, and compiling source.
// ABOUTME: Defines TreeSnapshot, BuildArtifact, StageError, and the StageExecutor trait.

mod git;

pub use git::GitStageExecutor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Handle to a fetched source tree on local disk.
#[derive(Debug, Clone)]
pub struct TreeSnapshot {
    root: PathBuf,
}

impl TreeSnapshot {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

/// A named, immutable unit of compiled output.
///
/// Produced once per run by the stage executor and consumed exactly once by
/// the publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildArtifact {
    pub name: String,
    pub bytecode: String,
    pub abi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
}

/// Errors from stage execution.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to fetch source: {0}")]
    FetchFailed(String),

    #[error("failed to inspect tree: {0}")]
    TreeUnreadable(String),

    #[error("build command failed: {0}")]
    BuildFailed(String),

    #[error("no build artifacts produced: {0}")]
    NoArtifacts(String),

    #[error("malformed build artifact {name}: {message}")]
    MalformedArtifact { name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opaque collaborator that turns a source location and revision into
/// compiled build artifacts.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    /// Fetch a snapshot of the source tree at the given revision.
    async fn fetch_tree(&self, source: &str, revision: &str) -> Result<TreeSnapshot, StageError>;

    /// Decide whether the tree qualifies as a recognized project.
    ///
    /// The tree qualifies if the artifacts-source directory is non-empty OR
    /// the build configuration file is readable. Either signal alone is
    /// sufficient. Classification runs before compilation so unrecognized
    /// trees fail before any build resources are spent.
    async fn classify(&self, tree: &TreeSnapshot) -> Result<bool, StageError>;

    /// Compile the tree into named build artifacts, keyed by artifact name.
    async fn compile(
        &self,
        tree: &TreeSnapshot,
    ) -> Result<BTreeMap<String, BuildArtifact>, StageError>;
}
