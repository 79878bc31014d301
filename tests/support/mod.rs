// ABOUTME: Shared mock collaborators for integration tests.
// ABOUTME: Scriptable stage executor and publisher with call recording.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use chainlift::publish::{PublishError, PublishReceipt, Publisher};
use chainlift::stage::{BuildArtifact, StageError, StageExecutor, TreeSnapshot};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Stage executor whose classify and compile results are scripted.
pub struct MockExecutor {
    pub classifies: bool,
    pub artifacts: BTreeMap<String, BuildArtifact>,
    pub fetch_error: Option<String>,
    pub compile_error: Option<String>,
    fetches: Mutex<usize>,
}

impl MockExecutor {
    pub fn recognizing(artifacts: BTreeMap<String, BuildArtifact>) -> Self {
        Self {
            classifies: true,
            artifacts,
            fetch_error: None,
            compile_error: None,
            fetches: Mutex::new(0),
        }
    }

    pub fn unrecognized() -> Self {
        Self {
            classifies: false,
            artifacts: BTreeMap::new(),
            fetch_error: None,
            compile_error: None,
            fetches: Mutex::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock()
    }
}

#[async_trait]
impl StageExecutor for MockExecutor {
    async fn fetch_tree(&self, _source: &str, _revision: &str) -> Result<TreeSnapshot, StageError> {
        *self.fetches.lock() += 1;
        if let Some(message) = &self.fetch_error {
            return Err(StageError::FetchFailed(message.clone()));
        }
        Ok(TreeSnapshot::new(PathBuf::from("/nonexistent/mock-tree")))
    }

    async fn classify(&self, _tree: &TreeSnapshot) -> Result<bool, StageError> {
        Ok(self.classifies)
    }

    async fn compile(
        &self,
        _tree: &TreeSnapshot,
    ) -> Result<BTreeMap<String, BuildArtifact>, StageError> {
        if let Some(message) = &self.compile_error {
            return Err(StageError::BuildFailed(message.clone()));
        }
        Ok(self.artifacts.clone())
    }
}

/// Publisher returning scripted receipts keyed by artifact name.
pub struct MockPublisher {
    receipts: HashMap<String, Result<PublishReceipt, String>>,
    calls: Mutex<Vec<String>>,
    pub healthy: bool,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            receipts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            healthy: true,
        }
    }

    pub fn receipt(
        mut self,
        name: &str,
        placement: Option<&str>,
        transaction: Option<&str>,
        cost: Option<&str>,
    ) -> Self {
        self.receipts.insert(
            name.to_string(),
            Ok(PublishReceipt {
                placement: placement.map(String::from),
                transaction: transaction.map(String::from),
                cost: cost.map(String::from),
            }),
        );
        self
    }

    pub fn failing(mut self, name: &str, message: &str) -> Self {
        self.receipts
            .insert(name.to_string(), Err(message.to_string()));
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(
        &self,
        _target_env: &str,
        artifact: &BuildArtifact,
        _init_args: &[serde_json::Value],
    ) -> Result<PublishReceipt, PublishError> {
        self.calls.lock().push(artifact.name.clone());
        match self.receipts.get(&artifact.name) {
            Some(Ok(receipt)) => Ok(receipt.clone()),
            Some(Err(message)) => Err(PublishError::Unreachable(message.clone())),
            None => Ok(PublishReceipt::default()),
        }
    }

    async fn test_connection(&self) -> Result<(), PublishError> {
        if self.healthy {
            Ok(())
        } else {
            Err(PublishError::Unreachable("connection refused".to_string()))
        }
    }
}

pub fn artifact(name: &str) -> BuildArtifact {
    BuildArtifact {
        name: name.to_string(),
        bytecode: "0x6001600101".to_string(),
        abi: "[]".to_string(),
        source: None,
        compiler_version: Some("0.8.19".to_string()),
    }
}

pub fn artifact_set(names: &[&str]) -> BTreeMap<String, BuildArtifact> {
    names
        .iter()
        .map(|n| (n.to_string(), artifact(n)))
        .collect()
}
