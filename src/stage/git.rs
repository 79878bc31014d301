// ABOUTME: Stage executor backed by the git CLI and a configured build command.
// ABOUTME: Clones a shallow tree, classifies it on disk, and harvests artifact JSON.

use super::{BuildArtifact, StageError, StageExecutor, TreeSnapshot};
use crate::config::BuildConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::process::Command;

/// Executes pipeline stages locally: git for fetch, the configured build
/// command for compilation.
pub struct GitStageExecutor {
    build: BuildConfig,
}

impl GitStageExecutor {
    pub fn new(build: BuildConfig) -> Self {
        Self { build }
    }

    fn scratch_dir(&self) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("chainlift-{}-{}", std::process::id(), nanos))
    }
}

/// Shape of a build-tool artifact JSON file. Extra fields are ignored.
#[derive(Deserialize)]
struct ArtifactJson {
    bytecode: String,
    abi: serde_json::Value,
    #[serde(rename = "compilerVersion")]
    compiler_version: Option<String>,
}

#[async_trait]
impl StageExecutor for GitStageExecutor {
    async fn fetch_tree(&self, source: &str, revision: &str) -> Result<TreeSnapshot, StageError> {
        let dest = self.scratch_dir();

        tracing::info!("Cloning {} at {} into {}", source, revision, dest.display());

        let output = Command::new("git")
            .args(["clone", "--depth", "1", "--branch", revision, source])
            .arg(&dest)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| StageError::FetchFailed(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StageError::FetchFailed(format!(
                "git clone of {source} at {revision} failed: {}",
                stderr.trim()
            )));
        }

        Ok(TreeSnapshot::new(dest))
    }

    async fn classify(&self, tree: &TreeSnapshot) -> Result<bool, StageError> {
        if dir_has_entries(&tree.root().join(&self.build.sources_dir)).await? {
            return Ok(true);
        }

        // The sources directory was missing or empty; the build config file
        // alone is still a sufficient signal.
        Ok(file_is_readable(&tree.root().join(&self.build.config_file)).await)
    }

    async fn compile(
        &self,
        tree: &TreeSnapshot,
    ) -> Result<BTreeMap<String, BuildArtifact>, StageError> {
        let (program, args) = self
            .build
            .command
            .split_first()
            .ok_or_else(|| StageError::BuildFailed("build command is empty".to_string()))?;

        tracing::info!("Running build command: {}", self.build.command.join(" "));

        let output = Command::new(program)
            .args(args)
            .current_dir(tree.root())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| StageError::BuildFailed(format!("failed to run {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StageError::BuildFailed(format!(
                "{program} exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        harvest_artifacts(&tree.root().join(&self.build.artifacts_dir)).await
    }
}

async fn dir_has_entries(path: &Path) -> Result<bool, StageError> {
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(StageError::TreeUnreadable(format!(
                "{}: {e}",
                path.display()
            )));
        }
    };

    Ok(entries.next_entry().await?.is_some())
}

async fn file_is_readable(path: &Path) -> bool {
    tokio::fs::read(path).await.is_ok()
}

/// Walk the build tool's output layout: one directory per source file, each
/// containing `<Name>.json` artifacts alongside `.dbg.json` companions that
/// are skipped.
async fn harvest_artifacts(
    artifacts_root: &Path,
) -> Result<BTreeMap<String, BuildArtifact>, StageError> {
    let mut artifacts = BTreeMap::new();

    let mut source_dirs = tokio::fs::read_dir(artifacts_root).await.map_err(|e| {
        StageError::NoArtifacts(format!("{}: {e}", artifacts_root.display()))
    })?;

    while let Some(entry) = source_dirs.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }

        let source_file = entry.file_name().to_string_lossy().into_owned();
        let mut files = tokio::fs::read_dir(entry.path()).await?;
        while let Some(file) = files.next_entry().await? {
            let file_name = file.file_name().to_string_lossy().into_owned();
            let Some(name) = file_name.strip_suffix(".json") else {
                continue;
            };
            if name.ends_with(".dbg") {
                continue;
            }

            let raw = tokio::fs::read(file.path()).await?;
            let parsed: ArtifactJson = serde_json::from_slice(&raw).map_err(|e| {
                StageError::MalformedArtifact {
                    name: name.to_string(),
                    message: e.to_string(),
                }
            })?;

            let abi = serde_json::to_string(&parsed.abi).map_err(|e| {
                StageError::MalformedArtifact {
                    name: name.to_string(),
                    message: format!("ABI not serializable: {e}"),
                }
            })?;

            tracing::debug!("Harvested artifact {} from {}", name, file_name);

            artifacts.insert(
                name.to_string(),
                BuildArtifact {
                    name: name.to_string(),
                    bytecode: parsed.bytecode,
                    abi,
                    source: Some(source_file.clone()),
                    compiler_version: parsed.compiler_version,
                },
            );
        }
    }

    if artifacts.is_empty() {
        return Err(StageError::NoArtifacts(format!(
            "no artifact JSON files under {}",
            artifacts_root.display()
        )));
    }

    Ok(artifacts)
}
