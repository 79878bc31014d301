// ABOUTME: Pipeline orchestrator owning the deployment status state machine.
// ABOUTME: Sequences fetch, classify, compile, publish, and persists the outcome.

mod reconcile;

pub use reconcile::{InitArgsFn, PublishOutcome};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::publish::Publisher;
use crate::record::{DeploymentRecord, DeploymentStatus, RecordStore};
use crate::stage::StageExecutor;
use crate::types::{DeploymentId, ProjectName};
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Errors that can occur during a pipeline run.
///
/// These never surface to the submitter directly; they are recorded as the
/// failed record's error message.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to fetch source tree: {0}")]
    FetchFailed(String),

    #[error("classification failed: {0}")]
    ClassifyFailed(String),

    #[error("not a recognized project: {0}")]
    NotRecognized(String),

    #[error("compilation failed: {0}")]
    CompileFailed(String),

    #[error("publish failed for artifact {artifact}: {message}")]
    PublishFailed { artifact: String, message: String },
}

/// Internal failure carrier for a run: the error plus any publish progress
/// reconciled before the failing call.
struct RunFailure {
    error: PipelineError,
    partial: Option<PublishOutcome>,
}

impl From<PipelineError> for RunFailure {
    fn from(error: PipelineError) -> Self {
        Self {
            error,
            partial: None,
        }
    }
}

/// A validated request to build and publish one revision of a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub source: String,
    pub revision: String,
    pub project_name: String,
}

impl SubmitRequest {
    /// Reject malformed submissions synchronously, before any record exists.
    pub fn validate(&self) -> Result<()> {
        if self.source.is_empty() {
            return Err(Error::Validation("source location cannot be empty".into()));
        }
        if self.revision.is_empty() {
            return Err(Error::Validation("revision cannot be empty".into()));
        }
        ProjectName::new(&self.project_name)
            .map_err(|e| Error::Validation(e.to_string()))?;
        Ok(())
    }
}

/// Receipt for a scheduled pipeline run.
///
/// The identifier is persisted and visible in the record store before this
/// value is returned. `done` completes when the run reaches a terminal
/// state; callers that only poll the store may drop it.
pub struct Submission {
    pub id: DeploymentId,
    pub done: JoinHandle<()>,
}

/// Sequences the pipeline stages for each submitted deployment and writes
/// outcomes through the record store.
///
/// Collaborators are injected at construction. Each run executes on its own
/// spawned task; the orchestrator holds no lock across runs.
pub struct Orchestrator<S, E, P> {
    store: Arc<S>,
    executor: Arc<E>,
    publisher: Arc<P>,
    config: Config,
    init_args: Arc<InitArgsFn>,
}

impl<S, E, P> Clone for Orchestrator<S, E, P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            executor: Arc::clone(&self.executor),
            publisher: Arc::clone(&self.publisher),
            config: self.config.clone(),
            init_args: Arc::clone(&self.init_args),
        }
    }
}

impl<S, E, P> Orchestrator<S, E, P>
where
    S: RecordStore + 'static,
    E: StageExecutor + 'static,
    P: Publisher + 'static,
{
    pub fn new(store: Arc<S>, executor: Arc<E>, publisher: Arc<P>, config: Config) -> Self {
        Self {
            store,
            executor,
            publisher,
            config,
            init_args: Arc::new(|_| Vec::new()),
        }
    }

    /// Override constructor-argument generation for publish calls.
    pub fn with_init_args(mut self, init_args: Arc<InitArgsFn>) -> Self {
        self.init_args = init_args;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Create the `pending` record and schedule the pipeline run.
    ///
    /// Returns as soon as the record is durably created; the run proceeds in
    /// the background and the caller polls the store for the outcome. Fails
    /// synchronously only on validation or record-store errors.
    pub async fn submit(&self, request: SubmitRequest) -> Result<Submission> {
        request.validate()?;

        let record = DeploymentRecord::pending(&request.project_name, &self.config.target_env);
        let id = self.store.create(record).await?;

        tracing::info!("Scheduled deployment {} for {}", id, request.project_name);

        let this = self.clone();
        let done = tokio::spawn(async move {
            this.run_pipeline(&request.source, &request.revision, id)
                .await;
        });

        Ok(Submission { id, done })
    }

    /// Entry point for inbound push events; converges on `submit`.
    pub async fn submit_event(&self, event: crate::inbound::PushEvent) -> Result<Submission> {
        self.submit(event.into_submit_request()?).await
    }

    /// Drive one deployment to a terminal state.
    ///
    /// Stages run in strict order; a failure at any stage stops the run and
    /// produces exactly one terminal write. Stage executor and publisher are
    /// each invoked at most once per run.
    pub async fn run_pipeline(&self, source: &str, revision: &str, id: DeploymentId) {
        if let Err(e) = self
            .store
            .update_status(id, DeploymentStatus::Building, "")
            .await
        {
            tracing::warn!("Failed to mark deployment {} as building: {}", id, e);
        }

        match self.execute_stages(source, revision).await {
            Ok(outcome) => self.persist_success(id, outcome).await,
            Err(failure) => {
                tracing::error!("Pipeline for deployment {} failed: {}", id, failure.error);
                self.persist_failure(id, failure).await;
            }
        }
    }

    async fn execute_stages(
        &self,
        source: &str,
        revision: &str,
    ) -> std::result::Result<PublishOutcome, RunFailure> {
        let tree = self
            .executor
            .fetch_tree(source, revision)
            .await
            .map_err(|e| PipelineError::FetchFailed(e.to_string()))?;

        // Cheap classification before expensive compilation.
        let recognized = self
            .executor
            .classify(&tree)
            .await
            .map_err(|e| PipelineError::ClassifyFailed(e.to_string()))?;

        if !recognized {
            return Err(PipelineError::NotRecognized(format!(
                "tree has neither a populated {}/ directory nor a readable {}",
                self.config.build.sources_dir, self.config.build.config_file
            ))
            .into());
        }

        let artifacts = self
            .executor
            .compile(&tree)
            .await
            .map_err(|e| PipelineError::CompileFailed(e.to_string()))?;

        tracing::info!("Compiled {} artifact(s), publishing", artifacts.len());

        reconcile::publish_all(
            self.publisher.as_ref(),
            &self.config.target_env,
            &artifacts,
            self.init_args.as_ref(),
        )
        .await
        .map_err(|(partial, error)| RunFailure {
            error,
            partial: Some(partial),
        })
    }

    /// Single terminal write on failure. A publish failure carries the
    /// partial outcome so already-placed artifacts stay visible; earlier
    /// stage failures take the narrow status-only path.
    async fn persist_failure(&self, id: DeploymentId, failure: RunFailure) {
        let message = failure.error.to_string();

        let Some(partial) = failure.partial else {
            if let Err(e) = self
                .store
                .update_status(id, DeploymentStatus::Failed, &message)
                .await
            {
                tracing::error!("Failed to record failure for deployment {}: {}", id, e);
            }
            return;
        };

        let mut record = match self.store.get(id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    "Deployment {} failed and its record could not be read: {}",
                    id,
                    e
                );
                return;
            }
        };

        record.placements = partial.placements;
        record.transactions = partial.transactions;
        record.total_cost = partial.total_cost;
        let record = record.failed(message);

        if let Err(e) = self.store.update(&record).await {
            tracing::error!("Failed to record failure for deployment {}: {}", id, e);
        }
    }

    /// Single terminal write on success. If the store fails here the run's
    /// in-memory outcome is lost for this record; no retry is attempted.
    async fn persist_success(&self, id: DeploymentId, outcome: PublishOutcome) {
        let record = match self.store.get(id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    "Deployment {} succeeded but its record could not be read: {}",
                    id,
                    e
                );
                return;
            }
        };

        let target_url = self.config.result_url(&record.project_name);
        let record = record.deployed(
            target_url,
            outcome.placements,
            outcome.transactions,
            outcome.total_cost,
        );

        if let Err(e) = self.store.update(&record).await {
            tracing::error!(
                "Deployment {} succeeded but the outcome could not be persisted: {}",
                id,
                e
            );
        } else {
            tracing::info!("Deployment {} deployed", id);
        }
    }
}
