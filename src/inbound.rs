// ABOUTME: Inbound push-event adapter feeding the orchestrator entry point.
// ABOUTME: Translates a repository/ref payload into a SubmitRequest.

use crate::error::{Error, Result};
use crate::pipeline::SubmitRequest;
use serde::Deserialize;

/// Push notification payload from a source host.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    pub repository: PushRepository,
    /// Full ref string, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushRepository {
    pub clone_url: String,
}

impl PushEvent {
    /// Convert the event into the same submission triple the direct path
    /// uses. The branch is the ref with the `refs/heads/` prefix stripped;
    /// the project name is derived from the clone URL's final path segment.
    pub fn into_submit_request(self) -> Result<SubmitRequest> {
        if self.repository.clone_url.is_empty() {
            return Err(Error::Validation("event has no clone URL".into()));
        }

        let branch = self
            .git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref)
            .to_string();

        if branch.is_empty() {
            return Err(Error::Validation("event has no ref".into()));
        }

        let project_name = project_from_clone_url(&self.repository.clone_url)
            .ok_or_else(|| Error::Validation("cannot derive project name from clone URL".into()))?;

        let request = SubmitRequest {
            source: self.repository.clone_url,
            revision: branch,
            project_name,
        };
        request.validate()?;
        Ok(request)
    }
}

fn project_from_clone_url(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit('/').next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
