// ABOUTME: Read-only health probe over the record store and publisher.
// ABOUTME: Reports which collaborator is degraded, never mutates anything.

use crate::publish::Publisher;
use crate::record::RecordStore;
use serde::Serialize;

/// Health of one collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                ok: true,
                error: None,
            },
            Err(e) => Self {
                ok: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Composed health of the deployment system's collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub record_store: ComponentHealth,
    pub publisher: ComponentHealth,
}

/// Probe record store and publisher reachability.
pub async fn check<S, P>(store: &S, publisher: &P) -> HealthReport
where
    S: RecordStore + ?Sized,
    P: Publisher + ?Sized,
{
    let record_store = ComponentHealth::from_result(store.ping().await);
    let publisher = ComponentHealth::from_result(publisher.test_connection().await);

    HealthReport {
        healthy: record_store.ok && publisher.ok,
        record_store,
        publisher,
    }
}
