// ABOUTME: Deployment status state machine.
// ABOUTME: Encodes the monotonic pending -> building -> deployed/failed transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a deployment record.
///
/// Transitions are monotonic and one-directional: once a state is left it is
/// never re-entered, and the two terminal states are sinks. `Failed` is
/// reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Building,
    Deployed,
    Failed,
}

impl DeploymentStatus {
    /// Whether this status is a terminal sink.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Deployed | DeploymentStatus::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn permits(&self, next: DeploymentStatus) -> bool {
        use DeploymentStatus::*;
        match (self, next) {
            (Pending, Building) => true,
            (Pending, Failed) | (Building, Failed) => true,
            (Building, Deployed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Building => "building",
            DeploymentStatus::Deployed => "deployed",
            DeploymentStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::DeploymentStatus::*;

    #[test]
    fn forward_transitions_permitted() {
        assert!(Pending.permits(Building));
        assert!(Building.permits(Deployed));
    }

    #[test]
    fn failure_reachable_from_any_non_terminal_state() {
        assert!(Pending.permits(Failed));
        assert!(Building.permits(Failed));
    }

    #[test]
    fn terminal_states_are_sinks() {
        for next in [Pending, Building, Deployed, Failed] {
            assert!(!Deployed.permits(next));
            assert!(!Failed.permits(next));
        }
    }

    #[test]
    fn no_backward_or_skipping_transitions() {
        assert!(!Building.permits(Pending));
        assert!(!Pending.permits(Deployed));
        assert!(!Pending.permits(Pending));
        assert!(!Building.permits(Building));
    }

    #[test]
    fn terminal_flags() {
        assert!(!Pending.is_terminal());
        assert!(!Building.is_terminal());
        assert!(Deployed.is_terminal());
        assert!(Failed.is_terminal());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Deployed).unwrap(), "\"deployed\"");
        assert_eq!(
            serde_json::from_str::<super::DeploymentStatus>("\"pending\"").unwrap(),
            Pending
        );
    }
}
