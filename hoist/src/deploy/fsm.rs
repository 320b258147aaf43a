//! Finite State Machine for a deployment run

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;

/// Deployment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    /// Nothing has run yet
    NotStarted,

    /// Provisioning steps 1-7 are running
    Provisioning,

    /// The service is being enabled, started and verified
    Starting,

    /// The service is active, probing the health endpoint
    HealthChecking,

    /// Deployed and the health probe succeeded
    Healthy,

    /// Deployed but the health probe failed
    Degraded,

    /// A step failed and the run was aborted
    Failed,
}

impl DeploymentState {
    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeploymentState::Healthy | DeploymentState::Degraded | DeploymentState::Failed
        )
    }
}

/// Deployment event
#[derive(Debug, Clone)]
pub enum DeploymentEvent {
    /// Begin provisioning
    Provision,

    /// All provisioning steps completed
    Provisioned,

    /// The service manager reports the service active
    StartVerified,

    /// The health endpoint answered with success
    ProbeSucceeded,

    /// The health endpoint did not answer with success
    ProbeFailed,

    /// An unrecovered error
    Fail(String),
}

/// Deployment FSM
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: DeploymentState,
    error: Option<String>,
    history: Vec<DeploymentState>,
}

impl DeploymentFsm {
    /// Create a new FSM in the not-started state
    pub fn new() -> Self {
        Self {
            state: DeploymentState::NotStarted,
            error: None,
            history: vec![DeploymentState::NotStarted],
        }
    }

    /// Get current state
    pub fn state(&self) -> DeploymentState {
        self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Every state visited, in order
    pub fn history(&self) -> &[DeploymentState] {
        &self.history
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<DeploymentState, DeployError> {
        let new_state = match (self.state, &event) {
            (DeploymentState::NotStarted, DeploymentEvent::Provision) => {
                DeploymentState::Provisioning
            }
            (DeploymentState::Provisioning, DeploymentEvent::Provisioned) => {
                DeploymentState::Starting
            }
            (DeploymentState::Starting, DeploymentEvent::StartVerified) => {
                DeploymentState::HealthChecking
            }
            (DeploymentState::HealthChecking, DeploymentEvent::ProbeSucceeded) => {
                DeploymentState::Healthy
            }
            (DeploymentState::HealthChecking, DeploymentEvent::ProbeFailed) => {
                DeploymentState::Degraded
            }
            (
                DeploymentState::Provisioning
                | DeploymentState::Starting
                | DeploymentState::HealthChecking,
                DeploymentEvent::Fail(err),
            ) => {
                self.error = Some(err.clone());
                DeploymentState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(DeployError::InvalidTransition(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        self.history.push(new_state);
        Ok(new_state)
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
