//! FSM unit tests

use hoist::deploy::fsm::{DeploymentEvent, DeploymentFsm, DeploymentState};
use hoist::errors::DeployError;

fn advance(fsm: &mut DeploymentFsm, events: Vec<DeploymentEvent>) {
    for event in events {
        fsm.process(event).unwrap();
    }
}

#[test]
fn test_fsm_initial_state() {
    let fsm = DeploymentFsm::new();
    assert_eq!(fsm.state(), DeploymentState::NotStarted);
    assert!(fsm.error().is_none());
    assert_eq!(fsm.history(), &[DeploymentState::NotStarted]);
}

#[test]
fn test_fsm_healthy_flow() {
    let mut fsm = DeploymentFsm::new();

    fsm.process(DeploymentEvent::Provision).unwrap();
    assert_eq!(fsm.state(), DeploymentState::Provisioning);

    fsm.process(DeploymentEvent::Provisioned).unwrap();
    assert_eq!(fsm.state(), DeploymentState::Starting);

    fsm.process(DeploymentEvent::StartVerified).unwrap();
    assert_eq!(fsm.state(), DeploymentState::HealthChecking);

    fsm.process(DeploymentEvent::ProbeSucceeded).unwrap();
    assert_eq!(fsm.state(), DeploymentState::Healthy);
    assert!(fsm.state().is_terminal());
}

#[test]
fn test_fsm_degraded_flow() {
    let mut fsm = DeploymentFsm::new();
    advance(
        &mut fsm,
        vec![
            DeploymentEvent::Provision,
            DeploymentEvent::Provisioned,
            DeploymentEvent::StartVerified,
            DeploymentEvent::ProbeFailed,
        ],
    );

    assert_eq!(fsm.state(), DeploymentState::Degraded);
    assert!(fsm.error().is_none());
}

#[test]
fn test_fsm_failure_from_each_active_state() {
    let prefixes = vec![
        vec![DeploymentEvent::Provision],
        vec![DeploymentEvent::Provision, DeploymentEvent::Provisioned],
        vec![
            DeploymentEvent::Provision,
            DeploymentEvent::Provisioned,
            DeploymentEvent::StartVerified,
        ],
    ];

    for prefix in prefixes {
        let mut fsm = DeploymentFsm::new();
        advance(&mut fsm, prefix);
        fsm.process(DeploymentEvent::Fail("boom".to_string())).unwrap();

        assert_eq!(fsm.state(), DeploymentState::Failed);
        assert_eq!(fsm.error(), Some("boom"));
    }
}

#[test]
fn test_fsm_invalid_transitions() {
    let mut fsm = DeploymentFsm::new();

    // Cannot fail before anything started
    let result = fsm.process(DeploymentEvent::Fail("early".to_string()));
    assert!(matches!(result, Err(DeployError::InvalidTransition(_))));

    // Cannot skip provisioning
    assert!(fsm.process(DeploymentEvent::StartVerified).is_err());
    assert_eq!(fsm.state(), DeploymentState::NotStarted);
}

#[test]
fn test_fsm_terminal_states_are_final() {
    let mut fsm = DeploymentFsm::new();
    advance(
        &mut fsm,
        vec![
            DeploymentEvent::Provision,
            DeploymentEvent::Fail("disk full".to_string()),
        ],
    );

    assert!(fsm.process(DeploymentEvent::Provision).is_err());
    assert!(fsm.process(DeploymentEvent::Fail("again".to_string())).is_err());
    assert_eq!(fsm.error(), Some("disk full"));
    assert_eq!(
        fsm.history(),
        &[
            DeploymentState::NotStarted,
            DeploymentState::Provisioning,
            DeploymentState::Failed,
        ]
    );
}
