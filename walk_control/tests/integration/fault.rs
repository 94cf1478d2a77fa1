//! Integration test: fault halts.
//!
//! Any IK, joint-bound or hardware failure halts the walk on the tick it
//! occurs: nothing is dispatched on that tick or later, the periodic trigger
//! is disconnected and actuator stiffness drops to zero exactly once.

use walk_common::config::{ConfigError, WalkConfig};
use walk_common::error::{HardwareError, StopReason, TickOutcome, WalkFault};
use walk_control::cycle::{StartError, WalkPhase};

use super::mocks::{MockController, MockPlan, controller, started, tick};

fn faulted_with(ctl: &mut MockController) -> WalkFault {
    match tick(ctl) {
        TickOutcome::FatalFault(f) => f,
        other => panic!("expected fault, got {other:?}"),
    }
}

#[test]
fn ik_failure_halts_without_dispatch() {
    let mut ctl = controller(WalkConfig::default());
    // Two lookahead solves per tick: call 5 is step 2 of tick 3.
    ctl.ik_mut().fail_on = Some(5);
    let mut ctl = started(ctl, MockPlan::continuing(10));

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(ctl.hardware().dispatched.len(), 4);

    assert_eq!(faulted_with(&mut ctl), WalkFault::IkNonConvergence { step: 2 });
    assert_eq!(ctl.hardware().dispatched.len(), 4);
    assert_eq!(ctl.phase(), WalkPhase::Faulted);
    assert!(!ctl.hardware().registered);
    assert_eq!(ctl.hardware().stiffness, vec![1.0, 0.0]);

    // Later ticks are no-ops reporting the same fault.
    for _ in 0..3 {
        assert_eq!(faulted_with(&mut ctl), WalkFault::IkNonConvergence { step: 2 });
    }
    assert_eq!(ctl.hardware().dispatched.len(), 4);
    assert_eq!(ctl.hardware().stiffness, vec![1.0, 0.0]);
    assert_eq!(ctl.hardware().unregister_calls, 1);
    assert_eq!(ctl.ik().targets.len(), 6);
}

#[test]
fn joint_bound_violation_reports_joint_index() {
    let mut ctl = controller(WalkConfig::default());
    ctl.ik_mut().out_of_bounds_on = Some((0, 7));
    let mut ctl = started(ctl, MockPlan::continuing(10));

    let fault = faulted_with(&mut ctl);
    assert_eq!(
        fault,
        WalkFault::JointBoundViolation {
            joint: 7,
            step: 1,
            angle: 9.0
        }
    );
    assert!(fault.to_string().contains("joint 7"));
    assert!(ctl.hardware().dispatched.is_empty());
    assert_eq!(ctl.hardware().stiffness.last(), Some(&0.0));
}

#[test]
fn first_step_valid_second_invalid_dispatches_nothing() {
    let mut ctl = controller(WalkConfig::default());
    ctl.ik_mut().out_of_bounds_on = Some((1, 0));
    let mut ctl = started(ctl, MockPlan::continuing(10));

    assert!(matches!(
        faulted_with(&mut ctl),
        WalkFault::JointBoundViolation { joint: 0, step: 2, .. }
    ));
    assert!(ctl.hardware().dispatched.is_empty());
}

#[test]
fn sensor_failure_halts() {
    let mut ctl = controller(WalkConfig::default());
    // Read 0 seeds the walk; read 3 is tick 3.
    ctl.hardware_mut().fail_read_on = Some(3);
    let mut ctl = started(ctl, MockPlan::continuing(10));

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(
        faulted_with(&mut ctl),
        WalkFault::HardwareIo(HardwareError::SensorRead("bus timeout".to_string()))
    );
    assert_eq!(ctl.hardware().dispatched.len(), 4);
    assert!(!ctl.hardware().registered);
    assert_eq!(ctl.hardware().stiffness.last(), Some(&0.0));
}

#[test]
fn trigger_registration_failure_fails_start() {
    let mut ctl = controller(WalkConfig::default());
    ctl.hardware_mut().register_fails = true;

    let err = ctl.start(MockPlan::continuing(10));
    assert!(matches!(err, Err(StartError::Hardware(HardwareError::Trigger(_)))));
    assert_eq!(ctl.phase(), WalkPhase::Faulted);
    assert_eq!(ctl.hardware().stiffness, vec![1.0, 0.0]);
    assert!(matches!(
        tick(&mut ctl),
        TickOutcome::FatalFault(WalkFault::HardwareIo(HardwareError::Trigger(_)))
    ));
    assert!(ctl.hardware().dispatched.is_empty());
}

#[test]
fn invalid_config_is_rejected_before_touching_hardware() {
    let mut config = WalkConfig::default();
    config.timing.control_period_ms = 0;
    let mut ctl = controller(config);

    let err = ctl.start(MockPlan::continuing(10));
    assert!(matches!(err, Err(StartError::Config(ConfigError::ValidationError(_)))));
    assert_eq!(ctl.phase(), WalkPhase::Idle);
    assert!(!ctl.hardware().registered);
    assert!(ctl.hardware().stiffness.is_empty());
    assert_eq!(ctl.hardware().reads, 0);
    assert_eq!(tick(&mut ctl), TickOutcome::GracefulStop(StopReason::StopRequested));
    assert!(ctl.hardware().dispatched.is_empty());
}

#[test]
fn faulted_walk_can_restart() {
    let mut ctl = controller(WalkConfig::default());
    ctl.ik_mut().fail_on = Some(0);
    let mut ctl = started(ctl, MockPlan::continuing(10));
    assert!(tick(&mut ctl).is_terminal());

    ctl.ik_mut().fail_on = None;
    ctl.start(MockPlan::continuing(10)).expect("restart");
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(ctl.hardware().stiffness, vec![1.0, 0.0, 1.0]);
    assert_eq!(ctl.hardware().dispatched.len(), 2);
}
