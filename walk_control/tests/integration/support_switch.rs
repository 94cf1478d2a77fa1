//! Integration test: support switching, drift correction and swing targets.

use walk_common::boundary::plan::ReformResult::{Continue, SwitchSupport};
use walk_common::config::WalkConfig;
use walk_common::error::TickOutcome;
use walk_common::types::{FootPose, SupportState};

use super::mocks::{
    MockController, MockPlan, controller, left_foot, right_foot, started, tick,
};

const TICKS_PER_INTERVAL: usize = 10;

fn run_intervals(ctl: &mut MockController, n: usize) {
    for _ in 0..n * TICKS_PER_INTERVAL {
        assert_eq!(tick(ctl), TickOutcome::Continue);
    }
}

#[test]
fn switch_flips_support_at_the_reform() {
    let mut ctl = started(
        controller(WalkConfig::default()),
        MockPlan::new(&[Continue, SwitchSupport, Continue, SwitchSupport]),
    );
    assert_eq!(ctl.support(), SupportState::SingleRight);

    run_intervals(&mut ctl, 1);
    assert_eq!(ctl.support(), SupportState::SingleRight);

    // Reform 2 happens on the first tick of the second interval.
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(ctl.support(), SupportState::SingleLeft);
    assert_eq!(ctl.record().support, SupportState::SingleLeft);

    run_intervals(&mut ctl, 2);
    assert_eq!(ctl.support(), SupportState::SingleRight);
}

#[test]
fn unconfirmed_consecutive_switch_is_suppressed() {
    let mut ctl = started(
        controller(WalkConfig::default()),
        MockPlan::new(&[SwitchSupport, SwitchSupport, Continue]).unconfirmed(1),
    );
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(ctl.support(), SupportState::SingleLeft);

    run_intervals(&mut ctl, 1);
    assert_eq!(ctl.support(), SupportState::SingleLeft);
}

#[test]
fn suppressed_switch_keeps_swinging_the_same_foot() {
    // The plan flips its own support on the unconfirmed switch; the
    // controller does not, and must keep the right foot on its own line.
    let mut ctl = started(
        controller(WalkConfig::default()),
        MockPlan::new(&[SwitchSupport, SwitchSupport, Continue]).unconfirmed(1),
    );
    let right_y = right_foot().y;
    let step_height = ctl.config().gait.step_height;

    run_intervals(&mut ctl, 2);
    assert_eq!(ctl.support(), SupportState::SingleLeft);
    assert_eq!(ctl.plan().map(|p| p.support), Some(SupportState::SingleRight));
    let targets = &ctl.ik().targets;
    assert_eq!(targets.len(), 4 * TICKS_PER_INTERVAL);
    for t in targets {
        assert_eq!(t.left, left_foot().on_ground());
        assert!((t.right.y - right_y).abs() < 1e-12);
        assert!(t.right.z >= 0.0 && t.right.z <= step_height + 1e-9);
    }

    // Next reform: the plan swings the controller's support foot; nothing lifts.
    run_intervals(&mut ctl, 1);
    for t in &ctl.ik().targets[4 * TICKS_PER_INTERVAL..] {
        assert_eq!(t.left.z, 0.0);
        assert_eq!(t.right.z, 0.0);
        assert!((t.right.y - right_y).abs() < 1e-12);
    }
}

#[test]
fn confirmed_consecutive_switch_is_honored() {
    let mut ctl = started(
        controller(WalkConfig::default()),
        MockPlan::new(&[SwitchSupport, SwitchSupport, Continue]),
    );
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(ctl.support(), SupportState::SingleLeft);

    run_intervals(&mut ctl, 1);
    assert_eq!(ctl.support(), SupportState::SingleRight);
}

#[test]
fn drift_correction_shifts_plan_by_sensed_offset() {
    let mut ctl = controller(WalkConfig::default());
    let planned = left_foot();
    ctl.ik_mut().free_foot = Some(FootPose {
        x: planned.x + 0.01,
        y: planned.y - 0.005,
        z: 0.0,
        yaw: 0.0,
    });
    let mut ctl = started(ctl, MockPlan::new(&[SwitchSupport, Continue]));

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    let corrections = &ctl.plan().map(|p| p.corrections.clone()).unwrap_or_default();
    assert_eq!(corrections.len(), 1);
    assert!((corrections[0].0 - 0.01).abs() < 1e-12);
    assert!((corrections[0].1 + 0.005).abs() < 1e-12);

    // Continue reforms never correct.
    run_intervals(&mut ctl, 1);
    assert_eq!(ctl.plan().map(|p| p.corrections.len()), Some(1));
}

#[test]
fn drift_correction_can_be_disabled() {
    let mut config = WalkConfig::default();
    config.feedback.drift_correction = false;
    let mut ctl = controller(config);
    ctl.ik_mut().free_foot = Some(FootPose {
        x: 0.02,
        y: 0.05,
        z: 0.0,
        yaw: 0.0,
    });
    let mut ctl = started(ctl, MockPlan::new(&[SwitchSupport, Continue]));

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(ctl.support(), SupportState::SingleLeft);
    assert_eq!(ctl.plan().map(|p| p.corrections.len()), Some(0));
}

#[test]
fn swing_foot_target_leaves_the_ground() {
    let mut ctl = started(
        controller(WalkConfig::default()),
        MockPlan::new(&[SwitchSupport, Continue, Continue]),
    );
    let step_height = ctl.config().gait.step_height;

    run_intervals(&mut ctl, 1);
    // Support is left; the right foot swings.
    let targets = &ctl.ik().targets;
    assert_eq!(targets.len(), 2 * TICKS_PER_INTERVAL);
    for t in targets {
        assert_eq!(t.left.z, 0.0);
        assert!(t.right.z > 0.0);
        assert!(t.right.z <= step_height + 1e-9);
    }
}

#[test]
fn double_support_keeps_both_feet_planted() {
    let mut config = WalkConfig::default();
    config.gait.initial_support = SupportState::Double;
    let plan = MockPlan::continuing(2).supported_by(SupportState::Double);
    let mut ctl = started(controller(config), plan);

    run_intervals(&mut ctl, 2);
    assert_eq!(ctl.support(), SupportState::Double);
    for t in &ctl.ik().targets {
        assert_eq!(t.left.z, 0.0);
        assert_eq!(t.right.z, 0.0);
    }
}
