//! Integration test: lookahead dispatch, time partition and feedback.

use walk_common::config::{FeedbackConfig, WalkConfig};
use walk_common::consts::GRAVITY;
use walk_common::error::TickOutcome;

use super::mocks::{MockPlan, controller, started, tick};

#[test]
fn commands_are_stamped_one_control_period_apart() {
    let mut ctl = started(controller(WalkConfig::default()), MockPlan::continuing(5));
    let now = ctl.hardware().now;

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    let stamps: Vec<u64> = ctl.hardware().dispatched.iter().map(|(_, t)| *t).collect();
    assert_eq!(stamps, vec![now + 10, now + 20]);

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    let stamps: Vec<u64> = ctl.hardware().dispatched.iter().map(|(_, t)| *t).collect();
    assert_eq!(stamps, vec![now + 10, now + 20, now + 20, now + 30]);
}

#[test]
fn lookahead_count_follows_config() {
    let mut config = WalkConfig::default();
    config.timing.lookahead_steps = 3;
    let mut ctl = started(controller(config), MockPlan::continuing(5));

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(ctl.hardware().dispatched.len(), 3);
    assert_eq!(ctl.ik().targets.len(), 3);
}

#[test]
fn window_durations_split_the_executing_interval() {
    let mut ctl = started(controller(WalkConfig::default()), MockPlan::continuing(5));
    assert_eq!(ctl.solver().configured_size, Some(15));

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);

    let first = &ctl.solver().durations[0];
    assert_eq!(first.len(), 15);
    assert_eq!(&first[..3], &[10, 10, 100]);
    assert!(first[3..].iter().all(|&d| d == 100));

    let second = &ctl.solver().durations[1];
    assert_eq!(&second[..3], &[10, 10, 90]);
}

#[test]
fn solver_receives_com_height_over_gravity() {
    let mut ctl = started(controller(WalkConfig::default()), MockPlan::continuing(5));
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    let expected = ctl.config().gait.com_height / GRAVITY;
    assert!((ctl.solver().h_com - expected).abs() < 1e-12);
}

#[test]
fn com_targets_hold_configured_height() {
    let mut ctl = started(controller(WalkConfig::default()), MockPlan::continuing(5));
    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    let height = ctl.config().gait.com_height;
    for t in &ctl.ik().targets {
        assert_eq!(t.com[2], height);
    }
    assert_eq!(ctl.record().com_target[2], height);
}

#[test]
fn closed_loop_pulls_model_towards_sensed_com() {
    let mut ctl = controller(WalkConfig::default());
    ctl.ik_mut().walk_com = [0.02, 0.0, 0.26];
    let mut ctl = started(ctl, MockPlan::continuing(5));

    assert_eq!(tick(&mut ctl), TickOutcome::Continue);
    // error -0.02, deadband 0.015, gain 0.5.
    assert!((ctl.state().x.position - 0.0025).abs() < 1e-12);
    assert_eq!(ctl.state().y.position, 0.0);
}

#[test]
fn open_loop_ignores_sensed_com() {
    let mut config = WalkConfig::default();
    config.feedback = FeedbackConfig::open_loop();
    config.timing.lookahead_steps = 1;
    let mut ctl = controller(config);
    ctl.ik_mut().walk_com = [0.05, -0.03, 0.26];
    let mut ctl = started(ctl, MockPlan::continuing(5));

    for n in 1..=5 {
        assert_eq!(tick(&mut ctl), TickOutcome::Continue);
        assert_eq!(ctl.hardware().dispatched.len(), n);
    }
    assert_eq!(ctl.state().x.position, 0.0);
    assert_eq!(ctl.state().y.position, 0.0);
}
