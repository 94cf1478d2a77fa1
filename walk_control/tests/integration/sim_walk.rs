//! Integration test: full straight walk on the simulated robot.
//!
//! Loads the built-in footstep program, walks it to completion through the
//! run loop and checks the traced ticks.

use std::io::Write;
use std::sync::atomic::AtomicBool;

use walk_common::config::FeedbackConfig;
use walk_common::error::{StopReason, TickOutcome};
use walk_control::config::{LoadedConfig, load_config_from_str};
use walk_control::runner::{RunOptions, run};
use walk_control::sim;

fn unpaced() -> RunOptions {
    RunOptions {
        paced: false,
        max_ticks: Some(5_000),
    }
}

fn walk(config: &LoadedConfig) -> (TickOutcome, Vec<serde_json::Value>, u64, u64) {
    let (plan, mut ctl) = sim::build(config).expect("build");
    ctl.start(plan).expect("start");

    let stop = AtomicBool::new(false);
    let mut out: Vec<u8> = Vec::new();
    let summary = run(&mut ctl, &stop, unpaced(), Some(&mut out as &mut dyn Write)).expect("run");

    let records = String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("json"))
        .collect();
    (
        summary.outcome,
        records,
        summary.ticks,
        ctl.hardware().dispatched(),
    )
}

#[test]
fn straight_walk_completes() {
    let config = load_config_from_str("").expect("config");
    let lookahead = config.walk.timing.lookahead_steps as u64;
    let (outcome, records, ticks, dispatched) = walk(&config);

    assert_eq!(outcome, TickOutcome::GracefulStop(StopReason::PlanExhausted));
    assert_eq!(records.len() as u64, ticks - 1);
    assert_eq!(dispatched, lookahead * (ticks - 1));

    // Left and right single support alternate along the way.
    let mut switches = 0;
    for pair in records.windows(2) {
        if pair[0]["support"] != pair[1]["support"] {
            switches += 1;
        }
    }
    assert!(switches >= 4, "only {switches} support switches");

    // The body moved forward.
    let first_x = records[0]["com_target"][0].as_f64().unwrap_or_default();
    let last_x = records[records.len() - 1]["com_target"][0]
        .as_f64()
        .unwrap_or_default();
    assert!(last_x > first_x + 0.05, "CoM x {first_x} -> {last_x}");

    // CoM height is constant.
    for r in &records {
        let z = r["com_target"][2].as_f64().unwrap_or_default();
        assert!((z - config.walk.gait.com_height).abs() < 1e-12);
    }
}

#[test]
fn sensed_com_tracks_model() {
    let config = load_config_from_str("").expect("config");
    let (_, records, _, _) = walk(&config);
    let deadband = config.walk.feedback.deadband;
    for r in &records[1..] {
        for axis in 0..2 {
            let model = r["model_com"][axis].as_f64().unwrap_or_default();
            let sensed = r["sensed_com"][axis].as_f64().unwrap_or_default();
            assert!(
                (model - sensed).abs() < 2.0 * deadband,
                "tick {}: model {model} sensed {sensed}",
                r["tick"]
            );
        }
    }
}

#[test]
fn open_loop_variant_completes() {
    let mut config = load_config_from_str("").expect("config");
    config.walk.feedback = FeedbackConfig::open_loop();
    config.walk.timing.lookahead_steps = 1;
    let (outcome, _, ticks, dispatched) = walk(&config);

    assert_eq!(outcome, TickOutcome::GracefulStop(StopReason::PlanExhausted));
    assert_eq!(dispatched, ticks - 1);
}
