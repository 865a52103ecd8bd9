//! Replay invariants: determinism, bounds discipline and monotone
//! time accumulation.

use gcode_replay::profile;
use gcode_replay::sim::Processor;

const PROGRAM: &str = "\
G21 G90
M3 S9000
G0 X10 Y-5
G1 X20 Y5 F900
G91
G1 X-3 Z-1 F600
G90
G92 X0
G1 X12 F1200
G4 P0.5
G28
T2
M6
G0 X0 Y0
M30
";

#[test]
fn independent_runs_are_identical() {
    let mut first = Processor::new(profile::embedded_default());
    let mut second = Processor::new(profile::embedded_default());

    let a = first.process(PROGRAM);
    let b = second.process(PROGRAM);

    assert_eq!(a, b);
}

#[test]
fn reset_reproduces_the_first_run() {
    let mut processor = Processor::new(profile::embedded_default());
    let first = processor.process(PROGRAM);

    processor.reset();
    let second = processor.process(PROGRAM);

    assert_eq!(first, second);
}

#[test]
fn time_accumulates_monotonically() {
    let mut processor = Processor::new(profile::embedded_default());

    let mut previous = 0.0;
    for line in PROGRAM.lines() {
        let outcome = processor.run_line(line);
        assert!(outcome.time_delta_seconds >= 0.0, "line '{}'", line);
        let total = processor.state().total_time_seconds;
        assert!(total >= previous, "time went backwards on '{}'", line);
        previous = total;
    }
}

#[test]
fn bounds_min_never_exceeds_max() {
    let mut processor = Processor::new(profile::embedded_default());
    processor.process(PROGRAM);

    let state = processor.state();
    for axis in 0..state.axis_count() {
        if let Some(range) = state.bounds.range(axis) {
            assert!(range.min <= range.max, "axis {}", axis);
        }
        if let Some(range) = state.machine_bounds.range(axis) {
            assert!(range.min <= range.max, "axis {}", axis);
        }
    }
}

#[test]
fn unaddressed_axes_have_no_bounds() {
    let mut processor = Processor::new(profile::embedded_default());
    processor.process("G0 X10\nG1 X20 F600\n");

    let state = processor.state();
    assert!(state.bounds.range(0).is_some());
    assert!(state.bounds.range(1).is_none());
    assert!(state.bounds.range(2).is_none());
}

#[test]
fn x_only_move_leaves_y_bounds_alone_despite_offset_change() {
    let mut processor = Processor::new(profile::embedded_default());
    // The Y machine position shifts implicitly when the work origin
    // moves, but no line ever addresses Y
    processor.process("G10 L2 P1 Y25\nG1 X10 F600\nG92 Y3\nG1 X0 F600\n");

    let state = processor.state();
    assert!(state.bounds.range(0).is_some());
    assert!(state.bounds.range(1).is_none());
    assert!(state.machine_bounds.range(1).is_none());
}

#[test]
fn streamed_outcomes_sum_to_batch_total() {
    let mut streamed = Processor::new(profile::embedded_default());
    let mut delta_sum = 0.0;
    for line in PROGRAM.lines() {
        delta_sum += streamed.run_line(line).time_delta_seconds;
    }

    let mut batch = Processor::new(profile::embedded_default());
    let summary = batch.process(PROGRAM);

    assert!((delta_sum - summary.total_time_seconds).abs() < 1e-9);
}
