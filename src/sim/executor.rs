//! Line Executor
//!
//! Consumes one word block plus the current VM state, updates modal
//! flags, dispatches motion and returns a per-line result summary.
//!
//! Anomalies degrade locally: malformed axis words, denylisted lines
//! and unsupported codes are recorded and the run continues.

use crate::profile::Denylist;
use crate::sim::block::WordBlock;
use crate::sim::convert;
use crate::sim::diag::Diagnostic;
use crate::sim::motion::MoveProcessor;
use crate::sim::state::{Coolant, MachineState, MotionMode, Plane, SpindleDirection, Units};

/// Letters that denote axes in word-address G-code. A candidate not in
/// the configured axis labels is a malformed axis reference.
const AXIS_CANDIDATES: [char; 9] = ['X', 'Y', 'Z', 'A', 'B', 'C', 'U', 'V', 'W'];

/// G codes the executor knows how to apply
const HANDLED_G_CODES: [&str; 31] = [
    "G0", "G1", "G2", "G3", "G4", "G10", "G17", "G18", "G19", "G20", "G21", "G28", "G28.1",
    "G28.2", "G28.3", "G30", "G30.1", "G53", "G54", "G55", "G56", "G57", "G58", "G59", "G80",
    "G90", "G91", "G92", "G92.1", "G92.2", "G92.3",
];

/// Per-line result summary
#[derive(Debug, Clone, PartialEq)]
pub struct LineOutcome {
    /// True if the line produced a motion
    pub motion: bool,
    /// The dispatched motion code ("G0", "G28", ...) when `motion`
    pub motion_code: Option<String>,
    /// True if coordinate-system or global offsets changed
    pub coord_offsets_changed: bool,
    /// Seconds this line added to the time accumulator
    pub time_delta_seconds: f64,
}

impl LineOutcome {
    pub(crate) fn quiet() -> Self {
        Self {
            motion: false,
            motion_code: None,
            coord_offsets_changed: false,
            time_delta_seconds: 0.0,
        }
    }
}

/// Execute one line against the state
pub fn execute_line(
    state: &mut MachineState,
    motion: &mut MoveProcessor,
    denylist: &Denylist,
    block: &WordBlock,
    line_no: usize,
) -> LineOutcome {
    let mut outcome = LineOutcome::quiet();

    // Axis scan: sparse target vector plus presence, malformed axis
    // references degrade to "absent on this line"
    let mut target: Vec<Option<f64>> = vec![None; state.axis_count()];
    let mut any_axis = false;
    for word in block.words() {
        state.seen_words.insert(word.letter);
        if let Some(axis) = state.axis_index(word.letter) {
            target[axis] = Some(word.value);
            any_axis = true;
            state.used_axes.insert(word.letter);
        } else if AXIS_CANDIDATES.contains(&word.letter) {
            log::warn!(
                "line {}: axis word {}{} outside configured axes",
                line_no,
                word.letter,
                word.value
            );
            state.diagnostics.push(Diagnostic::warning(
                line_no,
                format!(
                    "axis word '{}{}' is outside the configured axes, ignored",
                    word.letter, word.value
                ),
            ));
        }
    }

    if denylist.matches(block.raw()) {
        state.record_invalid_line(block.raw());
    }

    // Feed and line-number words apply on every path
    if let Some(feed) = block.get('F') {
        state.feed = Some(feed);
        state.distinct_feed_rates.insert(feed);
    }
    if let Some(n) = block.get('N') {
        state.line_counter = n.max(0.0) as u32;
    }

    let simple = block.is_simple_motion();
    if !simple {
        apply_modal_words(state, block, &mut outcome);
        apply_offset_words(state, block, &target, line_no, &mut outcome);
        apply_tool_words(state, block);
        report_unhandled_codes(state, block, line_no);

        if block.has("G53") {
            state.machine_frame_hold = true;
            state.position = state.machine_position.clone();
        }
    }

    dispatch_motion(state, motion, block, &target, any_axis, line_no, &mut outcome);

    if state.machine_frame_hold {
        // G53 was scoped to this line; restore the prior frame
        state.machine_frame_hold = false;
        state.refresh_work_position();
    }

    outcome
}

/// Modal-setting words, applied in a fixed, idempotent order
fn apply_modal_words(state: &mut MachineState, block: &WordBlock, outcome: &mut LineOutcome) {
    if block.has("G17") {
        state.arc_plane = Plane::Xy;
    } else if block.has("G18") {
        state.arc_plane = Plane::Zx;
    } else if block.has("G19") {
        state.arc_plane = Plane::Yz;
    }

    if block.has("G20") {
        state.units = Units::In;
    } else if block.has("G21") {
        state.units = Units::Mm;
    }

    for sys in 0..6 {
        if block.has(&format!("G{}", 54 + sys)) {
            state.select_coord_sys(sys);
        }
    }

    if block.has("G80") {
        state.motion_mode = None;
    }

    if block.has("G90") {
        state.incremental = false;
    } else if block.has("G91") {
        state.incremental = true;
    }

    if block.has("G93") {
        state.inverse_feed_mode = true;
    } else if block.has("G94") {
        state.inverse_feed_mode = false;
    }

    if let Some(speed) = block.get('S') {
        state.spindle_speed = speed;
        state.distinct_spindle_speeds.insert(speed);
    }

    if let Some(m) = block.get('M') {
        match m as i64 {
            2 | 30 => {
                state.program_end_reset();
                outcome.coord_offsets_changed = true;
            }
            3 => {
                state.spindle_on = true;
                state.spindle_direction = SpindleDirection::Forward;
            }
            4 => {
                state.spindle_on = true;
                state.spindle_direction = SpindleDirection::Reverse;
            }
            5 => {
                state.spindle_on = false;
            }
            7 => {
                state.coolant = state.coolant.plus_mist();
            }
            8 => {
                state.coolant = state.coolant.plus_flood();
            }
            9 => {
                state.coolant = Coolant::Off;
            }
            _ => {}
        }
    }
}

/// Offset-table operations: G10, stored positions, homing, G92 family
fn apply_offset_words(
    state: &mut MachineState,
    block: &WordBlock,
    target: &[Option<f64>],
    line_no: usize,
    outcome: &mut LineOutcome,
) {
    if block.has("G10") && (block.has("L2") || block.has("L20")) {
        match block.get('P') {
            Some(p) => {
                let sys = if p <= 0.0 {
                    state.active_coord_sys
                } else {
                    p as usize - 1
                };
                state.ensure_coord_sys(sys);
                for (axis, value) in target.iter().enumerate() {
                    let Some(value) = value else { continue };
                    state.coord_sys_offsets[sys][axis] = if block.has("L20") {
                        // Current machine position must read as `value`
                        state.machine_position[axis] - value
                    } else {
                        *value
                    };
                }
                outcome.coord_offsets_changed = true;
                if sys == state.active_coord_sys {
                    state.refresh_work_position();
                }
            }
            None => {
                state.diagnostics.push(Diagnostic::info(
                    line_no,
                    "G10 without a P word, ignored".to_string(),
                ));
            }
        }
    }

    if block.has("G28.1") {
        state.stored_positions[0] = state.machine_position.clone();
    }
    if block.has("G30.1") {
        state.stored_positions[1] = state.machine_position.clone();
    }

    if block.has("G28.2") || block.has("G28.3") {
        // Simulated homing: the addressed axes become machine zero
        for (axis, value) in target.iter().enumerate() {
            if value.is_some() {
                state.machine_position[axis] = 0.0;
            }
        }
        state.refresh_work_position();
    }

    if block.has("G92") {
        let sys_offset = state.coord_sys_offsets[state.active_coord_sys].clone();
        for (axis, value) in target.iter().enumerate() {
            let Some(value) = value else { continue };
            state.global_offset[axis] =
                state.machine_position[axis] - sys_offset[axis] - value;
        }
        state.global_offset_enabled = true;
        state.refresh_work_position();
        outcome.coord_offsets_changed = true;
    }
    if block.has("G92.1") {
        state.global_offset = vec![0.0; state.axis_count()];
        state.global_offset_enabled = false;
        state.refresh_work_position();
        outcome.coord_offsets_changed = true;
    }
    if block.has("G92.2") {
        state.global_offset_enabled = false;
        state.refresh_work_position();
        outcome.coord_offsets_changed = true;
    }
    if block.has("G92.3") {
        state.global_offset_enabled = true;
        state.refresh_work_position();
        outcome.coord_offsets_changed = true;
    }
}

/// Tool select and tool change counting
fn apply_tool_words(state: &mut MachineState, block: &WordBlock) {
    if let Some(tool) = block.get('T') {
        let tool = tool.max(0.0) as u32;
        state.current_tool = tool;
        state.distinct_tools.insert(tool);
        state.tool_select_count += 1;
    }
    if block.get('M') == Some(6.0) {
        state.tool_change_count += 1;
    }
}

/// Record recognized-but-unimplemented G codes
fn report_unhandled_codes(state: &mut MachineState, block: &WordBlock, line_no: usize) {
    for word in block.words() {
        if word.letter != 'G' {
            continue;
        }
        let code = crate::sim::block::compound('G', word.value);
        if !HANDLED_G_CODES.contains(&code.as_str()) {
            log::debug!("line {}: unsupported code {}", line_no, code);
            state.diagnostics.push(Diagnostic::info(
                line_no,
                format!("unsupported code {}, no motion applied", code),
            ));
        }
    }
}

/// True if a G word on this line claims the axis words for itself, so
/// they must not fall through to the persisted motion mode
fn axis_words_claimed(block: &WordBlock) -> bool {
    const CLAIMING_CODES: [&str; 6] = ["G10", "G92", "G28.1", "G30.1", "G28.2", "G28.3"];
    if CLAIMING_CODES.iter().any(|code| block.has(code)) {
        return true;
    }
    block.words().iter().any(|word| {
        word.letter == 'G'
            && !HANDLED_G_CODES.contains(&crate::sim::block::compound('G', word.value).as_str())
    })
}

/// Motion dispatch: G0/G1 direct, G2/G3 as linear moves, G28/G30
/// two-phase via the stored positions, G4 dwell.
fn dispatch_motion(
    state: &mut MachineState,
    motion: &mut MoveProcessor,
    block: &WordBlock,
    target: &[Option<f64>],
    any_axis: bool,
    line_no: usize,
    outcome: &mut LineOutcome,
) {
    if block.has("G4") {
        if let Some(dwell) = block.get('P') {
            let dwell = dwell.max(0.0);
            state.total_time_seconds += dwell;
            outcome.time_delta_seconds += dwell;
        }
    }

    if block.has("G28") || block.has("G30") {
        let slot = if block.has("G28") { 0 } else { 1 };
        if any_axis {
            outcome.time_delta_seconds += motion.process_move(state, target, None);
        }

        // Stored positions live in the machine frame; re-express in
        // the active frame and move there absolutely
        let stored = state.stored_positions[slot].clone();
        let work_target = convert::to_work(&stored, &state.active_offset());
        let full: Vec<Option<f64>> = work_target.into_iter().map(Some).collect();

        let was_incremental = state.incremental;
        state.incremental = false;
        outcome.time_delta_seconds += motion.process_move(state, &full, None);
        state.incremental = was_incremental;

        outcome.motion = true;
        outcome.motion_code = Some(if slot == 0 { "G28" } else { "G30" }.to_string());
        return;
    }

    let explicit = if block.has("G0") {
        Some(MotionMode::Rapid)
    } else if block.has("G1") {
        Some(MotionMode::Linear)
    } else if block.has("G2") {
        Some(MotionMode::CwArc)
    } else if block.has("G3") {
        Some(MotionMode::CcwArc)
    } else {
        None
    };

    if let Some(mode) = explicit {
        state.motion_mode = Some(mode);
    }

    if !any_axis {
        return;
    }

    // Bare axis words reuse the persisted motion mode, unless another
    // G word on the line claims them (offset setting, homing, an
    // unsupported cycle)
    let fallback = if axis_words_claimed(block) {
        None
    } else {
        state.motion_mode
    };
    let Some(mode) = explicit.or(fallback) else {
        return;
    };

    let feed = if mode.is_feed_move() {
        match state.feed {
            Some(feed) if feed > 0.0 => Some(feed),
            _ => {
                state.diagnostics.push(Diagnostic::warning(
                    line_no,
                    format!("{} move with no usable feed rate", mode.code()),
                ));
                Some(0.0)
            }
        }
    } else {
        None
    };

    outcome.time_delta_seconds += motion.process_move(state, target, feed);
    outcome.motion = true;
    outcome.motion_code = Some(mode.code().to_string());
}
