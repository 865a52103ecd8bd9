//! Processor
//!
//! Owns the VM state and move processor, exposes batch and streaming
//! entry points, reset, and partial state re-synchronization against
//! an externally supplied machine snapshot.
//!
//! One processor replays one program; concurrent simulations need
//! independent instances.

use serde::{Deserialize, Serialize};

use crate::parser::{parse_line, ParsedLine};
use crate::profile::MachineProfile;
use crate::sim::block::WordBlock;
use crate::sim::diag::Diagnostic;
use crate::sim::executor::{execute_line, LineOutcome};
use crate::sim::motion::MoveProcessor;
use crate::sim::state::MachineState;

/// Replays a program against the machine model
#[derive(Debug)]
pub struct Processor {
    profile: MachineProfile,
    state: MachineState,
    motion: MoveProcessor,
    lines_run: usize,
}

impl Processor {
    pub fn new(profile: MachineProfile) -> Self {
        let state = MachineState::new(profile.axis_labels.clone());
        let motion = MoveProcessor::new(profile.kinematics.clone());
        Self {
            profile,
            state,
            motion,
            lines_run: 0,
        }
    }

    /// Discard all accumulated state and start fresh
    pub fn reset(&mut self) {
        self.state = MachineState::new(self.profile.axis_labels.clone());
        self.motion.reset();
        self.lines_run = 0;
    }

    pub fn profile(&self) -> &MachineProfile {
        &self.profile
    }

    /// The machine state after the lines processed so far
    pub fn state(&self) -> &MachineState {
        &self.state
    }

    /// Number of program lines consumed so far
    pub fn lines_run(&self) -> usize {
        self.lines_run
    }

    /// Batch entry point: replay a complete program text. State
    /// carries over between calls; `reset` starts a fresh replay.
    pub fn process(&mut self, text: &str) -> Summary {
        for line in text.lines() {
            self.run_line(line);
        }
        self.summary()
    }

    /// Streaming entry point: replay one raw line
    pub fn run_line(&mut self, line: &str) -> LineOutcome {
        self.lines_run += 1;
        match parse_line(line) {
            ParsedLine::Words(words) => {
                let block = WordBlock::from_line(&words);
                self.run_prepared(&block)
            }
            ParsedLine::Comment(_) | ParsedLine::Empty => {
                // Lines that carry no words can still trip the
                // denylist (system commands, stray characters)
                if self.profile.denylist.matches(line) {
                    self.state.record_invalid_line(line);
                }
                LineOutcome::quiet()
            }
        }
    }

    /// Streaming entry point for an externally tokenized word block
    pub fn run_block(&mut self, block: &WordBlock) -> LineOutcome {
        self.lines_run += 1;
        self.run_prepared(block)
    }

    fn run_prepared(&mut self, block: &WordBlock) -> LineOutcome {
        execute_line(
            &mut self.state,
            &mut self.motion,
            &self.profile.denylist,
            block,
            self.lines_run,
        )
    }

    /// Serializable projection of the current state
    pub fn summary(&self) -> Summary {
        Summary::from_state(&self.state)
    }

    /// Partially re-synchronize state from an external snapshot.
    ///
    /// Only fields the filter allows are overwritten; everything else
    /// is left untouched so an in-progress simulation's state is not
    /// silently clobbered.
    pub fn sync_from_snapshot(&mut self, snapshot: &MachineSnapshot, filter: &FieldFilter) {
        if let Some(offsets) = &snapshot.coord_sys_offsets {
            if filter.allows(StateField::CoordSysOffsets) {
                for (sys, offset) in offsets.iter().enumerate() {
                    self.state.ensure_coord_sys(sys);
                    copy_axes(&mut self.state.coord_sys_offsets[sys], offset);
                }
            }
        }
        if let Some(offset) = &snapshot.global_offset {
            if filter.allows(StateField::GlobalOffset) {
                copy_axes(&mut self.state.global_offset, offset);
                self.state.global_offset_enabled = snapshot.global_offset_enabled.unwrap_or(true);
            }
        }
        if let Some(sys) = snapshot.active_coord_sys {
            if filter.allows(StateField::ActiveCoordSys) {
                self.state.ensure_coord_sys(sys);
                self.state.active_coord_sys = sys;
            }
        }
        if let Some(units) = snapshot.units {
            if filter.allows(StateField::Units) {
                self.state.units = units;
            }
        }
        if let Some(feed) = snapshot.feed {
            if filter.allows(StateField::Feed) {
                self.state.feed = Some(feed);
            }
        }
        if let Some(speed) = snapshot.spindle_speed {
            if filter.allows(StateField::SpindleSpeed) {
                self.state.spindle_speed = speed;
            }
        }
        if let Some(tool) = snapshot.tool {
            if filter.allows(StateField::Tool) {
                self.state.current_tool = tool;
            }
        }

        // Positions last, so offset fields applied above participate
        // in re-establishing the work/machine invariant
        let machine_applied = snapshot.machine_position.is_some()
            && filter.allows(StateField::MachinePosition);
        let work_applied =
            snapshot.work_position.is_some() && filter.allows(StateField::WorkPosition);

        if machine_applied {
            if let Some(machine) = &snapshot.machine_position {
                copy_axes(&mut self.state.machine_position, machine);
            }
        }
        if work_applied {
            if let Some(work) = &snapshot.work_position {
                copy_axes(&mut self.state.position, work);
            }
        }
        match (machine_applied, work_applied) {
            (true, false) => self.state.refresh_work_position(),
            (false, true) => self.state.refresh_machine_position(),
            _ => {}
        }
    }
}

fn copy_axes(dest: &mut [f64], src: &[f64]) {
    for (d, s) in dest.iter_mut().zip(src.iter()) {
        *d = *s;
    }
}

/// Named state fields for snapshot filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    WorkPosition,
    MachinePosition,
    ActiveCoordSys,
    CoordSysOffsets,
    GlobalOffset,
    Units,
    Feed,
    SpindleSpeed,
    Tool,
}

/// Include/exclude filter over named state fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    All,
    Include(Vec<StateField>),
    Exclude(Vec<StateField>),
}

impl FieldFilter {
    pub fn allows(&self, field: StateField) -> bool {
        match self {
            FieldFilter::All => true,
            FieldFilter::Include(fields) => fields.contains(&field),
            FieldFilter::Exclude(fields) => !fields.contains(&field),
        }
    }
}

/// External machine snapshot, e.g. the controller's last known status
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MachineSnapshot {
    pub work_position: Option<Vec<f64>>,
    pub machine_position: Option<Vec<f64>>,
    pub active_coord_sys: Option<usize>,
    pub coord_sys_offsets: Option<Vec<Vec<f64>>>,
    pub global_offset: Option<Vec<f64>>,
    pub global_offset_enabled: Option<bool>,
    pub units: Option<crate::sim::state::Units>,
    pub feed: Option<f64>,
    pub spindle_speed: Option<f64>,
    pub tool: Option<u32>,
}

/// Per-axis extent pair for consumers; axes never addressed render
/// as zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsSummary {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Serializable projection of final VM state for consumers: viewport
/// extents, the file summary panel and the warnings panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_time_seconds: f64,
    pub bounds: BoundsSummary,
    pub machine_bounds: BoundsSummary,
    pub feed_rates: Vec<f64>,
    pub spindle_speeds: Vec<f64>,
    pub tools: Vec<u32>,
    pub tool_select_count: u32,
    pub tool_change_count: u32,
    pub used_axes: Vec<char>,
    pub invalid_lines: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Summary {
    pub fn from_state(state: &MachineState) -> Self {
        Self {
            total_time_seconds: state.total_time_seconds,
            bounds: BoundsSummary {
                min: state.bounds.mins_or_zero(),
                max: state.bounds.maxs_or_zero(),
            },
            machine_bounds: BoundsSummary {
                min: state.machine_bounds.mins_or_zero(),
                max: state.machine_bounds.maxs_or_zero(),
            },
            feed_rates: state.distinct_feed_rates.values().to_vec(),
            spindle_speeds: state.distinct_spindle_speeds.values().to_vec(),
            tools: state.distinct_tools.iter().copied().collect(),
            tool_select_count: state.tool_select_count,
            tool_change_count: state.tool_change_count,
            used_axes: state.used_axes.iter().copied().collect(),
            invalid_lines: state.invalid_lines.clone(),
            diagnostics: state.diagnostics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile;

    fn processor() -> Processor {
        Processor::new(profile::embedded_default())
    }

    fn approx(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "expected {}, got {}", b, a);
    }

    #[test]
    fn test_batch_process() {
        let mut p = processor();
        let summary = p.process("G21 G90\nG1 X10 F600\nG0 X0\n");

        assert!(summary.total_time_seconds > 0.0);
        assert_eq!(summary.bounds.min, vec![0.0, 0.0, 0.0]);
        assert_eq!(summary.bounds.max, vec![10.0, 0.0, 0.0]);
        assert_eq!(summary.feed_rates, vec![600.0]);
        assert_eq!(p.lines_run(), 3);
    }

    #[test]
    fn test_streamed_equals_batch() {
        let program = "G21 G90\nG1 X10 Y5 F600\nG0 X0 Y0\nT2\nM6\n";

        let mut batch = processor();
        let batch_summary = batch.process(program);

        let mut streamed = processor();
        for line in program.lines() {
            streamed.run_line(line);
        }
        let stream_summary = streamed.summary();

        assert_eq!(batch_summary, stream_summary);
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut p = processor();
        p.process("G1 X10 F600\nT3\nM6\n");
        p.reset();

        assert_eq!(p.state().total_time_seconds, 0.0);
        assert!(p.state().distinct_tools.is_empty());
        assert_eq!(p.lines_run(), 0);
        assert!(p.state().bounds.range(0).is_none());
    }

    #[test]
    fn test_wordless_system_command_is_flagged() {
        let mut p = processor();
        let outcome = p.run_line("$H");
        assert!(!outcome.motion);
        assert_eq!(p.state().invalid_lines, vec!["$H".to_string()]);
    }

    #[test]
    fn test_comment_and_blank_lines_are_quiet() {
        let mut p = processor();
        let outcome = p.run_line("; just a comment");
        assert!(!outcome.motion);
        assert_eq!(outcome.time_delta_seconds, 0.0);

        let outcome = p.run_line("");
        assert!(!outcome.motion);
        assert_eq!(p.state().total_time_seconds, 0.0);
    }

    #[test]
    fn test_snapshot_resync_all() {
        let mut p = processor();
        let snapshot = MachineSnapshot {
            machine_position: Some(vec![5.0, 6.0, 7.0]),
            feed: Some(1200.0),
            tool: Some(4),
            ..Default::default()
        };
        p.sync_from_snapshot(&snapshot, &FieldFilter::All);

        assert_eq!(p.state().machine_position, vec![5.0, 6.0, 7.0]);
        assert_eq!(p.state().position, vec![5.0, 6.0, 7.0]);
        assert_eq!(p.state().feed, Some(1200.0));
        assert_eq!(p.state().current_tool, 4);
    }

    #[test]
    fn test_snapshot_resync_respects_include_filter() {
        let mut p = processor();
        let snapshot = MachineSnapshot {
            machine_position: Some(vec![5.0, 6.0, 7.0]),
            feed: Some(1200.0),
            ..Default::default()
        };
        p.sync_from_snapshot(
            &snapshot,
            &FieldFilter::Include(vec![StateField::Feed]),
        );

        assert_eq!(p.state().machine_position, vec![0.0, 0.0, 0.0]);
        assert_eq!(p.state().feed, Some(1200.0));
    }

    #[test]
    fn test_snapshot_resync_respects_exclude_filter() {
        let mut p = processor();
        let snapshot = MachineSnapshot {
            feed: Some(1200.0),
            spindle_speed: Some(9000.0),
            ..Default::default()
        };
        p.sync_from_snapshot(
            &snapshot,
            &FieldFilter::Exclude(vec![StateField::SpindleSpeed]),
        );

        assert_eq!(p.state().feed, Some(1200.0));
        assert_eq!(p.state().spindle_speed, 0.0);
    }

    #[test]
    fn test_snapshot_offsets_participate_in_invariant() {
        let mut p = processor();
        let snapshot = MachineSnapshot {
            machine_position: Some(vec![10.0, 0.0, 0.0]),
            coord_sys_offsets: Some(vec![vec![4.0, 0.0, 0.0]]),
            ..Default::default()
        };
        p.sync_from_snapshot(&snapshot, &FieldFilter::All);

        // work = machine - offset
        assert_eq!(p.state().position, vec![6.0, 0.0, 0.0]);
    }

    #[test]
    fn test_summary_serializes() {
        let mut p = processor();
        let summary = p.process("G1 X10 F600\n");
        let json = serde_json::to_string(&summary).expect("serialize summary");
        assert!(json.contains("total_time_seconds"));
        assert!(json.contains("bounds"));
    }

    #[test]
    fn test_scenario_offset_neutralizes_travel() {
        let mut p = processor();
        p.process("G92 X5\n");
        let before = p.state().total_time_seconds;
        p.process("G1 X5 F600\n");

        approx(p.state().total_time_seconds, before, 1e-6);
        assert_eq!(p.state().machine_position[0], 0.0);
    }
}
