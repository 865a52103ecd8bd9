//! VM State
//!
//! The mutable record of modal and positional machine state, owned
//! exclusively by one [`Processor`](crate::sim::Processor). Pure data:
//! the line executor and move processor mutate it in place, consumers
//! read it after processing.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sim::convert;
use crate::sim::diag::Diagnostic;

/// Number of standard work coordinate systems (G54..G59)
pub const STANDARD_COORD_SYSTEMS: usize = 6;

/// Modal distance units (G20/G21)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Mm,
    In,
}

/// Coolant state (M7/M8/M9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coolant {
    Off,
    Mist,
    Flood,
    Both,
}

impl Coolant {
    /// M7: mist on, preserving flood
    pub fn plus_mist(self) -> Self {
        match self {
            Coolant::Off | Coolant::Mist => Coolant::Mist,
            Coolant::Flood | Coolant::Both => Coolant::Both,
        }
    }

    /// M8: flood on, preserving mist
    pub fn plus_flood(self) -> Self {
        match self {
            Coolant::Off | Coolant::Flood => Coolant::Flood,
            Coolant::Mist | Coolant::Both => Coolant::Both,
        }
    }
}

/// Spindle rotation direction (M3/M4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpindleDirection {
    Forward,
    Reverse,
}

/// Persisted motion modal group: the last seen motion G-code, reused
/// when a line carries bare axis words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    Rapid,
    Linear,
    CwArc,
    CcwArc,
}

impl MotionMode {
    pub fn code(self) -> &'static str {
        match self {
            MotionMode::Rapid => "G0",
            MotionMode::Linear => "G1",
            MotionMode::CwArc => "G2",
            MotionMode::CcwArc => "G3",
        }
    }

    /// Feed moves use the programmed feed rate; rapids do not.
    pub fn is_feed_move(self) -> bool {
        !matches!(self, MotionMode::Rapid)
    }
}

/// Active arc plane (G17/G18/G19)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    Xy,
    Zx,
    Yz,
}

/// Per-axis min/max extent, tracked lazily: an axis has no range until
/// the first coordinate on it is observed.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    ranges: Vec<Option<AxisRange>>,
}

/// One axis's observed extent. Invariant: `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(axes: usize) -> Self {
        Self {
            ranges: vec![None; axes],
        }
    }

    /// Widen the axis range to include `value`
    pub fn expand(&mut self, axis: usize, value: f64) {
        let Some(slot) = self.ranges.get_mut(axis) else {
            return;
        };
        match slot {
            Some(range) => {
                range.min = range.min.min(value);
                range.max = range.max.max(value);
            }
            None => {
                *slot = Some(AxisRange {
                    min: value,
                    max: value,
                });
            }
        }
    }

    pub fn range(&self, axis: usize) -> Option<AxisRange> {
        self.ranges.get(axis).copied().flatten()
    }

    /// Per-axis minima, with unset axes rendered as 0.0
    pub fn mins_or_zero(&self) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|r| r.map_or(0.0, |r| r.min))
            .collect()
    }

    /// Per-axis maxima, with unset axes rendered as 0.0
    pub fn maxs_or_zero(&self) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|r| r.map_or(0.0, |r| r.max))
            .collect()
    }
}

/// Set of distinct numeric values in sorted order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSet {
    values: Vec<f64>,
}

impl ValueSet {
    pub fn insert(&mut self, value: f64) {
        if !self.contains(value) {
            self.values.push(value);
            self.values.sort_by(f64::total_cmp);
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.values.iter().any(|&v| v == value)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The mutable machine model state
#[derive(Debug, Clone, PartialEq)]
pub struct MachineState {
    /// Ordered axis identifiers; fixes the length of every coordinate
    /// vector below
    pub axis_labels: Vec<char>,

    /// Position in work coordinates
    pub position: Vec<f64>,
    /// Position relative to the machine origin. Invariant outside of
    /// line execution: `machine = work + sys_offset + global_offset`.
    pub machine_position: Vec<f64>,

    /// Index of the selected coordinate system (0 = G54)
    pub active_coord_sys: usize,
    /// Per-system offset vectors, grown on demand past the six
    /// standard systems
    pub coord_sys_offsets: Vec<Vec<f64>>,
    /// G92 offset layered on top of the active coordinate system
    pub global_offset: Vec<f64>,
    pub global_offset_enabled: bool,
    /// Reference positions captured by G28.1 / G30.1 (machine frame)
    pub stored_positions: [Vec<f64>; 2],

    pub units: Units,
    pub incremental: bool,
    pub feed: Option<f64>,
    pub inverse_feed_mode: bool,
    pub coolant: Coolant,
    pub spindle_on: bool,
    pub spindle_direction: SpindleDirection,
    pub spindle_speed: f64,
    pub motion_mode: Option<MotionMode>,
    pub arc_plane: Plane,
    pub current_tool: u32,

    /// Work-frame travel extent
    pub bounds: Bounds,
    /// Machine-frame travel extent
    pub machine_bounds: Bounds,
    /// True once an axis has received an explicit coordinate at least
    /// once (known absolute position vs. assumed zero)
    pub has_moved_to_axes: Vec<bool>,

    pub total_time_seconds: f64,
    pub line_counter: u32,

    pub seen_words: BTreeSet<char>,
    pub used_axes: BTreeSet<char>,
    pub distinct_feed_rates: ValueSet,
    pub distinct_spindle_speeds: ValueSet,
    pub distinct_tools: BTreeSet<u32>,
    /// Raw text of lines failing the token denylist, in program order,
    /// without duplicates
    pub invalid_lines: Vec<String>,
    pub tool_select_count: u32,
    pub tool_change_count: u32,

    pub diagnostics: Vec<Diagnostic>,

    /// G53 hold: offsets compose to zero while set. Scoped to a single
    /// line by the executor.
    pub(crate) machine_frame_hold: bool,
}

impl MachineState {
    pub fn new(axis_labels: Vec<char>) -> Self {
        let n = axis_labels.len();
        Self {
            axis_labels,
            position: vec![0.0; n],
            machine_position: vec![0.0; n],
            active_coord_sys: 0,
            coord_sys_offsets: vec![vec![0.0; n]; STANDARD_COORD_SYSTEMS],
            global_offset: vec![0.0; n],
            global_offset_enabled: false,
            stored_positions: [vec![0.0; n], vec![0.0; n]],
            units: Units::Mm,
            incremental: false,
            feed: None,
            inverse_feed_mode: false,
            coolant: Coolant::Off,
            spindle_on: false,
            spindle_direction: SpindleDirection::Forward,
            spindle_speed: 0.0,
            motion_mode: Some(MotionMode::Rapid),
            arc_plane: Plane::Xy,
            current_tool: 0,
            bounds: Bounds::new(n),
            machine_bounds: Bounds::new(n),
            has_moved_to_axes: vec![false; n],
            total_time_seconds: 0.0,
            line_counter: 0,
            seen_words: BTreeSet::new(),
            used_axes: BTreeSet::new(),
            distinct_feed_rates: ValueSet::default(),
            distinct_spindle_speeds: ValueSet::default(),
            distinct_tools: BTreeSet::new(),
            invalid_lines: Vec::new(),
            tool_select_count: 0,
            tool_change_count: 0,
            diagnostics: Vec::new(),
            machine_frame_hold: false,
        }
    }

    pub fn axis_count(&self) -> usize {
        self.axis_labels.len()
    }

    /// Ordinal of a configured axis letter
    pub fn axis_index(&self, letter: char) -> Option<usize> {
        self.axis_labels.iter().position(|&l| l == letter)
    }

    /// Grow the offset table so `sys` is addressable
    pub fn ensure_coord_sys(&mut self, sys: usize) {
        let n = self.axis_count();
        while self.coord_sys_offsets.len() <= sys {
            self.coord_sys_offsets.push(vec![0.0; n]);
        }
    }

    /// Total offset of the active frame: coordinate-system offset plus
    /// the global offset when enabled. Zero while a G53 hold is active.
    pub fn active_offset(&self) -> Vec<f64> {
        if self.machine_frame_hold {
            return vec![0.0; self.axis_count()];
        }
        let sys = &self.coord_sys_offsets[self.active_coord_sys];
        let global = self
            .global_offset_enabled
            .then_some(self.global_offset.as_slice());
        convert::compose_offsets(sys, global)
    }

    /// Recompute the machine position from the work position
    pub fn refresh_machine_position(&mut self) {
        self.machine_position = convert::to_machine(&self.position, &self.active_offset());
    }

    /// Recompute the work position from the machine position
    pub fn refresh_work_position(&mut self) {
        self.position = convert::to_work(&self.machine_position, &self.active_offset());
    }

    /// Select a coordinate system, re-expressing the work position in
    /// the new frame (the machine position is unchanged)
    pub fn select_coord_sys(&mut self, sys: usize) {
        self.ensure_coord_sys(sys);
        self.active_coord_sys = sys;
        self.refresh_work_position();
    }

    /// Record an invalid line once, preserving program order
    pub fn record_invalid_line(&mut self, raw: &str) {
        if !self.invalid_lines.iter().any(|l| l == raw) {
            self.invalid_lines.push(raw.to_string());
        }
    }

    /// M2/M30: restore power-on defaults for offsets and modal flags.
    /// Position, bounds, time and the diagnostic sets are untouched.
    pub fn program_end_reset(&mut self) {
        let n = self.axis_count();
        self.global_offset = vec![0.0; n];
        self.global_offset_enabled = false;
        self.active_coord_sys = 0;
        self.arc_plane = Plane::Xy;
        self.incremental = false;
        self.inverse_feed_mode = false;
        self.spindle_on = false;
        self.spindle_speed = 0.0;
        self.coolant = Coolant::Off;
        self.units = Units::Mm;
        self.refresh_work_position();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_start_unset() {
        let bounds = Bounds::new(3);
        assert!(bounds.range(0).is_none());
        assert_eq!(bounds.mins_or_zero(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bounds_expand() {
        let mut bounds = Bounds::new(3);
        bounds.expand(0, 5.0);
        bounds.expand(0, -2.0);
        bounds.expand(0, 3.0);

        let range = bounds.range(0).unwrap();
        assert_eq!(range.min, -2.0);
        assert_eq!(range.max, 5.0);
        assert!(bounds.range(1).is_none());
    }

    #[test]
    fn test_bounds_out_of_range_axis_ignored() {
        let mut bounds = Bounds::new(2);
        bounds.expand(5, 1.0);
        assert!(bounds.range(0).is_none());
        assert!(bounds.range(1).is_none());
    }

    #[test]
    fn test_value_set_dedup_and_order() {
        let mut set = ValueSet::default();
        set.insert(600.0);
        set.insert(150.0);
        set.insert(600.0);

        assert_eq!(set.len(), 2);
        assert_eq!(set.values(), &[150.0, 600.0]);
        assert!(set.contains(600.0));
        assert!(!set.contains(601.0));
    }

    #[test]
    fn test_coolant_composition() {
        assert_eq!(Coolant::Off.plus_mist(), Coolant::Mist);
        assert_eq!(Coolant::Mist.plus_flood(), Coolant::Both);
        assert_eq!(Coolant::Flood.plus_mist(), Coolant::Both);
        assert_eq!(Coolant::Both.plus_flood(), Coolant::Both);
    }

    #[test]
    fn test_axis_index() {
        let state = MachineState::new(vec!['X', 'Y', 'Z']);
        assert_eq!(state.axis_index('Y'), Some(1));
        assert_eq!(state.axis_index('A'), None);
    }

    #[test]
    fn test_offset_table_grows_on_demand() {
        let mut state = MachineState::new(vec!['X', 'Y', 'Z']);
        assert_eq!(state.coord_sys_offsets.len(), STANDARD_COORD_SYSTEMS);
        state.ensure_coord_sys(8);
        assert_eq!(state.coord_sys_offsets.len(), 9);
        assert_eq!(state.coord_sys_offsets[8], vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_select_coord_sys_reexpresses_position() {
        let mut state = MachineState::new(vec!['X', 'Y', 'Z']);
        state.coord_sys_offsets[1] = vec![10.0, 0.0, 0.0];

        // At machine X=0, G54 reads X=0; G55 (offset 10) reads X=-10
        state.select_coord_sys(1);
        assert_eq!(state.position, vec![-10.0, 0.0, 0.0]);
        assert_eq!(state.machine_position, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_record_invalid_line_dedup() {
        let mut state = MachineState::new(vec!['X', 'Y', 'Z']);
        state.record_invalid_line("G28");
        state.record_invalid_line("G28");
        assert_eq!(state.invalid_lines, vec!["G28".to_string()]);
    }

    #[test]
    fn test_program_end_reset() {
        let mut state = MachineState::new(vec!['X', 'Y', 'Z']);
        state.incremental = true;
        state.inverse_feed_mode = true;
        state.spindle_on = true;
        state.coolant = Coolant::Both;
        state.units = Units::In;
        state.global_offset = vec![1.0, 2.0, 3.0];
        state.global_offset_enabled = true;
        state.active_coord_sys = 2;
        state.total_time_seconds = 42.0;

        state.program_end_reset();

        assert!(!state.incremental);
        assert!(!state.inverse_feed_mode);
        assert!(!state.spindle_on);
        assert_eq!(state.coolant, Coolant::Off);
        assert_eq!(state.units, Units::Mm);
        assert!(!state.global_offset_enabled);
        assert_eq!(state.active_coord_sys, 0);
        // accumulators survive
        assert_eq!(state.total_time_seconds, 42.0);
    }
}
