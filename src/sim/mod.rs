//! Replay Engine
//!
//! Deterministic replay of a G-code program against an abstract
//! machine model: modal state tracking, coordinate-frame bookkeeping,
//! travel bounds and a trapezoidal-acceleration time estimate.

pub mod block;
pub mod convert;
pub mod diag;
pub mod executor;
pub mod motion;
pub mod processor;
pub mod state;

pub use block::WordBlock;
pub use diag::{Diagnostic, Severity};
pub use executor::{execute_line, LineOutcome};
pub use motion::{AxisKinematics, MoveProcessor};
pub use processor::{
    BoundsSummary, FieldFilter, MachineSnapshot, Processor, StateField, Summary,
};
pub use state::{
    AxisRange, Bounds, Coolant, MachineState, MotionMode, Plane, SpindleDirection, Units,
};
