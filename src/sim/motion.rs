//! Move Processor
//!
//! Estimates elapsed time for one motion using the trapezoidal
//! acceleration approximation, then updates position, machine
//! position and both bounding boxes.
//!
//! Feed rates are in units/min, accelerations in units/s². Per-axis
//! feed components persist across moves so each move ramps from the
//! previous move's speed.

use crate::sim::state::MachineState;

const TRAVEL_EPSILON: f64 = 1e-9;

/// Per-axis kinematic limits, taken from the machine profile
#[derive(Debug, Clone, PartialEq)]
pub struct AxisKinematics {
    /// Maximum feed rate per axis, units/min
    pub max_feed: Vec<f64>,
    /// Acceleration per axis, units/s²
    pub acceleration: Vec<f64>,
    /// Floor applied to every move's elapsed time, seconds
    pub min_move_seconds: f64,
}

/// Turns motion targets into elapsed time and state updates
#[derive(Debug, Clone)]
pub struct MoveProcessor {
    limits: AxisKinematics,
    /// Per-axis feed components of the previous move, units/min
    prev_axis_feed: Vec<f64>,
}

impl MoveProcessor {
    pub fn new(limits: AxisKinematics) -> Self {
        let axes = limits.max_feed.len();
        Self {
            limits,
            prev_axis_feed: vec![0.0; axes],
        }
    }

    /// Forget the previous move's feed components (fresh replay)
    pub fn reset(&mut self) {
        self.prev_axis_feed = vec![0.0; self.prev_axis_feed.len()];
    }

    /// Execute one motion against the state.
    ///
    /// `target` holds the per-axis coordinate words of the line
    /// (`None` = axis absent, held at its current value). `feed` is
    /// the programmed feed rate for feed moves and `None` for rapids.
    /// Returns the elapsed seconds added to the accumulator.
    pub fn process_move(
        &mut self,
        state: &mut MachineState,
        target: &[Option<f64>],
        feed: Option<f64>,
    ) -> f64 {
        let n = state.axis_count();

        let mut end = state.position.clone();
        for axis in 0..n.min(target.len()) {
            if let Some(value) = target[axis] {
                if state.incremental {
                    end[axis] += value;
                } else {
                    end[axis] = value;
                }
            }
        }

        let deltas: Vec<f64> = end
            .iter()
            .zip(state.position.iter())
            .map(|(e, p)| e - p)
            .collect();
        let travel = deltas.iter().map(|d| d * d).sum::<f64>().sqrt();

        let seconds = if state.inverse_feed_mode && feed.is_some() {
            self.inverse_time_seconds(feed.unwrap_or(0.0), &deltas, travel)
        } else {
            self.trapezoidal_seconds(feed, &deltas, travel)
        };
        let seconds = seconds.max(self.limits.min_move_seconds);

        let start = state.position.clone();
        let start_machine = state.machine_position.clone();

        state.total_time_seconds += seconds;
        state.position = end;
        state.refresh_machine_position();

        // Bounds and axis history move only on axes the line addressed
        for axis in 0..n.min(target.len()) {
            if target[axis].is_none() {
                continue;
            }
            state.has_moved_to_axes[axis] = true;
            state.bounds.expand(axis, start[axis]);
            state.bounds.expand(axis, state.position[axis]);
            state.machine_bounds.expand(axis, start_machine[axis]);
            state
                .machine_bounds
                .expand(axis, state.machine_position[axis]);
        }

        seconds
    }

    /// Inverse-time mode: F is moves per minute, floored by the axis
    /// whose maximum feed rate the naive time would exceed.
    fn inverse_time_seconds(&mut self, feed: f64, deltas: &[f64], travel: f64) -> f64 {
        let naive = if feed > 0.0 { 60.0 / feed } else { 0.0 };

        let mut floor = 0.0_f64;
        for (axis, delta) in deltas.iter().enumerate() {
            let max_feed = self.limits.max_feed[axis];
            if max_feed > 0.0 {
                floor = floor.max(delta.abs() / max_feed * 60.0);
            }
        }

        let seconds = naive.max(floor);

        // Persist the feed components the move actually ran at so the
        // next standard-mode move ramps from the right speed
        self.prev_axis_feed = if seconds > 0.0 && travel > TRAVEL_EPSILON {
            deltas.iter().map(|d| d.abs() / seconds * 60.0).collect()
        } else {
            vec![0.0; deltas.len()]
        };

        seconds
    }

    /// Standard mode: decompose the feed into per-axis components,
    /// ramp each axis from its previous component, cruise the rest.
    fn trapezoidal_seconds(&mut self, feed: Option<f64>, deltas: &[f64], travel: f64) -> f64 {
        let n = deltas.len();
        let rapid = feed.is_none();
        let feed = feed.unwrap_or(0.0);

        if travel < TRAVEL_EPSILON || (!rapid && feed <= 0.0) {
            // No travel, or a feed move with no usable feed rate:
            // nothing to ramp, nothing to cruise
            self.prev_axis_feed = vec![0.0; n];
            return 0.0;
        }

        let mut axis_feed = vec![0.0; n];
        for axis in 0..n {
            if deltas[axis].abs() < TRAVEL_EPSILON {
                continue;
            }
            axis_feed[axis] = if rapid {
                // Rapid axes run independently at their own limit
                self.limits.max_feed[axis]
            } else {
                feed * deltas[axis].abs() / travel
            };
        }

        let mut ramp_seconds = 0.0_f64;
        let mut accel_seconds = vec![0.0; n];
        let mut accel_distance = vec![0.0; n];
        for axis in 0..n {
            let accel = self.limits.acceleration[axis];
            if accel <= 0.0 {
                continue;
            }
            let dv = (axis_feed[axis] - self.prev_axis_feed[axis]).abs() / 60.0;
            let t = dv / accel;
            accel_seconds[axis] = t;
            accel_distance[axis] = (0.5 * accel * t * t).min(deltas[axis].abs());
            ramp_seconds = ramp_seconds.max(t);
        }

        let seconds = if rapid {
            // Each axis travels at its own rate; the slowest governs.
            // A stationary axis still contributes its ramp-down time.
            let mut slowest = 0.0_f64;
            for axis in 0..n {
                let distance = deltas[axis].abs();
                let max_feed = self.limits.max_feed[axis];
                let cruise = if distance < TRAVEL_EPSILON || max_feed <= 0.0 {
                    0.0
                } else {
                    (distance - accel_distance[axis]).max(0.0) / max_feed * 60.0
                };
                slowest = slowest.max(cruise + accel_seconds[axis]);
            }
            slowest
        } else {
            let ramp_distance = accel_distance
                .iter()
                .map(|d| d * d)
                .sum::<f64>()
                .sqrt()
                .min(travel);
            (travel - ramp_distance) / feed * 60.0 + ramp_seconds
        };

        self.prev_axis_feed = axis_feed;
        seconds
    }
}
