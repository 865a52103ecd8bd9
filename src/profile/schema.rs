//! Machine Profile Schema Types
//!
//! Simple types for machine profile definitions (matches TOML).

use anyhow::{bail, ensure, Result};
use serde::Deserialize;

use crate::profile::Denylist;
use crate::sim::motion::AxisKinematics;

/// Root profile file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileFile {
    pub machine: MachineMeta,
    pub limits: LimitsDef,
    #[serde(default)]
    pub denylist: DenylistDef,
}

/// Machine metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MachineMeta {
    pub name: String,
    pub description: Option<String>,
    /// Axis letters, in order (e.g. ["X", "Y", "Z"])
    pub axes: Vec<String>,
}

/// Per-axis kinematic limits
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LimitsDef {
    /// Maximum feed rate per axis, units/min
    pub max_feed: Vec<f64>,
    /// Acceleration per axis, units/s²
    pub acceleration: Vec<f64>,
    /// Floor applied to every move's elapsed time, seconds
    #[serde(default)]
    pub min_move_seconds: f64,
}

/// Denylist data: the disallowed-command set is a parameter, not a
/// hard-coded literal
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DenylistDef {
    /// Character class of characters allowed to appear on a line
    pub allowed_chars: Option<String>,
    /// Command literals that flag a line as invalid
    #[serde(default = "default_denied_commands")]
    pub commands: Vec<String>,
}

impl Default for DenylistDef {
    fn default() -> Self {
        Self {
            allowed_chars: None,
            commands: default_denied_commands(),
        }
    }
}

pub(crate) fn default_denied_commands() -> Vec<String> {
    vec!["G28".to_string(), "G29".to_string(), "$H".to_string()]
}

/// Runtime profile (validated, ready for the processor)
#[derive(Debug, Clone)]
pub struct MachineProfile {
    pub name: String,
    pub axis_labels: Vec<char>,
    pub kinematics: AxisKinematics,
    pub denylist: Denylist,
}

impl TryFrom<ProfileFile> for MachineProfile {
    type Error = anyhow::Error;

    fn try_from(file: ProfileFile) -> Result<Self> {
        let mut axis_labels = Vec::with_capacity(file.machine.axes.len());
        for axis in &file.machine.axes {
            let mut chars = axis.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) if letter.is_ascii_alphabetic() => {
                    axis_labels.push(letter.to_ascii_uppercase());
                }
                _ => bail!("axis label '{}' must be a single letter", axis),
            }
        }
        ensure!(!axis_labels.is_empty(), "profile defines no axes");

        let axes = axis_labels.len();
        ensure!(
            file.limits.max_feed.len() == axes,
            "max_feed has {} entries for {} axes",
            file.limits.max_feed.len(),
            axes
        );
        ensure!(
            file.limits.acceleration.len() == axes,
            "acceleration has {} entries for {} axes",
            file.limits.acceleration.len(),
            axes
        );
        for (axis, &feed) in axis_labels.iter().zip(file.limits.max_feed.iter()) {
            ensure!(feed > 0.0, "max_feed for axis {} must be positive", axis);
        }
        for (axis, &accel) in axis_labels.iter().zip(file.limits.acceleration.iter()) {
            ensure!(accel > 0.0, "acceleration for axis {} must be positive", axis);
        }
        ensure!(
            file.limits.min_move_seconds >= 0.0,
            "min_move_seconds must not be negative"
        );

        let denylist = match &file.denylist.allowed_chars {
            Some(chars) => Denylist::new(chars, &file.denylist.commands)?,
            None => Denylist::with_commands(&file.denylist.commands)?,
        };

        Ok(Self {
            name: file.machine.name,
            axis_labels,
            kinematics: AxisKinematics {
                max_feed: file.limits.max_feed,
                acceleration: file.limits.acceleration,
                min_move_seconds: file.limits.min_move_seconds,
            },
            denylist,
        })
    }
}
