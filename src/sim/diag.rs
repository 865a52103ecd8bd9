//! Replay Diagnostics
//!
//! Anomalies never abort a run; they are collected here and inspected
//! after the fact.

use serde::Serialize;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Info,
}

/// A diagnostic message recorded during replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// One-based program line number the anomaly occurred on
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn info(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            severity: Severity::Info,
        }
    }
}
