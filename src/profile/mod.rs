//! Machine Profiles
//!
//! Axis layout, kinematic limits and the line denylist come from
//! profile TOML files: an explicit path, discovered profile
//! directories, or the embedded default.

pub mod schema;

pub use schema::{DenylistDef, LimitsDef, MachineMeta, MachineProfile, ProfileFile};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::sim::motion::AxisKinematics;

/// Characters that may legitimately appear on a program line
/// (used when a profile does not override the class)
const DEFAULT_ALLOWED_CHARS: &str = r"A-Za-z0-9\s.,+%;()*/#=$?-";

/// Compiled line denylist: disallowed characters plus disallowed
/// command literals
#[derive(Debug, Clone)]
pub struct Denylist {
    pattern: Regex,
}

impl Denylist {
    /// Build from an allowed-character class and command literals
    pub fn new(allowed_chars: &str, commands: &[String]) -> Result<Self> {
        let mut alternation = vec![format!("[^{}]", allowed_chars)];
        alternation.extend(commands.iter().map(|c| regex::escape(c)));
        let source = format!("(?i){}", alternation.join("|"));
        let pattern = Regex::new(&source)
            .with_context(|| format!("invalid denylist pattern '{}'", source))?;
        Ok(Self { pattern })
    }

    /// Build with the default character class
    pub fn with_commands(commands: &[String]) -> Result<Self> {
        Self::new(DEFAULT_ALLOWED_CHARS, commands)
    }

    /// The stock denylist: G28/G29 cycles and grbl homing
    pub fn standard() -> Result<Self> {
        Self::with_commands(&schema::default_denied_commands())
    }

    /// True if the raw line text is disallowed
    pub fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}

/// Embedded default profile, compiled into the binary
const EMBEDDED_PROFILE: &str = include_str!("../../resources/profiles/generic.machine.toml");

/// Parse the embedded default profile
///
/// Falls back to a minimal in-code profile if the embedded TOML fails
/// to parse.
pub fn embedded_default() -> MachineProfile {
    match toml::from_str::<ProfileFile>(EMBEDDED_PROFILE)
        .map_err(anyhow::Error::from)
        .and_then(MachineProfile::try_from)
    {
        Ok(profile) => profile,
        Err(e) => {
            log::warn!(
                "Failed to parse embedded profile: {}. Using minimal fallback.",
                e
            );
            minimal_fallback()
        }
    }
}

/// Minimal 3-axis profile in case embedded TOML parsing fails
fn minimal_fallback() -> MachineProfile {
    MachineProfile {
        name: "generic".to_string(),
        axis_labels: vec!['X', 'Y', 'Z'],
        kinematics: AxisKinematics {
            max_feed: vec![4000.0, 4000.0, 2000.0],
            acceleration: vec![250.0, 250.0, 150.0],
            min_move_seconds: 0.0,
        },
        denylist: Denylist::standard().expect("stock denylist compiles"),
    }
}

/// Load a profile from a TOML file
pub fn load_from_path(path: &Path) -> Result<MachineProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {:?}", path))?;
    let file: ProfileFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse profile {:?}", path))?;
    MachineProfile::try_from(file)
}

/// Resolve a profile: an explicit file path, a named profile in the
/// search directories, or the embedded default.
pub fn resolve(selector: Option<&str>, search_dirs: &[PathBuf]) -> Result<MachineProfile> {
    let Some(selector) = selector else {
        return Ok(embedded_default());
    };

    let as_path = Path::new(selector);
    if as_path.is_file() {
        return load_from_path(as_path);
    }

    for dir in search_dirs {
        let candidate = dir.join(format!("{}.machine.toml", selector));
        if candidate.is_file() {
            return load_from_path(&candidate);
        }
    }

    anyhow::bail!(
        "profile '{}' not found (searched {} directories)",
        selector,
        search_dirs.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_denylist() {
        let denylist = Denylist::standard().expect("stock denylist");
        assert!(denylist.matches("G28"));
        assert!(denylist.matches("g28 x0"));
        assert!(denylist.matches("G29"));
        assert!(denylist.matches("$H"));
        assert!(!denylist.matches("G1 X10 F600"));
        assert!(!denylist.matches("G21 (metric)"));
    }

    #[test]
    fn test_disallowed_characters() {
        let denylist = Denylist::standard().expect("stock denylist");
        assert!(denylist.matches("G1 X10 \"quoted\""));
        assert!(!denylist.matches("N10 G1 X-0.5 Y+2 F1500 ; ok"));
    }

    #[test]
    fn test_custom_commands() {
        let commands = vec!["M98".to_string()];
        let denylist = Denylist::with_commands(&commands).expect("denylist");
        assert!(denylist.matches("M98 P100"));
        assert!(!denylist.matches("G28"));
    }

    #[test]
    fn test_embedded_default_parses() {
        let profile = embedded_default();
        assert_eq!(profile.axis_labels, vec!['X', 'Y', 'Z']);
        assert!(profile.kinematics.max_feed.iter().all(|&f| f > 0.0));
        assert!(profile.denylist.matches("G28"));
    }

    #[test]
    fn test_resolve_without_selector_is_embedded() {
        let profile = resolve(None, &[]).expect("resolve default");
        assert_eq!(profile.axis_labels.len(), 3);
    }

    #[test]
    fn test_resolve_missing_name_fails() {
        assert!(resolve(Some("no-such-profile"), &[]).is_err());
    }
}
