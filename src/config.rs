//! Configuration management for the replay CLI.
//!
//! Handles:
//! - Command-line argument parsing
//! - Profile directory discovery

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the replay tool
#[derive(Debug, Parser)]
#[command(name = "gcode-replay")]
#[command(about = "Replay a G-code program against a machine model")]
#[command(version)]
pub struct Args {
    /// Program file to replay
    pub file: PathBuf,

    /// Machine profile: a TOML file path or a profile name
    #[arg(long, help = "Machine profile (path or name, e.g. 'generic')")]
    pub profile: Option<String>,

    /// Custom profile directory to search for profile files
    #[arg(long, help = "Directory containing machine profile TOML files")]
    pub profile_dir: Option<PathBuf>,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pub pretty: bool,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Program file to replay
    pub file: PathBuf,
    /// Profile selector (path or name) from the command line
    pub profile: Option<String>,
    /// Profile directories to search, in priority order
    pub profile_dirs: Vec<PathBuf>,
    /// Pretty-print the JSON summary
    pub pretty: bool,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        // Determine profile directories
        let mut profile_dirs = Vec::new();

        // Add user-specified directory if provided
        if let Some(custom_dir) = args.profile_dir {
            profile_dirs.push(custom_dir);
        }

        // Add default user config directory
        if let Some(config_dir) = dirs::config_dir() {
            profile_dirs.push(config_dir.join("gcode-replay").join("profiles"));
        }

        Ok(Config {
            file: args.file,
            profile: args.profile,
            profile_dirs,
            pretty: args.pretty,
        })
    }
}
