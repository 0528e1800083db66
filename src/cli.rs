// src/cli.rs
//! Command-line definitions for fxresolve

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fxresolve")]
#[command(author, version)]
#[command(
    about = "Resolve an application's framework references to installed versions",
    long_about = None
)]
pub struct Cli {
    /// Path to the application's runtimeconfig.json
    #[arg(value_name = "APP_RUNTIMECONFIG")]
    pub app_config: PathBuf,

    /// Install root containing shared/<framework>/<version> (repeatable, searched in order)
    #[arg(long = "dotnet-root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Exact version for the first framework reference
    #[arg(long, value_name = "VERSION")]
    pub fx_version: Option<String>,

    /// Roll-forward policy: Disable, LatestPatch, Minor, LatestMinor, Major, LatestMajor
    #[arg(long, value_name = "SETTING")]
    pub roll_forward: Option<String>,

    /// Legacy roll-forward level: 0, 1 or 2 (-1 leaves it unset)
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub roll_forward_on_no_candidate_fx: Option<String>,

    /// Print the resolution as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Install roots to search; defaults to the runtime config's directory
    pub fn search_roots(&self) -> Vec<PathBuf> {
        if !self.roots.is_empty() {
            return self.roots.clone();
        }
        let dir = match self.app_config.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        vec![dir]
    }
}
