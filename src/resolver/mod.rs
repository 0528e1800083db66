// src/resolver/mod.rs

//! Framework resolution
//!
//! Resolves the framework references of an application, and transitively of
//! every framework it pulls in, to one installed version per framework name.
//! The matcher picks a version for a single requirement; the engine walks the
//! reference tree, merging requirements and restarting frameworks until every
//! reference accepts the chosen versions.

mod conflict;
mod engine;
mod matcher;
mod plan;
mod state;

pub use conflict::Conflict;
pub use engine::{FrameworkGraphResolver, MAX_RESTARTS};
pub use matcher::{find_best_match, match_version};
pub use plan::{Resolution, ResolvedFramework, Restart};
pub use state::{FrameworkStatus, Requirement, ResolutionState, TrackedFramework};

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::provider::DirectoryFrameworkProvider;
use crate::settings::SettingsResolver;
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolve an application's runtime config against install roots on disk
pub fn resolve_frameworks_for_app(
    app_config: &Path,
    roots: Vec<PathBuf>,
    settings: &SettingsResolver,
) -> Result<Resolution> {
    let config = RuntimeConfig::from_file(app_config)?;
    info!(
        "Resolving {} framework reference(s) from {}",
        config.frameworks.len(),
        app_config.display()
    );

    let provider = DirectoryFrameworkProvider::new(roots);
    FrameworkGraphResolver::new(&provider, &provider, settings).resolve_app(&config)
}
