// src/lib.rs

//! fxresolve
//!
//! Resolves runtime framework references to installed framework versions.
//!
//! # Architecture
//!
//! - Settings: roll-forward policy per reference from command line, runtime
//!   config and environment
//! - Matcher: one requested version plus policy to one installed version
//! - Graph resolver: fixed-point walk over framework references, restarting a
//!   framework when a later reference needs a different version
//! - Providers: installed versions and framework configs, in memory or on disk

pub mod config;
mod error;
pub mod provider;
pub mod resolver;
pub mod rollforward;
pub mod settings;
pub mod version;

pub use config::{FrameworkEntry, RuntimeConfig};
pub use error::{Error, Result};
pub use provider::{
    AvailableVersionQuery, CachedVersionQuery, DirectoryFrameworkProvider, FrameworkConfigReader,
    InMemoryFrameworks,
};
pub use resolver::{
    FrameworkGraphResolver, Resolution, ResolvedFramework, Restart, resolve_frameworks_for_app,
};
pub use rollforward::{EffectivePolicy, RollForwardOnNoCandidateFx, RollForwardSetting};
pub use settings::{
    CommandLineSettings, EnvironmentSettings, FrameworkReference, RollForwardSettings,
    SettingsResolver,
};
pub use version::FrameworkVersion;
