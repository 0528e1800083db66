// src/provider/mod.rs

//! Installed framework providers
//!
//! The resolver only needs two things from its host:
//! - the versions of a framework that are installed
//! - the runtime config shipped with one installed framework version
//!
//! `InMemoryFrameworks` serves both from memory for embedders and tests.
//! `DirectoryFrameworkProvider` reads the usual install layout:
//!
//! ```text
//! <root>/shared/<name>/<version>/<name>.runtimeconfig.json
//! ```

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::version::FrameworkVersion;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Lists installed versions of a framework
pub trait AvailableVersionQuery {
    /// Installed versions of `framework`, ascending and without duplicates
    fn available_versions(&self, framework: &str) -> Result<Vec<FrameworkVersion>>;
}

/// Reads the runtime config shipped with an installed framework
pub trait FrameworkConfigReader {
    /// Config of `framework` at `version`; empty when the framework ships none
    fn read_framework_config(
        &self,
        framework: &str,
        version: &FrameworkVersion,
    ) -> Result<RuntimeConfig>;
}

/// Caches version listings for the duration of one resolution pass
pub struct CachedVersionQuery<'a> {
    inner: &'a dyn AvailableVersionQuery,
    cache: HashMap<String, Vec<FrameworkVersion>>,
}

impl<'a> CachedVersionQuery<'a> {
    pub fn new(inner: &'a dyn AvailableVersionQuery) -> Self {
        Self {
            inner,
            cache: HashMap::new(),
        }
    }

    /// Installed versions of `framework`, queried at most once per pass
    pub fn versions(&mut self, framework: &str) -> Result<&[FrameworkVersion]> {
        if !self.cache.contains_key(framework) {
            let versions = self.inner.available_versions(framework)?;
            debug!(
                "Found {} installed version(s) of {}",
                versions.len(),
                framework
            );
            self.cache.insert(framework.to_string(), versions);
        }
        Ok(self.cache.get(framework).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Number of distinct frameworks queried so far
    pub fn queried(&self) -> usize {
        self.cache.len()
    }
}

/// Frameworks and their configs held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryFrameworks {
    frameworks: BTreeMap<String, BTreeMap<FrameworkVersion, RuntimeConfig>>,
}

impl InMemoryFrameworks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a framework version with its own config
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        version: FrameworkVersion,
        config: RuntimeConfig,
    ) {
        self.frameworks
            .entry(name.into())
            .or_default()
            .insert(version, config);
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with_framework(
        mut self,
        name: impl Into<String>,
        version: FrameworkVersion,
        config: RuntimeConfig,
    ) -> Self {
        self.insert(name, version, config);
        self
    }

    /// Register several versions that declare no references of their own
    pub fn with_versions(mut self, name: &str, versions: &[&str]) -> Result<Self> {
        for version in versions {
            self.insert(name, FrameworkVersion::parse(version)?, RuntimeConfig::default());
        }
        Ok(self)
    }
}

impl AvailableVersionQuery for InMemoryFrameworks {
    fn available_versions(&self, framework: &str) -> Result<Vec<FrameworkVersion>> {
        Ok(self
            .frameworks
            .get(framework)
            .map(|versions| versions.keys().cloned().collect())
            .unwrap_or_default())
    }
}

impl FrameworkConfigReader for InMemoryFrameworks {
    fn read_framework_config(
        &self,
        framework: &str,
        version: &FrameworkVersion,
    ) -> Result<RuntimeConfig> {
        Ok(self
            .frameworks
            .get(framework)
            .and_then(|versions| versions.get(version))
            .cloned()
            .unwrap_or_default())
    }
}

/// Frameworks installed under one or more install roots
///
/// Roots are searched in the order given; when a version is installed under
/// several roots, the first root wins.
#[derive(Debug, Clone)]
pub struct DirectoryFrameworkProvider {
    roots: Vec<PathBuf>,
}

impl DirectoryFrameworkProvider {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn framework_dir(root: &Path, framework: &str) -> PathBuf {
        root.join("shared").join(framework)
    }

    /// Parseable version directories of `framework`, first root first
    fn version_dirs(&self, framework: &str) -> Result<Vec<(FrameworkVersion, PathBuf)>> {
        let mut found = Vec::new();
        for root in &self.roots {
            let dir = Self::framework_dir(root, framework);
            if !dir.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
                let entry = entry.map_err(std::io::Error::from)?;
                if !entry.file_type().is_dir() {
                    continue;
                }

                let name = entry.file_name().to_string_lossy().into_owned();
                match FrameworkVersion::parse(&name) {
                    Ok(version) => found.push((version, entry.into_path())),
                    Err(_) => debug!(
                        "Skipping {}: not a framework version",
                        entry.path().display()
                    ),
                }
            }
        }
        Ok(found)
    }

    /// Directory of an installed framework version
    pub fn locate(&self, framework: &str, version: &FrameworkVersion) -> Result<Option<PathBuf>> {
        Ok(self
            .version_dirs(framework)?
            .into_iter()
            .find(|(found, _)| found == version)
            .map(|(_, path)| path))
    }
}

impl AvailableVersionQuery for DirectoryFrameworkProvider {
    fn available_versions(&self, framework: &str) -> Result<Vec<FrameworkVersion>> {
        let mut versions: Vec<FrameworkVersion> = self
            .version_dirs(framework)?
            .into_iter()
            .map(|(version, _)| version)
            .collect();
        versions.sort();
        versions.dedup();
        Ok(versions)
    }
}

impl FrameworkConfigReader for DirectoryFrameworkProvider {
    fn read_framework_config(
        &self,
        framework: &str,
        version: &FrameworkVersion,
    ) -> Result<RuntimeConfig> {
        let Some(dir) = self.locate(framework, version)? else {
            debug!("{} {} is not installed; assuming no references", framework, version);
            return Ok(RuntimeConfig::default());
        };

        let path = dir.join(format!("{framework}.runtimeconfig.json"));
        if !path.is_file() {
            debug!("No runtime config at {}", path.display());
            return Ok(RuntimeConfig::default());
        }

        RuntimeConfig::from_file(&path)
    }
}
