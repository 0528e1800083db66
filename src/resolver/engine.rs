// src/resolver/engine.rs

//! Framework graph resolver
//!
//! Worklist-driven resolution of the framework reference tree. Each reference
//! is folded into its framework's `Requirement` and the matcher is re-run
//! with the highest requested version and the most restrictive merged policy.
//!
//! - first reference to a framework: the match becomes its version and the
//!   framework's own references are queued
//! - later references: if the match differs from the current version the
//!   framework restarts; references declared by the old version are
//!   withdrawn and everything checked against it is re-queued
//!
//! Conflicts are only reported once the worklist is drained. A reference
//! that cannot be honoured mid-pass may still be withdrawn by a later
//! restart, so the outcome depends on the final reference graph and not on
//! the order in which references were seen.

use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::provider::{AvailableVersionQuery, CachedVersionQuery, FrameworkConfigReader};
use crate::settings::{FrameworkReference, SettingsResolver};
use crate::version::FrameworkVersion;
use tracing::{debug, info, warn};

use super::conflict::Conflict;
use super::matcher::find_best_match;
use super::plan::Resolution;
use super::state::ResolutionState;

/// Restarts allowed before giving up on reaching a fixed point
pub const MAX_RESTARTS: usize = 100;

/// Resolves a framework reference tree against installed frameworks
pub struct FrameworkGraphResolver<'a> {
    versions: &'a dyn AvailableVersionQuery,
    configs: &'a dyn FrameworkConfigReader,
    settings: &'a SettingsResolver,
    max_restarts: usize,
}

impl<'a> FrameworkGraphResolver<'a> {
    pub fn new(
        versions: &'a dyn AvailableVersionQuery,
        configs: &'a dyn FrameworkConfigReader,
        settings: &'a SettingsResolver,
    ) -> Self {
        Self {
            versions,
            configs,
            settings,
            max_restarts: MAX_RESTARTS,
        }
    }

    /// Override the restart guard
    pub fn with_max_restarts(mut self, max_restarts: usize) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Resolve the frameworks referenced by an application config
    ///
    /// Settings errors in the app config surface before any framework is
    /// looked up.
    pub fn resolve_app(&self, app_config: &RuntimeConfig) -> Result<Resolution> {
        let references = self.settings.app_references(app_config)?;
        self.resolve(references)
    }

    /// Resolve starting from the given root references
    pub fn resolve(&self, root_references: Vec<FrameworkReference>) -> Result<Resolution> {
        let mut state = ResolutionState::new();
        let mut cache = CachedVersionQuery::new(self.versions);
        state.enqueue_all(root_references);

        while let Some(reference) = state.next_reference() {
            self.process(&mut state, &mut cache, reference)?;
            if state.restarts().len() > self.max_restarts {
                return Err(Error::RestartLimitExceeded(self.max_restarts));
            }
        }

        self.verify(&state, &mut cache)?;
        let resolution = state.into_resolution();
        info!(
            "Resolved {} framework(s) with {} restart(s)",
            resolution.frameworks.len(),
            resolution.restarts.len()
        );
        for framework in &resolution.frameworks {
            debug!("  {} {}", framework.name, framework.version);
        }
        Ok(resolution)
    }

    fn process(
        &self,
        state: &mut ResolutionState,
        cache: &mut CachedVersionQuery<'_>,
        reference: FrameworkReference,
    ) -> Result<()> {
        debug!("Processing reference {}", reference);

        let tracked = state.track(&reference);
        let floor = tracked.requirement.floor().clone();
        let policy = tracked.requirement.policy();
        let current = tracked.version.clone();

        let available = cache.versions(&reference.name)?;
        let candidate = find_best_match(&floor, policy, available);

        let Some(current) = current else {
            let Some(version) = candidate else {
                debug!("No match yet for {} {} ({})", reference.name, floor, policy);
                return Ok(());
            };

            debug!("Resolved {} {} -> {}", reference.name, floor, version);
            state.mark_resolved(&reference, version.clone());
            return self.enqueue_own_references(state, &reference.name, &version);
        };

        let Some(version) = candidate else {
            debug!(
                "No match for {} {} ({}), keeping {}",
                reference.name, floor, policy, current
            );
            return Ok(());
        };

        if version == current {
            if accepts(&reference, &version) {
                state.satisfy(&reference);
            }
            return Ok(());
        }

        info!(
            "Restarting {}: {} -> {} (reference {} from {})",
            reference.name,
            current,
            version,
            reference.version,
            reference.source_name()
        );
        let recheck = state.invalidate(&reference.name, version.clone());
        if state.get(&reference.name).is_none() {
            return Ok(());
        }
        if accepts(&reference, &version) {
            state.satisfy(&reference);
        }
        state.enqueue_all(recheck.into_iter().filter(|previous| *previous != reference));
        self.enqueue_own_references(state, &reference.name, &version)
    }

    /// Check the drained state: every framework has a version, that version
    /// is what its combined requirement selects, and every live reference
    /// accepts it
    fn verify(&self, state: &ResolutionState, cache: &mut CachedVersionQuery<'_>) -> Result<()> {
        for (name, tracked) in state.tracked() {
            let floor = tracked.requirement.floor();
            let policy = tracked.requirement.policy();
            let references = tracked.requirement.references();
            let available = cache.versions(name)?;

            let Some(version) = &tracked.version else {
                return Err(self.report(Conflict::NoCompatibleVersion {
                    framework: name.to_string(),
                    requested: floor.clone(),
                    policy,
                    available: available.to_vec(),
                    references: references.to_vec(),
                }));
            };

            if let Some(rejecting) = references
                .iter()
                .find(|reference| !accepts(reference, version))
            {
                return Err(self.report(Conflict::Unreconcilable {
                    framework: name.to_string(),
                    requested: rejecting.version.clone(),
                    resolved: version.clone(),
                    references: references.to_vec(),
                }));
            }

            if find_best_match(floor, policy, available).as_ref() != Some(version) {
                return Err(self.report(Conflict::Unreconcilable {
                    framework: name.to_string(),
                    requested: floor.clone(),
                    resolved: version.clone(),
                    references: references.to_vec(),
                }));
            }
        }
        Ok(())
    }

    fn enqueue_own_references(
        &self,
        state: &mut ResolutionState,
        framework: &str,
        version: &FrameworkVersion,
    ) -> Result<()> {
        let config = self.configs.read_framework_config(framework, version)?;
        let references = self.settings.framework_references(framework, &config)?;
        if !references.is_empty() {
            debug!(
                "{} {} references {} framework(s)",
                framework,
                version,
                references.len()
            );
        }
        state.enqueue_all(references);
        Ok(())
    }

    fn report(&self, conflict: Conflict) -> Error {
        warn!("{}", conflict.to_string().trim_end());
        conflict.into()
    }
}

/// Whether `reference` can run on `version`
fn accepts(reference: &FrameworkReference, version: &FrameworkVersion) -> bool {
    reference.version <= *version
        && reference
            .policy
            .is_compatible_with_higher(&reference.version, version)
}
