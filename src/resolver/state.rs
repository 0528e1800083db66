// src/resolver/state.rs

//! Mutable working state of one resolution pass
//!
//! Tracks, per framework name, every live reference to it (its
//! `Requirement`), the version currently chosen and the references already
//! checked against it, plus the worklist of references still to process.
//!
//! A reference is live while its source is. When a framework moves to another
//! version, the references its old version declared are withdrawn, and any
//! framework no longer reachable from the root references is dropped.

use crate::rollforward::{EffectivePolicy, MergedPolicy};
use crate::settings::FrameworkReference;
use crate::version::FrameworkVersion;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

use super::plan::{Resolution, ResolvedFramework, Restart};

/// Lifecycle of one framework within a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkStatus {
    /// Referenced, no version chosen yet
    Resolving,
    /// A version is chosen and every satisfied reference accepts it
    Resolved,
    /// The chosen version was replaced; dependent references are re-checked
    Invalidated,
}

/// Combined requirement of all references to one framework
#[derive(Debug, Clone)]
pub struct Requirement {
    floor: FrameworkVersion,
    policy: MergedPolicy,
    references: Vec<FrameworkReference>,
}

impl Requirement {
    pub fn new(reference: &FrameworkReference) -> Self {
        Self {
            floor: reference.version.clone(),
            policy: MergedPolicy::new(reference.policy),
            references: vec![reference.clone()],
        }
    }

    /// Fold in a reference; returns false if it was already known
    pub fn add(&mut self, reference: &FrameworkReference) -> bool {
        if self.references.contains(reference) {
            return false;
        }
        if reference.version > self.floor {
            self.floor = reference.version.clone();
        }
        self.policy = self.policy.merge(reference.policy);
        self.references.push(reference.clone());
        true
    }

    /// Drop every reference declared by `source`; returns true if any was
    pub fn remove_source(&mut self, source: &str) -> bool {
        let before = self.references.len();
        self.references
            .retain(|reference| reference.source.as_deref() != Some(source));
        if self.references.len() == before {
            return false;
        }
        self.recompute();
        true
    }

    fn recompute(&mut self) {
        let mut references = self.references.iter();
        let Some(first) = references.next() else {
            return;
        };
        let mut floor = &first.version;
        let mut policy = MergedPolicy::new(first.policy);
        for reference in references {
            if reference.version > *floor {
                floor = &reference.version;
            }
            policy = policy.merge(reference.policy);
        }
        self.floor = floor.clone();
        self.policy = policy;
    }

    /// Highest requested version
    pub fn floor(&self) -> &FrameworkVersion {
        &self.floor
    }

    /// Most restrictive policy over all references
    pub fn policy(&self) -> EffectivePolicy {
        self.policy.policy()
    }

    pub fn references(&self) -> &[FrameworkReference] {
        &self.references
    }
}

/// Per-framework entry of the working state
#[derive(Debug, Clone)]
pub struct TrackedFramework {
    pub requirement: Requirement,
    pub status: FrameworkStatus,
    /// Currently chosen version; kept while `Invalidated`
    pub version: Option<FrameworkVersion>,
    pub satisfied: Vec<FrameworkReference>,
}

/// Working state for one resolution pass
#[derive(Debug, Default)]
pub struct ResolutionState {
    frameworks: HashMap<String, TrackedFramework>,
    /// Framework names in the order they were first referenced
    order: Vec<String>,
    worklist: VecDeque<FrameworkReference>,
    restarts: Vec<Restart>,
}

impl ResolutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, reference: FrameworkReference) {
        self.worklist.push_back(reference);
    }

    pub fn enqueue_all(&mut self, references: impl IntoIterator<Item = FrameworkReference>) {
        self.worklist.extend(references);
    }

    /// Next reference to process
    pub fn next_reference(&mut self) -> Option<FrameworkReference> {
        self.worklist.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.worklist.len()
    }

    /// Record a reference against its framework, creating the entry if needed
    pub fn track(&mut self, reference: &FrameworkReference) -> &TrackedFramework {
        match self.frameworks.entry(reference.name.clone()) {
            Entry::Occupied(entry) => {
                let tracked = entry.into_mut();
                tracked.requirement.add(reference);
                tracked
            }
            Entry::Vacant(entry) => {
                self.order.push(reference.name.clone());
                entry.insert(TrackedFramework {
                    requirement: Requirement::new(reference),
                    status: FrameworkStatus::Resolving,
                    version: None,
                    satisfied: Vec::new(),
                })
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TrackedFramework> {
        self.frameworks.get(name)
    }

    /// Choose `version` for a framework that had none
    pub fn mark_resolved(&mut self, reference: &FrameworkReference, version: FrameworkVersion) {
        if let Some(tracked) = self.frameworks.get_mut(&reference.name) {
            tracked.status = FrameworkStatus::Resolved;
            tracked.version = Some(version);
            tracked.satisfied = vec![reference.clone()];
        }
    }

    /// Note that `reference` accepts the current version
    pub fn satisfy(&mut self, reference: &FrameworkReference) {
        if let Some(tracked) = self.frameworks.get_mut(&reference.name) {
            if !tracked.requirement.references().contains(reference) {
                return;
            }
            tracked.status = FrameworkStatus::Resolved;
            if !tracked.satisfied.contains(reference) {
                tracked.satisfied.push(reference.clone());
            }
        }
    }

    /// Replace the chosen version of a framework
    ///
    /// The framework stays `Invalidated` until a reference is satisfied by
    /// the new version. References declared by the old version are withdrawn.
    /// Returns the references that were satisfied by the old version so the
    /// caller can re-check them against `to`.
    pub fn invalidate(&mut self, name: &str, to: FrameworkVersion) -> Vec<FrameworkReference> {
        let Some(tracked) = self.frameworks.get_mut(name) else {
            return Vec::new();
        };

        tracked.status = FrameworkStatus::Invalidated;
        let previous = tracked.version.replace(to.clone());
        let mut recheck = std::mem::take(&mut tracked.satisfied);
        if let Some(from) = previous {
            self.restarts.push(Restart {
                framework: name.to_string(),
                from,
                to,
            });
            self.withdraw_source(name);
        }

        match self.frameworks.get(name) {
            Some(tracked) => {
                recheck.retain(|reference| tracked.requirement.references().contains(reference));
                recheck
            }
            None => Vec::new(),
        }
    }

    /// Withdraw every reference declared by `source`
    ///
    /// Frameworks that lose their last path from the root references are
    /// removed, withdrawing their own references in turn. Frameworks whose
    /// requirement changed but are still reachable get a reference queued so
    /// their version is recomputed.
    pub fn withdraw_source(&mut self, source: &str) {
        let mut sources = vec![source.to_string()];
        let mut affected = Vec::new();

        while let Some(source) = sources.pop() {
            self.worklist
                .retain(|reference| reference.source.as_deref() != Some(source.as_str()));

            for (name, tracked) in self.frameworks.iter_mut() {
                if tracked.requirement.remove_source(&source) {
                    tracked
                        .satisfied
                        .retain(|reference| reference.source.as_deref() != Some(source.as_str()));
                    affected.push(name.clone());
                }
            }

            for name in self.unreachable() {
                debug!("Dropping {}: no longer referenced", name);
                self.frameworks.remove(&name);
                self.order.retain(|known| *known != name);
                sources.push(name);
            }
        }

        for name in affected {
            let first = self
                .frameworks
                .get(&name)
                .and_then(|tracked| tracked.requirement.references().first().cloned());
            if let Some(reference) = first {
                self.worklist.push_back(reference);
            }
        }
    }

    /// Tracked frameworks with no chain of references back to a root
    ///
    /// A reference is a root when it has no source or its source is not a
    /// tracked framework.
    fn unreachable(&self) -> Vec<String> {
        let mut reachable: HashSet<&str> = HashSet::new();
        loop {
            let before = reachable.len();
            for (name, tracked) in &self.frameworks {
                if reachable.contains(name.as_str()) {
                    continue;
                }
                let referenced = tracked.requirement.references().iter().any(|reference| {
                    reference.source.as_deref().is_none_or(|source| {
                        reachable.contains(source) || !self.frameworks.contains_key(source)
                    })
                });
                if referenced {
                    reachable.insert(name.as_str());
                }
            }
            if reachable.len() == before {
                break;
            }
        }

        self.frameworks
            .keys()
            .filter(|name| !reachable.contains(name.as_str()))
            .cloned()
            .collect()
    }

    /// Tracked frameworks in the order they were first referenced
    pub fn tracked(&self) -> impl Iterator<Item = (&str, &TrackedFramework)> {
        self.order.iter().filter_map(|name| {
            self.frameworks
                .get(name)
                .map(|tracked| (name.as_str(), tracked))
        })
    }

    pub fn restarts(&self) -> &[Restart] {
        &self.restarts
    }

    /// Freeze the fixed point into a result
    pub fn into_resolution(mut self) -> Resolution {
        let frameworks = self
            .order
            .iter()
            .filter_map(|name| {
                let tracked = self.frameworks.remove(name)?;
                Some(ResolvedFramework {
                    name: name.clone(),
                    version: tracked.version?,
                    satisfied_references: tracked.requirement.references().to_vec(),
                })
            })
            .collect();

        Resolution {
            frameworks,
            restarts: self.restarts,
        }
    }
}
