// src/resolver/matcher.rs

//! Framework version matching
//!
//! Turns a requested version and an effective policy into one installed
//! version. The search never rolls backward: every candidate is `>=` the
//! requested version. An exact match always wins.
//!
//! A release request first searches release versions only and falls back to
//! pre-releases when nothing matched. A pre-release request searches
//! everything at once.

use crate::error::{Error, Result};
use crate::rollforward::EffectivePolicy;
use crate::version::FrameworkVersion;
use tracing::debug;

/// Best installed version for `requested` under `policy`, if any
pub fn find_best_match(
    requested: &FrameworkVersion,
    policy: EffectivePolicy,
    available: &[FrameworkVersion],
) -> Option<FrameworkVersion> {
    if available.contains(requested) {
        debug!("Exact match for {}", requested);
        return Some(requested.clone());
    }

    if policy == EffectivePolicy::Disable {
        debug!("Roll forward disabled and {} is not installed", requested);
        return None;
    }

    if !requested.is_prerelease() {
        if let Some(found) = search(requested, policy, available, true) {
            return Some(found);
        }
    }

    search(requested, policy, available, false)
}

/// Like [`find_best_match`], reporting a miss as `NoCompatibleVersion`
pub fn match_version(
    framework: &str,
    requested: &FrameworkVersion,
    policy: EffectivePolicy,
    available: &[FrameworkVersion],
) -> Result<FrameworkVersion> {
    find_best_match(requested, policy, available).ok_or_else(|| Error::NoCompatibleVersion {
        framework: framework.to_string(),
        requested: requested.to_string(),
        policy: policy.to_string(),
    })
}

/// Whether `candidate` lies within the roll scope of `policy` from `requested`
fn in_scope(
    policy: EffectivePolicy,
    requested: &FrameworkVersion,
    candidate: &FrameworkVersion,
) -> bool {
    match policy {
        EffectivePolicy::Disable => candidate == requested,
        EffectivePolicy::PreReleaseOnly => candidate.same_patch(requested),
        EffectivePolicy::LatestPatch => candidate.same_minor(requested),
        EffectivePolicy::Minor
        | EffectivePolicy::MinorNearestPatch
        | EffectivePolicy::LatestMinor => candidate.same_major(requested),
        EffectivePolicy::Major
        | EffectivePolicy::MajorNearestPatch
        | EffectivePolicy::LatestMajor => true,
    }
}

fn search(
    requested: &FrameworkVersion,
    policy: EffectivePolicy,
    available: &[FrameworkVersion],
    release_only: bool,
) -> Option<FrameworkVersion> {
    let candidates: Vec<&FrameworkVersion> = available
        .iter()
        .filter(|v| !release_only || !v.is_prerelease())
        .filter(|v| *v >= requested && in_scope(policy, requested, v))
        .collect();

    let found = match policy {
        EffectivePolicy::Disable => None,
        EffectivePolicy::PreReleaseOnly
        | EffectivePolicy::LatestPatch
        | EffectivePolicy::LatestMinor
        | EffectivePolicy::LatestMajor => candidates.iter().max().copied(),
        EffectivePolicy::Minor | EffectivePolicy::Major => {
            // Nearest higher minor, then the latest patch of it
            let nearest = candidates.iter().min().copied()?;
            candidates
                .iter()
                .filter(|v| v.same_minor(nearest))
                .max()
                .copied()
        }
        EffectivePolicy::MinorNearestPatch | EffectivePolicy::MajorNearestPatch => {
            let nearest = candidates.iter().min().copied()?;
            if requested.is_prerelease() {
                // applyPatches=false still rolls the pre-release label
                candidates
                    .iter()
                    .filter(|v| v.same_patch(nearest))
                    .max()
                    .copied()
            } else {
                Some(nearest)
            }
        }
    };

    debug!(
        "Searched {} for {} ({}): {}",
        if release_only { "releases" } else { "all versions" },
        requested,
        policy,
        found.map_or_else(|| "no match".to_string(), |v| v.to_string())
    );

    found.cloned()
}
