// src/resolver/conflict.rs

//! Conflict types for framework resolution
//!
//! A conflict carries every reference known for the offending framework so
//! the diagnostic can show where each requirement came from. It converts into
//! the flat crate `Error` once reported.

use crate::error::Error;
use crate::rollforward::EffectivePolicy;
use crate::settings::FrameworkReference;
use crate::version::FrameworkVersion;

/// Why a framework could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// Nothing installed satisfies the merged requirement
    NoCompatibleVersion {
        framework: String,
        requested: FrameworkVersion,
        policy: EffectivePolicy,
        available: Vec<FrameworkVersion>,
        references: Vec<FrameworkReference>,
    },
    /// A reference cannot be reconciled with the resolved version
    Unreconcilable {
        framework: String,
        requested: FrameworkVersion,
        resolved: FrameworkVersion,
        references: Vec<FrameworkReference>,
    },
}

impl Conflict {
    pub fn framework(&self) -> &str {
        match self {
            Conflict::NoCompatibleVersion { framework, .. } => framework,
            Conflict::Unreconcilable { framework, .. } => framework,
        }
    }

    fn references(&self) -> &[FrameworkReference] {
        match self {
            Conflict::NoCompatibleVersion { references, .. } => references,
            Conflict::Unreconcilable { references, .. } => references,
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::NoCompatibleVersion {
                framework,
                requested,
                policy,
                available,
                ..
            } => {
                writeln!(
                    f,
                    "No compatible version of {} for {} ({})",
                    framework, requested, policy
                )?;
                if available.is_empty() {
                    writeln!(f, "  no versions installed")?;
                } else {
                    let listed: Vec<String> = available.iter().map(|v| v.to_string()).collect();
                    writeln!(f, "  installed: {}", listed.join(", "))?;
                }
            }
            Conflict::Unreconcilable {
                framework,
                requested,
                resolved,
                ..
            } => {
                writeln!(
                    f,
                    "Reference to {} {} is incompatible with resolved version {}",
                    framework, requested, resolved
                )?;
            }
        }

        for reference in self.references() {
            writeln!(
                f,
                "  - {} requires {} ({})",
                reference.source_name(),
                reference.version,
                reference.policy
            )?;
        }
        Ok(())
    }
}

impl From<Conflict> for Error {
    fn from(conflict: Conflict) -> Self {
        match conflict {
            Conflict::NoCompatibleVersion {
                framework,
                requested,
                policy,
                ..
            } => Error::NoCompatibleVersion {
                framework,
                requested: requested.to_string(),
                policy: policy.to_string(),
            },
            Conflict::Unreconcilable {
                framework,
                requested,
                resolved,
                ..
            } => Error::ReconcileFailure {
                framework,
                requested: requested.to_string(),
                conflicting: resolved.to_string(),
            },
        }
    }
}
