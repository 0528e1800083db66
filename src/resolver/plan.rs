// src/resolver/plan.rs

//! Resolution result data structures

use crate::settings::FrameworkReference;
use crate::version::FrameworkVersion;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// A framework settled at one installed version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFramework {
    pub name: String,
    pub version: FrameworkVersion,
    /// References to this framework in the final graph; all accept `version`
    pub satisfied_references: Vec<FrameworkReference>,
}

/// A resolved framework moved to a different version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restart {
    pub framework: String,
    pub from: FrameworkVersion,
    pub to: FrameworkVersion,
}

impl std::fmt::Display for Restart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} -> {}", self.framework, self.from, self.to)
    }
}

/// Result of framework resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Frameworks in the order they were first resolved
    pub frameworks: Vec<ResolvedFramework>,
    /// Restarts performed on the way to the fixed point
    pub restarts: Vec<Restart>,
}

impl Resolution {
    /// Framework name to resolved version
    pub fn versions(&self) -> BTreeMap<String, FrameworkVersion> {
        self.frameworks
            .iter()
            .map(|fx| (fx.name.clone(), fx.version.clone()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedFramework> {
        self.frameworks.iter().find(|fx| fx.name == name)
    }

    pub fn version_of(&self, name: &str) -> Option<&FrameworkVersion> {
        self.get(name).map(|fx| &fx.version)
    }

    /// JSON summary used by the command line
    pub fn to_json(&self) -> Value {
        json!({
            "frameworks": self.frameworks.iter().map(|fx| json!({
                "name": fx.name,
                "version": fx.version.to_string(),
                "references": fx.satisfied_references.iter().map(|r| json!({
                    "version": r.version.to_string(),
                    "rollForward": r.policy.to_string(),
                    "source": r.source_name(),
                })).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
            "restarts": self.restarts.iter().map(|r| json!({
                "framework": r.framework,
                "from": r.from.to_string(),
                "to": r.to.to_string(),
            })).collect::<Vec<_>>(),
        })
    }
}
