// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use fxresolve::{
    CommandLineSettings, EnvironmentSettings, FrameworkVersion, InMemoryFrameworks, Resolution,
    Result, RuntimeConfig, SettingsResolver,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const NETCORE: &str = "Microsoft.NETCore.App";
pub const MIDDLEWARE: &str = "MiddleWare";
pub const HIGHWARE: &str = "HighWare";

pub fn v(s: &str) -> FrameworkVersion {
    FrameworkVersion::parse(s).unwrap()
}

/// Runtime config JSON referencing a single framework
pub fn single_framework_json(name: &str, version: &str, extra: &str) -> String {
    let extra = if extra.is_empty() {
        String::new()
    } else {
        format!(", {extra}")
    };
    format!(
        r#"{{ "runtimeOptions": {{ "framework": {{ "name": "{name}", "version": "{version}" }}{extra} }} }}"#
    )
}

pub fn parse_config(json: &str) -> RuntimeConfig {
    RuntimeConfig::parse(json, "test.runtimeconfig.json").unwrap()
}

/// Register release/pre-release versions of `name` with no references of their own
pub fn install(
    frameworks: InMemoryFrameworks,
    name: &str,
    versions: &[&str],
) -> InMemoryFrameworks {
    frameworks.with_versions(name, versions).unwrap()
}

/// Register one framework version whose own config is `json`
pub fn install_with_config(
    frameworks: InMemoryFrameworks,
    name: &str,
    version: &str,
    json: &str,
) -> InMemoryFrameworks {
    frameworks.with_framework(name, v(version), parse_config(json))
}

/// Environment lookup backed by a fixed map
pub fn environment(pairs: &[(&str, &str)]) -> EnvironmentSettings {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvironmentSettings::from_lookup(|name| map.get(name).cloned()).unwrap()
}

/// Command line with at most one of the roll-forward flags
pub fn command_line(
    fx_version: Option<&str>,
    roll_forward: Option<&str>,
    on_no_candidate: Option<&str>,
) -> CommandLineSettings {
    CommandLineSettings::from_args(fx_version, roll_forward, on_no_candidate).unwrap()
}

pub fn resolve(frameworks: &InMemoryFrameworks, app_json: &str) -> Result<Resolution> {
    resolve_with(frameworks, app_json, SettingsResolver::default())
}

pub fn resolve_with(
    frameworks: &InMemoryFrameworks,
    app_json: &str,
    settings: SettingsResolver,
) -> Result<Resolution> {
    let config = RuntimeConfig::parse(app_json, "app.runtimeconfig.json")?;
    fxresolve::FrameworkGraphResolver::new(frameworks, frameworks, &settings).resolve_app(&config)
}

/// An install root on disk laid out as `shared/<name>/<version>/`
pub struct InstallRoot {
    dir: TempDir,
}

impl InstallRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a framework version directory, optionally with its own config
    pub fn add_framework(&self, name: &str, version: &str, config: Option<&str>) -> PathBuf {
        let dir = self.dir.path().join("shared").join(name).join(version);
        fs::create_dir_all(&dir).unwrap();
        if let Some(json) = config {
            fs::write(dir.join(format!("{name}.runtimeconfig.json")), json).unwrap();
        }
        dir
    }

    /// Write an application config at the root and return its path
    pub fn write_app_config(&self, json: &str) -> PathBuf {
        let path = self.dir.path().join("app.runtimeconfig.json");
        fs::write(&path, json).unwrap();
        path
    }
}
