// src/config/mod.rs
//! Runtime configuration (`*.runtimeconfig.json`) parsing
//!
//! Only the parts that drive framework resolution are modelled:
//!
//! ```json
//! {
//!   "runtimeOptions": {
//!     "rollForward": "Major",
//!     "frameworks": [
//!       { "name": "Microsoft.NETCore.App", "version": "5.1.0", "applyPatches": false }
//!     ]
//!   }
//! }
//! ```
//!
//! A single `framework` object and a `frameworks` array may both be present;
//! they are concatenated in that order.

use crate::error::{Error, Result};
use crate::rollforward::{
    ROLL_FORWARD_ON_NO_CANDIDATE_FX, RollForwardOnNoCandidateFx, RollForwardSetting,
};
use crate::settings::RollForwardSettings;
use crate::version::FrameworkVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Origin used in diagnostics for configs that were not read from disk
pub const INLINE_ORIGIN: &str = "<inline>";

/// On-disk layout of a runtime config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    runtime_options: Option<RuntimeOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    framework: Option<FrameworkJson>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    frameworks: Vec<FrameworkJson>,

    #[serde(flatten)]
    settings: SettingsJson,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameworkJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,

    #[serde(flatten)]
    settings: SettingsJson,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    roll_forward: Option<String>,

    /// Number or numeric string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    roll_forward_on_no_candidate_fx: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    apply_patches: Option<bool>,
}

impl SettingsJson {
    fn to_settings(&self) -> Result<RollForwardSettings> {
        let roll_forward = self
            .roll_forward
            .as_deref()
            .map(RollForwardSetting::parse)
            .transpose()?;

        let roll_forward_on_no_candidate_fx = match &self.roll_forward_on_no_candidate_fx {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => match n.as_i64() {
                Some(n) => RollForwardOnNoCandidateFx::from_number(n)?,
                None => {
                    return Err(Error::invalid_value(
                        ROLL_FORWARD_ON_NO_CANDIDATE_FX,
                        n.to_string(),
                    ));
                }
            },
            Some(Value::String(s)) => RollForwardOnNoCandidateFx::parse(s)?,
            Some(other) => {
                return Err(Error::invalid_value(
                    ROLL_FORWARD_ON_NO_CANDIDATE_FX,
                    other.to_string(),
                ));
            }
        };

        Ok(RollForwardSettings {
            roll_forward,
            roll_forward_on_no_candidate_fx,
            apply_patches: self.apply_patches,
        })
    }

    fn from_settings(settings: &RollForwardSettings) -> Self {
        Self {
            roll_forward: settings.roll_forward.map(|s| s.to_string()),
            roll_forward_on_no_candidate_fx: settings
                .roll_forward_on_no_candidate_fx
                .map(|fx| Value::from(fx.as_number())),
            apply_patches: settings.apply_patches,
        }
    }
}

/// One framework reference as written in a config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkEntry {
    pub name: String,
    pub version: FrameworkVersion,
    pub settings: RollForwardSettings,
}

impl FrameworkEntry {
    pub fn new(name: impl Into<String>, version: FrameworkVersion) -> Self {
        Self {
            name: name.into(),
            version,
            settings: RollForwardSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RollForwardSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Framework references and root roll-forward settings of one config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub frameworks: Vec<FrameworkEntry>,
    /// Root-level `runtimeOptions` settings
    pub settings: RollForwardSettings,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_framework(mut self, entry: FrameworkEntry) -> Self {
        self.frameworks.push(entry);
        self
    }

    pub fn with_settings(mut self, settings: RollForwardSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Load a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigError {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, &origin)
    }

    /// Parse config JSON; `origin` names the source in errors
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let file: RuntimeConfigFile =
            serde_json::from_str(content).map_err(|e| Error::ConfigError {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;

        let Some(options) = file.runtime_options else {
            return Ok(Self::default());
        };

        let settings = options.settings.to_settings()?;
        settings.validate(&format!("{origin} (runtimeOptions)"))?;

        let mut frameworks = Vec::new();
        for raw in options.framework.iter().chain(options.frameworks.iter()) {
            frameworks.push(Self::parse_entry(raw, origin)?);
        }

        Ok(Self {
            frameworks,
            settings,
        })
    }

    fn parse_entry(raw: &FrameworkJson, origin: &str) -> Result<FrameworkEntry> {
        let missing = |field: &str| Error::ConfigError {
            path: origin.to_string(),
            reason: format!("framework reference is missing '{field}'"),
        };

        let name = raw
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| missing("name"))?;
        let version_text = raw.version.as_deref().ok_or_else(|| missing("version"))?;
        let version = FrameworkVersion::parse(version_text).map_err(|e| Error::ConfigError {
            path: origin.to_string(),
            reason: format!("framework '{name}': {e}"),
        })?;

        let settings = raw.settings.to_settings()?;
        settings.validate(&format!("{origin} (framework '{name}')"))?;

        Ok(FrameworkEntry {
            name: name.to_string(),
            version,
            settings,
        })
    }

    /// Render as runtime config JSON
    pub fn to_json(&self) -> Result<String> {
        let frameworks = self
            .frameworks
            .iter()
            .map(|entry| FrameworkJson {
                name: Some(entry.name.clone()),
                version: Some(entry.version.to_string()),
                settings: SettingsJson::from_settings(&entry.settings),
            })
            .collect();

        let file = RuntimeConfigFile {
            runtime_options: Some(RuntimeOptions {
                framework: None,
                frameworks,
                settings: SettingsJson::from_settings(&self.settings),
            }),
        };

        serde_json::to_string_pretty(&file).map_err(|e| Error::ConfigError {
            path: INLINE_ORIGIN.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rollforward::EffectivePolicy;

    #[test]
    fn test_parse_single_framework() {
        let json = r#"{
            "runtimeOptions": {
                "framework": { "name": "Microsoft.NETCore.App", "version": "5.1.0" }
            }
        }"#;
        let config = RuntimeConfig::parse(json, "app.runtimeconfig.json").unwrap();
        assert_eq!(config.frameworks.len(), 1);
        assert_eq!(config.frameworks[0].name, "Microsoft.NETCore.App");
        assert_eq!(config.frameworks[0].version.to_string(), "5.1.0");
        assert!(!config.settings.is_specified());
    }

    #[test]
    fn test_parse_framework_and_frameworks_concatenated() {
        let json = r#"{
            "runtimeOptions": {
                "framework": { "name": "A", "version": "1.0.0" },
                "frameworks": [
                    { "name": "B", "version": "2.0.0", "rollForward": "latestPatch" },
                    { "name": "C", "version": "3.0.0-preview.1", "rollForwardOnNoCandidateFx": "2" }
                ],
                "applyPatches": false
            }
        }"#;
        let config = RuntimeConfig::parse(json, INLINE_ORIGIN).unwrap();
        let names: Vec<_> = config.frameworks.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(
            config.frameworks[1].settings.roll_forward,
            Some(RollForwardSetting::LatestPatch)
        );
        assert_eq!(
            config.frameworks[2].settings.roll_forward_on_no_candidate_fx,
            Some(RollForwardOnNoCandidateFx::Major)
        );
        assert_eq!(config.settings.apply_patches, Some(false));
    }

    #[test]
    fn test_parse_numeric_legacy_value() {
        let json = r#"{"runtimeOptions": {"rollForwardOnNoCandidateFx": 0,
            "frameworks": [{"name": "A", "version": "1.0.0"}]}}"#;
        let config = RuntimeConfig::parse(json, INLINE_ORIGIN).unwrap();
        assert_eq!(
            config.settings.effective_policy(),
            EffectivePolicy::LatestPatch
        );
    }

    #[test]
    fn test_collision_in_framework_scope() {
        let json = r#"{"runtimeOptions": {"frameworks": [
            {"name": "A", "version": "1.0.0", "rollForward": "Major", "rollForwardOnNoCandidateFx": 1}
        ]}}"#;
        let err = RuntimeConfig::parse(json, "app.json").unwrap_err();
        match err {
            Error::CollisionError { scope, .. } => assert!(scope.contains("framework 'A'")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collision_in_root_scope() {
        let json = r#"{"runtimeOptions": {"rollForward": "Major", "applyPatches": true}}"#;
        let err = RuntimeConfig::parse(json, "app.json").unwrap_err();
        assert!(matches!(err, Error::CollisionError { .. }));
    }

    #[test]
    fn test_invalid_values() {
        let json = r#"{"runtimeOptions": {"rollForward": "Sometimes"}}"#;
        assert!(matches!(
            RuntimeConfig::parse(json, "app.json").unwrap_err(),
            Error::InvalidRollForwardValue { .. }
        ));

        let json = r#"{"runtimeOptions": {"rollForwardOnNoCandidateFx": 7}}"#;
        assert!(matches!(
            RuntimeConfig::parse(json, "app.json").unwrap_err(),
            Error::InvalidRollForwardValue { .. }
        ));
    }

    #[test]
    fn test_missing_fields_name_the_path() {
        let json = r#"{"runtimeOptions": {"frameworks": [{"version": "1.0.0"}]}}"#;
        let err = RuntimeConfig::parse(json, "bad.runtimeconfig.json").unwrap_err();
        assert!(matches!(err, Error::ConfigError { .. }));
        assert!(err.to_string().contains("bad.runtimeconfig.json"));

        let json = r#"{"runtimeOptions": {"frameworks": [{"name": "A", "version": "1.x"}]}}"#;
        assert!(RuntimeConfig::parse(json, "bad.json").is_err());

        assert!(RuntimeConfig::parse("{ not json", "bad.json").is_err());
    }

    #[test]
    fn test_missing_runtime_options_is_empty() {
        let config = RuntimeConfig::parse("{}", INLINE_ORIGIN).unwrap();
        assert!(config.frameworks.is_empty());
    }

    #[test]
    fn test_to_json_parses_back() {
        let config = RuntimeConfig::new()
            .with_settings(RollForwardSettings::with_legacy(
                Some(RollForwardOnNoCandidateFx::Disabled),
                Some(false),
            ))
            .with_framework(
                FrameworkEntry::new("A", FrameworkVersion::parse("1.2.3-preview.1").unwrap())
                    .with_settings(RollForwardSettings::with_roll_forward(
                        RollForwardSetting::LatestMinor,
                    )),
            );
        let json = config.to_json().unwrap();
        assert!(json.contains("\"rollForward\": \"LatestMinor\""));
        assert_eq!(RuntimeConfig::parse(&json, INLINE_ORIGIN).unwrap(), config);
    }
}
