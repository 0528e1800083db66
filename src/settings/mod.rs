// src/settings/mod.rs

//! Roll-forward settings resolution
//!
//! Settings come from four scopes. For one framework reference the effective
//! priority is:
//!
//! 1. command line (`--fx-version`, `--roll-forward`,
//!    `--roll-forward-on-no-candidate-fx`), first app reference only
//! 2. the framework reference entry itself
//! 3. the root `runtimeOptions` of the config that declares the reference
//! 4. environment variables, consulted only when nothing above is specified
//!
//! Scopes are overlaid from lowest to highest: the roll level comes from the
//! highest scope that sets `rollForward` or `rollForwardOnNoCandidateFx`, and
//! `applyPatches` from the highest scope that sets it. Within a single scope
//! the `rollForward` property and the legacy pair are mutually exclusive;
//! mixing them is a `CollisionError`.

use crate::config::{FrameworkEntry, RuntimeConfig};
use crate::error::{Error, Result};
use crate::rollforward::{
    APPLY_PATCHES, EffectivePolicy, ROLL_FORWARD, ROLL_FORWARD_ON_NO_CANDIDATE_FX,
    RollForwardOnNoCandidateFx, RollForwardSetting,
};
use crate::version::FrameworkVersion;
use std::fmt;
use tracing::debug;

/// Environment variable holding a `rollForward` value
pub const ENV_ROLL_FORWARD: &str = "DOTNET_ROLL_FORWARD";
/// Environment variable holding a `rollForwardOnNoCandidateFx` value
pub const ENV_ROLL_FORWARD_ON_NO_CANDIDATE_FX: &str = "DOTNET_ROLL_FORWARD_ON_NO_CANDIDATE_FX";

/// Roll-forward properties specified in one scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollForwardSettings {
    pub roll_forward: Option<RollForwardSetting>,
    pub roll_forward_on_no_candidate_fx: Option<RollForwardOnNoCandidateFx>,
    pub apply_patches: Option<bool>,
}

impl RollForwardSettings {
    pub fn with_roll_forward(setting: RollForwardSetting) -> Self {
        Self {
            roll_forward: Some(setting),
            ..Default::default()
        }
    }

    pub fn with_legacy(
        on_no_candidate: Option<RollForwardOnNoCandidateFx>,
        apply_patches: Option<bool>,
    ) -> Self {
        Self {
            roll_forward: None,
            roll_forward_on_no_candidate_fx: on_no_candidate,
            apply_patches,
        }
    }

    /// Whether any property is set in this scope
    pub fn is_specified(&self) -> bool {
        self.roll_forward.is_some() || self.has_legacy()
    }

    fn has_legacy(&self) -> bool {
        self.roll_forward_on_no_candidate_fx.is_some() || self.apply_patches.is_some()
    }

    /// Reject `rollForward` mixed with a legacy property in one scope
    pub fn validate(&self, scope: &str) -> Result<()> {
        if self.roll_forward.is_none() {
            return Ok(());
        }

        let second = if self.roll_forward_on_no_candidate_fx.is_some() {
            ROLL_FORWARD_ON_NO_CANDIDATE_FX
        } else if self.apply_patches.is_some() {
            APPLY_PATCHES
        } else {
            return Ok(());
        };

        Err(Error::CollisionError {
            scope: scope.to_string(),
            first: ROLL_FORWARD.to_string(),
            second: second.to_string(),
        })
    }

    /// Lay a higher-priority scope over this one
    ///
    /// `rollForward` and `rollForwardOnNoCandidateFx` both set the roll level,
    /// so the higher scope's level replaces whichever one the lower scope
    /// used. `applyPatches` is overlaid on its own.
    pub fn overlay(&self, higher: &RollForwardSettings) -> RollForwardSettings {
        let (roll_forward, roll_forward_on_no_candidate_fx) = if higher.roll_forward.is_some() {
            (higher.roll_forward, None)
        } else if higher.roll_forward_on_no_candidate_fx.is_some() {
            (None, higher.roll_forward_on_no_candidate_fx)
        } else {
            (self.roll_forward, self.roll_forward_on_no_candidate_fx)
        };

        RollForwardSettings {
            roll_forward,
            roll_forward_on_no_candidate_fx,
            apply_patches: higher.apply_patches.or(self.apply_patches),
        }
    }

    /// Translate into the policy the matcher runs
    ///
    /// `applyPatches` also qualifies a `rollForward` level that came from a
    /// different scope; `LatestMinor` and `LatestMajor` ignore it.
    pub fn effective_policy(&self) -> EffectivePolicy {
        match self.roll_forward {
            Some(setting) => {
                EffectivePolicy::compose(setting, self.apply_patches.unwrap_or(true))
            }
            None => EffectivePolicy::from_legacy(
                self.roll_forward_on_no_candidate_fx,
                self.apply_patches,
            ),
        }
    }
}

/// Settings passed on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLineSettings {
    /// Exact version for the first app reference
    pub fx_version: Option<FrameworkVersion>,
    pub settings: RollForwardSettings,
}

impl CommandLineSettings {
    pub const SCOPE: &'static str = "command line";

    /// Parse and validate raw command-line values
    pub fn from_args(
        fx_version: Option<&str>,
        roll_forward: Option<&str>,
        roll_forward_on_no_candidate_fx: Option<&str>,
    ) -> Result<Self> {
        if roll_forward.is_some() && roll_forward_on_no_candidate_fx.is_some() {
            return Err(Error::CollisionError {
                scope: Self::SCOPE.to_string(),
                first: "--roll-forward".to_string(),
                second: "--roll-forward-on-no-candidate-fx".to_string(),
            });
        }

        let fx_version = fx_version.map(FrameworkVersion::parse).transpose()?;
        let settings = RollForwardSettings {
            roll_forward: roll_forward.map(RollForwardSetting::parse).transpose()?,
            roll_forward_on_no_candidate_fx: roll_forward_on_no_candidate_fx
                .map(RollForwardOnNoCandidateFx::parse)
                .transpose()?
                .flatten(),
            apply_patches: None,
        };

        Ok(Self {
            fx_version,
            settings,
        })
    }

    pub fn is_specified(&self) -> bool {
        self.fx_version.is_some() || self.settings.is_specified()
    }
}

/// Settings read from environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSettings {
    pub settings: RollForwardSettings,
}

impl EnvironmentSettings {
    pub const SCOPE: &'static str = "environment";

    /// Read from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an explicit lookup function
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let settings = RollForwardSettings {
            roll_forward: read(ENV_ROLL_FORWARD)
                .map(|value| RollForwardSetting::parse(&value))
                .transpose()?,
            roll_forward_on_no_candidate_fx: read(ENV_ROLL_FORWARD_ON_NO_CANDIDATE_FX)
                .map(|value| RollForwardOnNoCandidateFx::parse(&value))
                .transpose()?
                .flatten(),
            apply_patches: None,
        };
        settings.validate(Self::SCOPE)?;

        if settings.is_specified() {
            debug!("Roll-forward settings from environment: {:?}", settings);
        }
        Ok(Self { settings })
    }
}

/// A reference to a framework with its effective roll-forward policy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameworkReference {
    pub name: String,
    pub version: FrameworkVersion,
    pub policy: EffectivePolicy,
    /// Framework that declared this reference; `None` for the app
    pub source: Option<String>,
}

impl FrameworkReference {
    pub fn new(
        name: impl Into<String>,
        version: FrameworkVersion,
        policy: EffectivePolicy,
    ) -> Self {
        Self {
            name: name.into(),
            version,
            policy,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Display name of the declaring config
    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or("app")
    }
}

impl fmt::Display for FrameworkReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}) from {}",
            self.name,
            self.version,
            self.policy,
            self.source_name()
        )
    }
}

/// Turns runtime config entries into framework references
#[derive(Debug, Clone, Default)]
pub struct SettingsResolver {
    command_line: CommandLineSettings,
    environment: EnvironmentSettings,
}

impl SettingsResolver {
    pub fn new(command_line: CommandLineSettings, environment: EnvironmentSettings) -> Self {
        Self {
            command_line,
            environment,
        }
    }

    /// References declared by the application
    ///
    /// Command-line settings apply to the first reference only.
    pub fn app_references(&self, config: &RuntimeConfig) -> Result<Vec<FrameworkReference>> {
        let mut references = Vec::with_capacity(config.frameworks.len());
        for (index, entry) in config.frameworks.iter().enumerate() {
            let command_line = (index == 0).then_some(&self.command_line);
            references.push(self.reference_for(entry, config, command_line, None)?);
        }
        Ok(references)
    }

    /// References declared by a resolved framework's own config
    pub fn framework_references(
        &self,
        source: &str,
        config: &RuntimeConfig,
    ) -> Result<Vec<FrameworkReference>> {
        config
            .frameworks
            .iter()
            .map(|entry| self.reference_for(entry, config, None, Some(source)))
            .collect()
    }

    fn reference_for(
        &self,
        entry: &FrameworkEntry,
        config: &RuntimeConfig,
        command_line: Option<&CommandLineSettings>,
        source: Option<&str>,
    ) -> Result<FrameworkReference> {
        let mut reference = FrameworkReference {
            name: entry.name.clone(),
            version: entry.version.clone(),
            policy: EffectivePolicy::default(),
            source: source.map(str::to_string),
        };

        if let Some(exact) = command_line.and_then(|cli| cli.fx_version.as_ref()) {
            debug!(
                "--fx-version {} overrides {} {}",
                exact, reference.name, reference.version
            );
            reference.version = exact.clone();
            reference.policy = EffectivePolicy::Disable;
            return Ok(reference);
        }

        let cli_settings = command_line
            .map(|cli| &cli.settings)
            .filter(|settings| settings.is_specified());

        let specified = cli_settings.is_some()
            || entry.settings.is_specified()
            || config.settings.is_specified();

        let base = if specified {
            RollForwardSettings::default()
        } else {
            self.environment.settings.clone()
        };

        let mut merged = base.overlay(&config.settings).overlay(&entry.settings);
        if let Some(cli) = cli_settings {
            merged = merged.overlay(cli);
        }

        reference.policy = merged.effective_policy();
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn v(s: &str) -> FrameworkVersion {
        FrameworkVersion::parse(s).unwrap()
    }

    fn app_config(root: RollForwardSettings, entry: RollForwardSettings) -> RuntimeConfig {
        RuntimeConfig::new()
            .with_settings(root)
            .with_framework(
                FrameworkEntry::new("Microsoft.NETCore.App", v("5.1.0")).with_settings(entry),
            )
            .with_framework(FrameworkEntry::new("Microsoft.AspNetCore.App", v("5.1.0")))
    }

    fn env(pairs: &[(&str, &str)]) -> EnvironmentSettings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvironmentSettings::from_lookup(|name| map.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_validate_collision_in_one_scope() {
        let settings = RollForwardSettings {
            roll_forward: Some(RollForwardSetting::Major),
            roll_forward_on_no_candidate_fx: None,
            apply_patches: Some(false),
        };
        let err = settings.validate("runtimeconfig.json").unwrap_err();
        assert!(matches!(
            err,
            Error::CollisionError { ref second, .. } if second == APPLY_PATCHES
        ));
    }

    #[test]
    fn test_overlay_roll_forward_replaces_legacy_level() {
        let lower = RollForwardSettings::with_legacy(Some(RollForwardOnNoCandidateFx::Major), None);
        let higher = RollForwardSettings::with_roll_forward(RollForwardSetting::LatestPatch);
        assert_eq!(lower.overlay(&higher), higher);

        let lower = RollForwardSettings::with_roll_forward(RollForwardSetting::LatestMajor);
        let higher =
            RollForwardSettings::with_legacy(Some(RollForwardOnNoCandidateFx::Disabled), None);
        assert_eq!(lower.overlay(&higher).effective_policy(), EffectivePolicy::LatestPatch);
    }

    #[test]
    fn test_overlay_apply_patches_independent() {
        // rollForward on the command line, applyPatches in the runtime config
        let lower = RollForwardSettings::with_legacy(None, Some(false));
        let higher = RollForwardSettings::with_roll_forward(RollForwardSetting::Minor);
        assert_eq!(
            lower.overlay(&higher).effective_policy(),
            EffectivePolicy::MinorNearestPatch
        );

        let lower = RollForwardSettings::with_legacy(Some(RollForwardOnNoCandidateFx::Major), None);
        let higher = RollForwardSettings::with_legacy(None, Some(false));
        assert_eq!(
            lower.overlay(&higher).effective_policy(),
            EffectivePolicy::MajorNearestPatch
        );

        let lower = RollForwardSettings::with_legacy(None, Some(false));
        let higher = RollForwardSettings::with_roll_forward(RollForwardSetting::LatestMinor);
        assert_eq!(
            lower.overlay(&higher).effective_policy(),
            EffectivePolicy::LatestMinor
        );
    }

    #[test]
    fn test_default_policy_is_minor() {
        let resolver = SettingsResolver::default();
        let config = app_config(RollForwardSettings::default(), RollForwardSettings::default());
        let refs = resolver.app_references(&config).unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.policy == EffectivePolicy::Minor));
        assert!(refs.iter().all(|r| r.source.is_none()));
    }

    #[test]
    fn test_command_line_applies_to_first_reference_only() {
        let cli = CommandLineSettings::from_args(None, Some("LatestMajor"), None).unwrap();
        let resolver = SettingsResolver::new(cli, EnvironmentSettings::default());
        let config = app_config(
            RollForwardSettings::default(),
            RollForwardSettings::with_roll_forward(RollForwardSetting::Disable),
        );
        let refs = resolver.app_references(&config).unwrap();
        assert_eq!(refs[0].policy, EffectivePolicy::LatestMajor);
        assert_eq!(refs[1].policy, EffectivePolicy::Minor);
    }

    #[test]
    fn test_fx_version_forces_exact() {
        let cli = CommandLineSettings::from_args(Some("5.4.1"), Some("LatestMajor"), None).unwrap();
        let resolver = SettingsResolver::new(cli, EnvironmentSettings::default());
        let config = app_config(RollForwardSettings::default(), RollForwardSettings::default());
        let refs = resolver.app_references(&config).unwrap();
        assert_eq!(refs[0].version, v("5.4.1"));
        assert_eq!(refs[0].policy, EffectivePolicy::Disable);
        assert_eq!(refs[1].version, v("5.1.0"));
    }

    #[test]
    fn test_command_line_collision() {
        let err = CommandLineSettings::from_args(None, Some("Major"), Some("2")).unwrap_err();
        assert!(matches!(err, Error::CollisionError { .. }));
        assert!(err.is_settings_error());
    }

    #[test]
    fn test_framework_reference_beats_root() {
        let resolver = SettingsResolver::default();
        let config = app_config(
            RollForwardSettings::with_roll_forward(RollForwardSetting::LatestMajor),
            RollForwardSettings::with_roll_forward(RollForwardSetting::LatestPatch),
        );
        let refs = resolver.app_references(&config).unwrap();
        assert_eq!(refs[0].policy, EffectivePolicy::LatestPatch);
        // Root settings still apply to the second reference
        assert_eq!(refs[1].policy, EffectivePolicy::LatestMajor);
    }

    #[test]
    fn test_environment_only_when_nothing_else_specified() {
        let environment = env(&[(ENV_ROLL_FORWARD, "LatestMinor")]);
        let resolver = SettingsResolver::new(CommandLineSettings::default(), environment);

        let plain = app_config(RollForwardSettings::default(), RollForwardSettings::default());
        let refs = resolver.app_references(&plain).unwrap();
        assert_eq!(refs[0].policy, EffectivePolicy::LatestMinor);

        let with_legacy = app_config(
            RollForwardSettings::default(),
            RollForwardSettings::with_legacy(None, Some(false)),
        );
        let refs = resolver.app_references(&with_legacy).unwrap();
        assert_eq!(refs[0].policy, EffectivePolicy::MinorNearestPatch);
        assert_eq!(refs[1].policy, EffectivePolicy::LatestMinor);
    }

    #[test]
    fn test_environment_parse_errors() {
        let map = HashMap::from([(ENV_ROLL_FORWARD.to_string(), "Nope".to_string())]);
        let err = EnvironmentSettings::from_lookup(|name| map.get(name).cloned()).unwrap_err();
        assert!(matches!(err, Error::InvalidRollForwardValue { .. }));

        let blank = env(&[(ENV_ROLL_FORWARD, "  ")]);
        assert!(!blank.settings.is_specified());
    }

    #[test]
    fn test_framework_references_carry_source() {
        let resolver = SettingsResolver::new(
            CommandLineSettings::from_args(None, Some("Disable"), None).unwrap(),
            EnvironmentSettings::default(),
        );
        let config = RuntimeConfig::new()
            .with_framework(FrameworkEntry::new("Microsoft.NETCore.App", v("5.4.1")));
        let refs = resolver.framework_references("HighWare", &config).unwrap();
        assert_eq!(refs[0].source.as_deref(), Some("HighWare"));
        // Command line never reaches inner references
        assert_eq!(refs[0].policy, EffectivePolicy::Minor);
    }
}
