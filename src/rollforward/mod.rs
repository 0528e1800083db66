// src/rollforward/mod.rs

//! Roll-forward policies
//!
//! Two encodings exist for the same intent:
//! - the `rollForward` setting (`RollForwardSetting`)
//! - the legacy pair `rollForwardOnNoCandidateFx` + `applyPatches`
//!
//! Both are translated into a single `EffectivePolicy` so the matcher has one
//! code path. `EffectivePolicy` has more cases than `RollForwardSetting`
//! because the legacy pair can ask for "nearest higher" patch selection, which
//! the newer setting cannot express.

use crate::error::{Error, Result};
use crate::version::FrameworkVersion;
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// Setting name used in diagnostics for `rollForward`
pub const ROLL_FORWARD: &str = "rollForward";
/// Setting name used in diagnostics for `rollForwardOnNoCandidateFx`
pub const ROLL_FORWARD_ON_NO_CANDIDATE_FX: &str = "rollForwardOnNoCandidateFx";
/// Setting name used in diagnostics for `applyPatches`
pub const APPLY_PATCHES: &str = "applyPatches";

/// The `rollForward` setting
///
/// Variants are declared from most to least restrictive, so the derived
/// ordering doubles as the "roll level" used when merging policies.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum RollForwardSetting {
    /// Exact match only
    Disable,
    /// Highest patch of the requested major.minor
    LatestPatch,
    /// Nearest higher minor within the requested major, then its latest patch
    #[default]
    Minor,
    /// Highest minor.patch within the requested major
    LatestMinor,
    /// Nearest higher version of any major, then its latest patch
    Major,
    /// Highest version available
    LatestMajor,
}

impl RollForwardSetting {
    /// Parse a setting value, case-insensitively
    pub fn parse(value: &str) -> Result<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| Error::invalid_value(ROLL_FORWARD, value))
    }
}

/// Legacy `rollForwardOnNoCandidateFx` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RollForwardOnNoCandidateFx {
    /// 0: no roll across minor or major versions
    Disabled,
    /// 1: roll to a higher minor version
    #[default]
    Minor,
    /// 2: roll to a higher minor or major version
    Major,
}

impl RollForwardOnNoCandidateFx {
    /// Map a legacy number; `-1` means the setting is not specified
    pub fn from_number(value: i64) -> Result<Option<Self>> {
        match value {
            -1 => Ok(None),
            0 => Ok(Some(Self::Disabled)),
            1 => Ok(Some(Self::Minor)),
            2 => Ok(Some(Self::Major)),
            _ => Err(Error::invalid_value(
                ROLL_FORWARD_ON_NO_CANDIDATE_FX,
                value.to_string(),
            )),
        }
    }

    /// Parse from text, as given on the command line or in the environment
    pub fn parse(value: &str) -> Result<Option<Self>> {
        let number: i64 = value
            .trim()
            .parse()
            .map_err(|_| Error::invalid_value(ROLL_FORWARD_ON_NO_CANDIDATE_FX, value))?;
        Self::from_number(number)
    }

    pub fn as_number(&self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::Minor => 1,
            Self::Major => 2,
        }
    }
}

/// The policy the matcher actually runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectivePolicy {
    /// Exact match only
    Disable,
    /// Legacy `(0, applyPatches=false)`: exact major.minor.patch; only the
    /// pre-release label may roll
    PreReleaseOnly,
    LatestPatch,
    #[default]
    Minor,
    /// Legacy `(1, applyPatches=false)`: nearest higher version in the major
    MinorNearestPatch,
    LatestMinor,
    Major,
    /// Legacy `(2, applyPatches=false)`: nearest higher version of any major
    MajorNearestPatch,
    LatestMajor,
}

impl EffectivePolicy {
    pub fn from_setting(setting: RollForwardSetting) -> Self {
        Self::compose(setting, true)
    }

    /// Translate the legacy pair; missing values take the legacy defaults
    /// (`rollForwardOnNoCandidateFx=1`, `applyPatches=true`)
    pub fn from_legacy(
        on_no_candidate: Option<RollForwardOnNoCandidateFx>,
        apply_patches: Option<bool>,
    ) -> Self {
        let level = match on_no_candidate.unwrap_or_default() {
            RollForwardOnNoCandidateFx::Disabled => RollForwardSetting::LatestPatch,
            RollForwardOnNoCandidateFx::Minor => RollForwardSetting::Minor,
            RollForwardOnNoCandidateFx::Major => RollForwardSetting::Major,
        };
        Self::compose(level, apply_patches.unwrap_or(true))
    }

    /// Build a policy from its roll level and whether patches roll to latest
    pub fn compose(level: RollForwardSetting, apply_patches: bool) -> Self {
        match (level, apply_patches) {
            (RollForwardSetting::Disable, _) => Self::Disable,
            (RollForwardSetting::LatestPatch, true) => Self::LatestPatch,
            (RollForwardSetting::LatestPatch, false) => Self::PreReleaseOnly,
            (RollForwardSetting::Minor, true) => Self::Minor,
            (RollForwardSetting::Minor, false) => Self::MinorNearestPatch,
            (RollForwardSetting::LatestMinor, _) => Self::LatestMinor,
            (RollForwardSetting::Major, true) => Self::Major,
            (RollForwardSetting::Major, false) => Self::MajorNearestPatch,
            (RollForwardSetting::LatestMajor, _) => Self::LatestMajor,
        }
    }

    /// The roll level and patch flag this policy is made of
    pub fn decompose(&self) -> (RollForwardSetting, bool) {
        match self {
            Self::Disable => (RollForwardSetting::Disable, true),
            Self::PreReleaseOnly => (RollForwardSetting::LatestPatch, false),
            Self::LatestPatch => (RollForwardSetting::LatestPatch, true),
            Self::Minor => (RollForwardSetting::Minor, true),
            Self::MinorNearestPatch => (RollForwardSetting::Minor, false),
            Self::LatestMinor => (RollForwardSetting::LatestMinor, true),
            Self::Major => (RollForwardSetting::Major, true),
            Self::MajorNearestPatch => (RollForwardSetting::Major, false),
            Self::LatestMajor => (RollForwardSetting::LatestMajor, true),
        }
    }

    pub fn level(&self) -> RollForwardSetting {
        self.decompose().0
    }

    pub fn applies_patches(&self) -> bool {
        self.decompose().1
    }

    /// Combine two policies into the more restrictive one
    ///
    /// The lower roll level wins and patch rolling survives only if both
    /// allow it. Use `MergedPolicy` when folding more than two policies.
    pub fn merge(self, other: Self) -> Self {
        MergedPolicy::new(self).merge(other).policy()
    }

    /// Whether a reference to `lower` under this policy accepts `higher`
    ///
    /// Only the distance between the two versions is checked; the caller
    /// guarantees `lower <= higher`.
    pub fn is_compatible_with_higher(
        &self,
        lower: &FrameworkVersion,
        higher: &FrameworkVersion,
    ) -> bool {
        if lower == higher {
            return true;
        }

        let (level, apply_patches) = self.decompose();
        if level == RollForwardSetting::Disable {
            return false;
        }

        if !lower.same_major(higher) {
            level >= RollForwardSetting::Major
        } else if !lower.same_minor(higher) {
            level >= RollForwardSetting::Minor
        } else if !lower.same_patch(higher) {
            !(level == RollForwardSetting::LatestPatch && !apply_patches)
        } else {
            // Only the pre-release label differs
            true
        }
    }
}

/// Running merge of several policies
///
/// `LatestMinor` and `LatestMajor` ignore `applyPatches`, so composing them
/// forgets a `false` flag. The flag is kept here so that merging a third
/// policy gives the same answer whatever order the policies arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedPolicy {
    level: RollForwardSetting,
    apply_patches: bool,
}

impl MergedPolicy {
    pub fn new(policy: EffectivePolicy) -> Self {
        let (level, apply_patches) = policy.decompose();
        Self {
            level,
            apply_patches,
        }
    }

    pub fn merge(self, policy: EffectivePolicy) -> Self {
        let (level, apply_patches) = policy.decompose();
        Self {
            level: self.level.min(level),
            apply_patches: self.apply_patches && apply_patches,
        }
    }

    pub fn policy(&self) -> EffectivePolicy {
        EffectivePolicy::compose(self.level, self.apply_patches)
    }
}

impl From<RollForwardSetting> for EffectivePolicy {
    fn from(setting: RollForwardSetting) -> Self {
        Self::from_setting(setting)
    }
}

impl fmt::Display for EffectivePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (level, apply_patches) = self.decompose();
        if apply_patches {
            write!(f, "{level}")
        } else {
            write!(f, "{level}, {APPLY_PATCHES}=false")
        }
    }
}
