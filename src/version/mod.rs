// src/version/mod.rs

//! Framework version parsing and ordering
//!
//! Framework versions use the `major.minor.patch[-prerelease][+build]` form.
//! Ordering follows semantic versioning precedence:
//! - numeric major/minor/patch ascending
//! - a release (no pre-release label) is greater than any pre-release of the
//!   same major.minor.patch
//! - pre-release labels compare dot-separated segment by segment, numeric
//!   segments numerically and other segments ordinally
//!
//! Build metadata is kept for display but never affects equality or ordering.

use crate::error::{Error, Result};
use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// An immutable framework version
#[derive(Debug, Clone)]
pub struct FrameworkVersion {
    inner: Version,
}

impl FrameworkVersion {
    /// Create a release version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            inner: Version::new(major, minor, patch),
        }
    }

    /// Parse a version string
    ///
    /// Examples:
    /// - "5.1.3" → release 5.1.3
    /// - "5.1.3-preview.2" → pre-release 5.1.3 labelled "preview.2"
    /// - "5.1.3+abc" → release 5.1.3 (build metadata ignored for comparison)
    pub fn parse(s: &str) -> Result<Self> {
        let inner = Version::parse(s.trim()).map_err(|_| Error::InvalidVersion(s.to_string()))?;
        Ok(Self { inner })
    }

    pub fn major(&self) -> u64 {
        self.inner.major
    }

    pub fn minor(&self) -> u64 {
        self.inner.minor
    }

    pub fn patch(&self) -> u64 {
        self.inner.patch
    }

    /// The pre-release label, if any (without the leading '-')
    pub fn pre_release(&self) -> Option<&str> {
        if self.inner.pre.is_empty() {
            None
        } else {
            Some(self.inner.pre.as_str())
        }
    }

    pub fn is_prerelease(&self) -> bool {
        !self.inner.pre.is_empty()
    }

    /// Same major version
    pub fn same_major(&self, other: &Self) -> bool {
        self.major() == other.major()
    }

    /// Same major.minor
    pub fn same_minor(&self, other: &Self) -> bool {
        self.same_major(other) && self.minor() == other.minor()
    }

    /// Same major.minor.patch, pre-release labels may differ
    pub fn same_patch(&self, other: &Self) -> bool {
        self.same_minor(other) && self.patch() == other.patch()
    }

    /// Compare two versions by precedence
    pub fn compare(&self, other: &FrameworkVersion) -> Ordering {
        self.inner
            .major
            .cmp(&other.inner.major)
            .then_with(|| self.inner.minor.cmp(&other.inner.minor))
            .then_with(|| self.inner.patch.cmp(&other.inner.patch))
            .then_with(|| self.inner.pre.cmp(&other.inner.pre))
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl FromStr for FrameworkVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialEq for FrameworkVersion {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for FrameworkVersion {}

impl Hash for FrameworkVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.major.hash(state);
        self.inner.minor.hash(state);
        self.inner.patch.hash(state);
        self.inner.pre.hash(state);
    }
}

impl Ord for FrameworkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for FrameworkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
