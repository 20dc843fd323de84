//! Release version parsing and ordering.
//!
//! Release tags follow `v?MAJOR.MINOR.PATCH(-PRE)?`. Ordering is numeric on the
//! `(major, minor, patch)` triple. A final release outranks any pre-release of
//! the same triple, and two pre-release strings compare lexicographically, so
//! `rc.10` sorts before `rc.2`.

use crate::core::GhexError;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)(?:-(.+))?$").expect("version pattern is valid")
});

/// A parsed release version.
///
/// Equality and ordering only look at the four components. The leading `v`
/// of a tag is not kept, so `v1.0.0` and `1.0.0` are equal.
///
/// ```rust
/// use ghex_cli::upgrade::Version;
///
/// let v = Version::parse("v1.2.3-rc.1").unwrap();
/// assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
/// assert_eq!(v.pre, "rc.1");
/// assert_eq!(v.to_string(), "1.2.3-rc.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
    /// Pre-release suffix without the `-`, empty for final releases
    pub pre: String,
}

impl Version {
    /// Parse a version string, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`GhexError::InvalidVersion`] when the input does not match
    /// `v?MAJOR.MINOR.PATCH(-PRE)?` or a component overflows `u64`.
    pub fn parse(input: &str) -> Result<Self, GhexError> {
        let invalid = || GhexError::InvalidVersion {
            version: input.to_string(),
        };

        let caps = VERSION_RE.captures(input.trim()).ok_or_else(invalid)?;
        let number = |idx: usize| caps[idx].parse::<u64>().map_err(|_| invalid());

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            pre: caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default(),
        })
    }

    /// Whether this is a pre-release (non-empty suffix).
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Compare two versions.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }

    /// `true` when `self` is strictly greater than `other`.
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = GhexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse and compare two version strings in one step.
///
/// # Errors
///
/// Returns [`GhexError::InvalidVersion`] for whichever side fails to parse first.
pub fn compare_version_strings(a: &str, b: &str) -> Result<Ordering, GhexError> {
    Ok(Version::parse(a)?.compare(&Version::parse(b)?))
}
