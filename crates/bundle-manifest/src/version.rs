//! OSGi versions.
//!
//! A version is `major[.minor[.micro[.qualifier]]]`. Missing numeric
//! components are zero and a missing qualifier is empty. Ordering compares
//! the three numbers numerically and then the qualifier byte-wise, so
//! `1.0.0` < `1.0.0.beta` < `1.0.0.rc` < `1.0.1`.
//!
//! ```
//! use bundle_manifest::Version;
//!
//! let v: Version = "2.1".parse().unwrap();
//! assert_eq!(v, Version::new(2, 1, 0));
//! assert_eq!(v.to_string(), "2.1.0");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clause::unquote;
use crate::error::{Error, Result};

/// A parsed OSGi version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Version {
    major: u64,
    minor: u64,
    micro: u64,
    qualifier: String,
}

impl Version {
    /// The `0.0.0` version every absent version attribute defaults to.
    pub const ZERO: Version = Version::new(0, 0, 0);

    /// Create a version without a qualifier.
    pub const fn new(major: u64, minor: u64, micro: u64) -> Self {
        Self {
            major,
            minor,
            micro,
            qualifier: String::new(),
        }
    }

    /// Return a copy of this version carrying `qualifier`.
    ///
    /// The qualifier is not validated here; use [`Version::parse`] for
    /// untrusted input.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    /// Parse a version string.
    ///
    /// Leading/trailing whitespace and one pair of surrounding double quotes
    /// are ignored.
    pub fn parse(input: &str) -> Result<Self> {
        let text = unquote(input.trim());
        if text.is_empty() {
            return Err(Error::version(input, "empty version"));
        }

        let mut parts = text.splitn(4, '.');
        let major = parse_component(input, parts.next())?;
        let minor = parts
            .next()
            .map(|p| parse_component(input, Some(p)))
            .transpose()?
            .unwrap_or(0);
        let micro = parts
            .next()
            .map(|p| parse_component(input, Some(p)))
            .transpose()?
            .unwrap_or(0);
        let qualifier = match parts.next() {
            Some(q) => {
                if q.is_empty() {
                    return Err(Error::version(input, "empty qualifier"));
                }
                if let Some(bad) = q
                    .chars()
                    .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
                {
                    return Err(Error::version(
                        input,
                        format!("invalid character {bad:?} in qualifier"),
                    ));
                }
                q.to_string()
            }
            None => String::new(),
        };

        Ok(Self {
            major,
            minor,
            micro,
            qualifier,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn micro(&self) -> u64 {
        self.micro
    }

    /// The qualifier, empty when none was given.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

fn parse_component(input: &str, part: Option<&str>) -> Result<u64> {
    let part = part.unwrap_or_default();
    if part.is_empty() {
        return Err(Error::version(input, "empty numeric component"));
    }
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::version(
            input,
            format!("non-numeric component '{part}'"),
        ));
    }
    part.parse::<u64>()
        .map_err(|_| Error::version(input, format!("component '{part}' is too large")))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.micro.cmp(&other.micro))
            .then_with(|| self.qualifier.as_bytes().cmp(other.qualifier.as_bytes()))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
        if !self.qualifier.is_empty() {
            write!(f, ".{}", self.qualifier)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
