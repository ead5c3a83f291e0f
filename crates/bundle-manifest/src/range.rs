//! OSGi version ranges.
//!
//! Two syntaxes are accepted:
//!
//! - a bare version, meaning "this version or any later one" (`1.0`)
//! - an interval with inclusive `[ ]` or exclusive `( )` bounds
//!   (`[1.0,2.0)`); an empty upper endpoint (`[1.0,)`) is unbounded
//!
//! ```
//! use bundle_manifest::{Version, VersionRange};
//!
//! let range = VersionRange::parse("[1.0,2.0)").unwrap();
//! assert!(range.contains(&Version::new(1, 0, 0)));
//! assert!(range.contains(&Version::new(1, 9, 9)));
//! assert!(!range.contains(&Version::new(2, 0, 0)));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clause::unquote;
use crate::error::{Error, Result};
use crate::version::Version;

/// The upper end of a [`VersionRange`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UpperBound {
    /// No upper limit.
    Unbounded,
    /// Versions up to and including this one.
    Inclusive(Version),
    /// Versions strictly below this one.
    Exclusive(Version),
}

/// A set of acceptable versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    lower: Version,
    lower_inclusive: bool,
    upper: UpperBound,
}

impl VersionRange {
    /// `>= 0.0.0`, the range of an import without a version attribute.
    pub const ANY: VersionRange = VersionRange::at_least(Version::ZERO);

    /// Every version greater than or equal to `lower`.
    pub const fn at_least(lower: Version) -> Self {
        Self {
            lower,
            lower_inclusive: true,
            upper: UpperBound::Unbounded,
        }
    }

    /// Exactly `version`, i.e. `[version,version]`.
    pub fn exact(version: Version) -> Self {
        Self {
            lower: version.clone(),
            lower_inclusive: true,
            upper: UpperBound::Inclusive(version),
        }
    }

    /// Build an interval, checking that the lower endpoint does not exceed
    /// the upper one.
    pub fn interval(lower: Version, lower_inclusive: bool, upper: UpperBound) -> Result<Self> {
        let upper_version = match &upper {
            UpperBound::Unbounded => None,
            UpperBound::Inclusive(v) | UpperBound::Exclusive(v) => Some(v),
        };
        if let Some(upper_version) = upper_version {
            if &lower > upper_version {
                return Err(Error::version(
                    &format!("{lower},{upper_version}"),
                    "lower bound is greater than upper bound",
                ));
            }
        }
        Ok(Self {
            lower,
            lower_inclusive,
            upper,
        })
    }

    /// Parse a range expression.
    pub fn parse(input: &str) -> Result<Self> {
        let text = unquote(input.trim());
        let Some(open) = text.chars().next() else {
            return Err(Error::version(input, "empty version range"));
        };

        if open != '[' && open != '(' {
            if text.starts_with([']', ')']) || text.ends_with([']', ')', '[', '(']) {
                return Err(Error::version(input, "mismatched range delimiters"));
            }
            return Version::parse(text)
                .map(Self::at_least)
                .map_err(|e| relabel(e, input));
        }

        let close = text.chars().last().unwrap_or(open);
        if text.len() < 2 || !matches!(close, ']' | ')') {
            return Err(Error::version(input, "mismatched range delimiters"));
        }

        let inner = &text[1..text.len() - 1];
        let Some((lower, upper)) = inner.split_once(',') else {
            return Err(Error::version(input, "interval requires two endpoints"));
        };
        if upper.contains(',') {
            return Err(Error::version(input, "interval has more than two endpoints"));
        }

        let lower = Version::parse(lower).map_err(|e| relabel(e, input))?;
        let upper = upper.trim();
        let upper = if upper.is_empty() {
            if close == ']' {
                return Err(Error::version(input, "an unbounded upper end must use ')'"));
            }
            UpperBound::Unbounded
        } else {
            let version = Version::parse(upper).map_err(|e| relabel(e, input))?;
            if close == ']' {
                UpperBound::Inclusive(version)
            } else {
                UpperBound::Exclusive(version)
            }
        };

        Self::interval(lower, open == '[', upper).map_err(|e| relabel(e, input))
    }

    /// Whether `version` lies within this range.
    pub fn contains(&self, version: &Version) -> bool {
        let above_lower = if self.lower_inclusive {
            version >= &self.lower
        } else {
            version > &self.lower
        };
        above_lower
            && match &self.upper {
                UpperBound::Unbounded => true,
                UpperBound::Inclusive(upper) => version <= upper,
                UpperBound::Exclusive(upper) => version < upper,
            }
    }

    pub fn lower(&self) -> &Version {
        &self.lower
    }

    pub fn is_lower_inclusive(&self) -> bool {
        self.lower_inclusive
    }

    pub fn upper(&self) -> &UpperBound {
        &self.upper
    }

    /// Whether this is the unconstrained `>= 0.0.0` range.
    pub fn is_any(&self) -> bool {
        self == &Self::ANY
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::ANY
    }
}

/// Report errors against the whole range text rather than one endpoint.
fn relabel(err: Error, input: &str) -> Error {
    match err {
        Error::MalformedVersion { reason, .. } => Error::version(input, reason),
        other => other,
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.upper, self.lower_inclusive) {
            (UpperBound::Unbounded, true) => write!(f, "{}", self.lower),
            (UpperBound::Unbounded, false) => write!(f, "({},)", self.lower),
            (UpperBound::Inclusive(upper), inclusive) => write!(
                f,
                "{}{},{}]",
                if inclusive { '[' } else { '(' },
                self.lower,
                upper
            ),
            (UpperBound::Exclusive(upper), inclusive) => write!(
                f,
                "{}{},{})",
                if inclusive { '[' } else { '(' },
                self.lower,
                upper
            ),
        }
    }
}

impl FromStr for VersionRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
