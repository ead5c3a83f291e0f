//! Ambiguity strategies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How to choose among several providers that all satisfy a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementStrategy {
    /// Take the provider listed first in the repository.
    First,
    /// Refuse to guess: several providers is an error.
    #[default]
    NoAmbiguity,
    /// Keep every provider and let the downstream engine settle conflicts.
    All,
}

impl RequirementStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementStrategy::First => "first",
            RequirementStrategy::NoAmbiguity => "noambiguity",
            RequirementStrategy::All => "all",
        }
    }
}

impl fmt::Display for RequirementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(RequirementStrategy::First),
            "noambiguity" => Ok(RequirementStrategy::NoAmbiguity),
            "all" => Ok(RequirementStrategy::All),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}
