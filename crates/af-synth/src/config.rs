//! Synthesis configuration.

use std::path::Path;

use af_core::AccessLevel;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a configured prefix must be followed for it to match a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixCase {
    /// A prefix ending in a letter only matches when the next char is not lowercase
    /// (`fName` matches `f`, `fname` does not).
    #[default]
    Strict,
    /// Any prefix followed by at least one char matches.
    Relaxed,
}

/// Rules for deriving accessor names from field names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingPolicy {
    /// Prefixes stripped from field names, tried in order. Empty means "use the name as-is";
    /// when non-empty, a field matching none of them gets no accessor.
    pub prefixes: Vec<String>,
    pub case_rule: PrefixCase,
    /// Name accessors after the field itself (`count()` instead of `getCount()`).
    pub fluent: bool,
}

/// Configuration for the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub naming: NamingPolicy,
    /// Level used by requests that do not state one.
    pub default_level: AccessLevel,
}

impl SynthConfig {
    /// Fluent accessor names.
    #[must_use]
    pub fn fluent() -> Self {
        Self {
            naming: NamingPolicy {
                fluent: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Strip the given prefixes; fields matching none of them are skipped.
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            naming: NamingPolicy {
                prefixes: prefixes.into_iter().map(Into::into).collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse from a JSON document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
