//! # Data Models
//!
//! Domain types describing the resolved configuration of an authentication
//! provider, plus the SeaORM entity backing the persisted settings table.

pub mod sso_setting;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::list_format::{self, ListFormatError};
use crate::providers;

/// Settings document for one provider, keyed by setting name.
pub type Settings = BTreeMap<String, SettingValue>;

/// A single setting value as it crosses the persistence/fallback boundary.
///
/// Serialized untagged so the JSON representation is the plain value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<SettingValue>),
    Map(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Null => "null",
            SettingValue::Bool(_) => "bool",
            SettingValue::Int(_) => "int",
            SettingValue::Float(_) => "float",
            SettingValue::String(_) => "string",
            SettingValue::List(_) => "array",
            SettingValue::Map(_) => "object",
        }
    }

    /// Null, the empty string and the empty list count as "not set".
    pub fn is_empty(&self) -> bool {
        match self {
            SettingValue::Null => true,
            SettingValue::String(value) => value.is_empty(),
            SettingValue::List(values) => values.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::String(value)
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<Vec<SettingValue>> for SettingValue {
    fn from(values: Vec<SettingValue>) -> Self {
        SettingValue::List(values)
    }
}

/// Provenance of a resolved settings record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsSource {
    /// A persisted row exists for the provider.
    Database,
    /// Synthesized from a fallback strategy.
    System,
}

impl fmt::Display for SettingsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsSource::Database => write!(f, "database"),
            SettingsSource::System => write!(f, "system"),
        }
    }
}

/// Resolved configuration for one authentication provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub provider: String,
    pub settings: Settings,
    pub source: SettingsSource,
}

impl ProviderSettings {
    pub fn new(provider: impl Into<String>, settings: Settings, source: SettingsSource) -> Self {
        Self {
            provider: provider.into(),
            settings,
            source,
        }
    }

    /// Record backed by a persisted row.
    pub fn database(provider: impl Into<String>, settings: Settings) -> Self {
        Self::new(provider, settings, SettingsSource::Database)
    }

    /// Record synthesized from system defaults.
    pub fn system(provider: impl Into<String>, settings: Settings) -> Self {
        Self::new(provider, settings, SettingsSource::System)
    }

    /// Human-readable provider label, e.g. "Generic OAuth".
    pub fn label(&self) -> String {
        providers::label(&self.provider)
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(key)
    }

    /// Parses a list-typed setting into its concrete form.
    ///
    /// Returns `Ok(None)` when the key is absent or empty.
    pub fn list(&self, key: &str) -> Result<Option<Vec<String>>, ListFormatError> {
        match self.settings.get(key) {
            None => Ok(None),
            Some(value) if value.is_empty() => Ok(None),
            Some(SettingValue::String(raw)) => list_format::parse(raw).map(Some),
            Some(other) => Err(ListFormatError::InvalidType {
                found: other.type_name(),
            }),
        }
    }
}
