//! # Fallback Strategies
//!
//! System-default configuration for providers that have no persisted record.
//! Each strategy covers one provider family; the settings service picks the
//! single strategy whose [`FallbackStrategy::is_match`] accepts the provider.

pub mod ldap;
pub mod oauth;
pub mod saml;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::BoxError;
use crate::models::{SettingValue, Settings};

pub use ldap::LdapStrategy;
pub use oauth::OAuthStrategy;
pub use saml::SamlStrategy;

/// Raw per-provider default overrides, `provider -> key -> value`.
pub type ProviderOverrides = BTreeMap<String, BTreeMap<String, String>>;

/// Supplies the system-default configuration for a family of providers.
#[async_trait]
pub trait FallbackStrategy: Send + Sync {
    /// Whether this strategy handles the provider identifier.
    fn is_match(&self, provider: &str) -> bool;

    /// Builds the default settings map for `provider`.
    async fn get_provider_config(
        &self,
        ctx: &RequestContext,
        provider: &str,
    ) -> Result<Settings, BoxError>;
}

/// Error raised when a configured override cannot take the type of its default.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("override '{key}' for provider '{provider}' must be {expected}, got '{value}'")]
pub struct InvalidOverride {
    pub provider: String,
    pub key: String,
    pub expected: &'static str,
    pub value: String,
}

/// Returns the first strategy matching `provider`.
pub fn find_strategy<'a>(
    strategies: &'a [Arc<dyn FallbackStrategy>],
    provider: &str,
) -> Option<&'a Arc<dyn FallbackStrategy>> {
    strategies.iter().find(|strategy| strategy.is_match(provider))
}

/// Applies overrides on top of `defaults`.
///
/// An override takes the type of the default it replaces; keys without a
/// default are stored as strings.
pub fn apply_overrides(
    provider: &str,
    defaults: &mut Settings,
    overrides: Option<&BTreeMap<String, String>>,
) -> Result<(), InvalidOverride> {
    let Some(overrides) = overrides else {
        return Ok(());
    };

    for (key, raw) in overrides {
        let invalid = |expected: &'static str| InvalidOverride {
            provider: provider.to_string(),
            key: key.clone(),
            expected,
            value: raw.clone(),
        };

        let value = match defaults.get(key) {
            Some(SettingValue::Bool(_)) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => SettingValue::Bool(true),
                "false" | "0" | "no" | "off" => SettingValue::Bool(false),
                _ => return Err(invalid("a boolean")),
            },
            Some(SettingValue::Int(_)) => raw
                .trim()
                .parse::<i64>()
                .map(SettingValue::Int)
                .map_err(|_| invalid("an integer"))?,
            _ => SettingValue::String(raw.clone()),
        };
        defaults.insert(key.clone(), value);
    }

    Ok(())
}
