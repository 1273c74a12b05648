//! Configuration loading for the SSO settings service.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `SSO_SETTINGS_`, producing a typed [`AppConfig`].
//!
//! Per-provider default overrides use the form
//! `SSO_SETTINGS_AUTH__<PROVIDER>__<KEY>`, e.g.
//! `SSO_SETTINGS_AUTH__GENERIC_OAUTH__AUTH_URL`.

use std::{collections::BTreeMap, env, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::fallback::ProviderOverrides;
use crate::providers;

const ENV_PREFIX: &str = "SSO_SETTINGS_";
const OVERRIDE_PREFIX: &str = "AUTH__";
const REDACTED: &str = "[REDACTED]";

/// Application configuration derived from `SSO_SETTINGS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// Provider universe, in listing order.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    /// Providers whose settings may be written.
    #[serde(default = "default_configurable_providers")]
    pub configurable_providers: Vec<String>,
    #[serde(default)]
    pub saml_enabled: bool,
    /// Whether LDAP settings are managed by the service.
    #[serde(default)]
    pub ldap_enabled: bool,
    #[serde(default = "default_docs_base_url")]
    pub docs_base_url: String,
    /// Path prefix the web UI is served under, e.g. `/grafana`.
    #[serde(default)]
    pub app_sub_url: String,
    /// System default overrides, `provider -> key -> raw value`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub auth_overrides: ProviderOverrides,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            providers: default_providers(),
            configurable_providers: default_configurable_providers(),
            saml_enabled: false,
            ldap_enabled: false,
            docs_base_url: default_docs_base_url(),
            app_sub_url: String::new(),
            auth_overrides: ProviderOverrides::new(),
        }
    }
}

impl AppConfig {
    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();

        // Redact the database password
        if let Ok(mut url) = Url::parse(&config.database_url) {
            if url.password().is_some() && url.set_password(Some(REDACTED)).is_ok() {
                config.database_url = url.to_string();
            }
        }

        // Redact secret-bearing provider overrides
        for values in config.auth_overrides.values_mut() {
            for (key, value) in values.iter_mut() {
                if key.contains("secret") || key.contains("private_key") {
                    *value = REDACTED.to_string();
                }
            }
        }

        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning an error on inconsistent settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidDbMaxConnections {
                value: self.db_max_connections,
            });
        }

        if self.providers.is_empty() {
            return Err(ConfigError::EmptyProviders);
        }

        if let Some(provider) = self
            .configurable_providers
            .iter()
            .find(|p| !self.providers.contains(p))
        {
            return Err(ConfigError::UnknownConfigurableProvider {
                provider: provider.clone(),
            });
        }

        if self.providers.iter().any(|p| p == providers::SAML) && !self.saml_enabled {
            return Err(ConfigError::SamlDisabled);
        }

        if self.providers.iter().any(|p| p == providers::LDAP) && !self.ldap_enabled {
            return Err(ConfigError::LdapDisabled);
        }

        Url::parse(&self.docs_base_url).map_err(|source| ConfigError::InvalidDocsBaseUrl {
            value: self.docs_base_url.clone(),
            source,
        })?;

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "sqlite://ssosettings.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_providers() -> Vec<String> {
    providers::default_universe(false, false)
}

fn default_configurable_providers() -> Vec<String> {
    providers::CONFIGURABLE_OAUTH_PROVIDERS
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_docs_base_url() -> String {
    "https://grafana.com/docs/grafana/latest/setup-grafana/configure-security/configure-authentication"
        .to_string()
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid boolean for {key}: '{value}'")]
    InvalidBool { key: String, value: String },
    #[error("log format must be 'json' or 'pretty', got '{value}'")]
    InvalidLogFormat { value: String },
    #[error("database max connections must be positive, got {value}")]
    InvalidDbMaxConnections { value: u32 },
    #[error("provider list is empty; set SSO_SETTINGS_PROVIDERS")]
    EmptyProviders,
    #[error("configurable provider '{provider}' is not in the provider list")]
    UnknownConfigurableProvider { provider: String },
    #[error("provider 'saml' is listed but SSO_SETTINGS_SAML_ENABLED is false")]
    SamlDisabled,
    #[error("provider 'ldap' is listed but SSO_SETTINGS_LDAP_ENABLED is false")]
    LdapDisabled,
    #[error("malformed override variable '{key}'; expected AUTH__<PROVIDER>__<KEY>")]
    InvalidOverrideKey { key: String },
    #[error("invalid docs base url '{value}': {source}")]
    InvalidDocsBaseUrl {
        value: String,
        source: url::ParseError,
    },
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Loads configuration using layered `.env` files and `SSO_SETTINGS_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads and validates configuration.
    ///
    /// Precedence, lowest first: `.env`, `.env.local`, `.env.<profile>`,
    /// `.env.<profile>.local`, process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);
        let db_max_connections = layered
            .remove("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = layered
            .remove("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);

        let saml_enabled = match layered.remove("SAML_ENABLED").filter(|v| !v.is_empty()) {
            Some(value) => parse_bool("SAML_ENABLED", &value)?,
            None => false,
        };
        let ldap_enabled = match layered.remove("LDAP_ENABLED").filter(|v| !v.is_empty()) {
            Some(value) => parse_bool("LDAP_ENABLED", &value)?,
            None => false,
        };

        let providers = layered
            .remove("PROVIDERS")
            .map(|v| parse_list(&v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| providers::default_universe(saml_enabled, ldap_enabled));

        let configurable_providers = layered
            .remove("CONFIGURABLE_PROVIDERS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|| {
                let mut configurable = default_configurable_providers();
                if saml_enabled {
                    configurable.push(providers::SAML.to_string());
                }
                if ldap_enabled {
                    configurable.push(providers::LDAP.to_string());
                }
                configurable
            });

        let docs_base_url = layered
            .remove("DOCS_BASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_docs_base_url);
        let app_sub_url = layered.remove("APP_SUB_URL").unwrap_or_default();

        let auth_overrides = collect_overrides(&layered)?;

        let config = AppConfig {
            profile,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            providers,
            configurable_providers,
            saml_enabled,
            ldap_enabled,
            docs_base_url,
            app_sub_url,
            auth_overrides,
        };

        config.validate()?;
        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{}PROFILE", ENV_PREFIX))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts `AUTH__<PROVIDER>__<KEY>` entries into lowercase provider/key pairs.
fn collect_overrides(layered: &BTreeMap<String, String>) -> Result<ProviderOverrides, ConfigError> {
    let mut overrides = ProviderOverrides::new();

    for (key, value) in layered {
        let Some(rest) = key.strip_prefix(OVERRIDE_PREFIX) else {
            continue;
        };
        let Some((provider, setting)) = rest.split_once("__") else {
            return Err(ConfigError::InvalidOverrideKey { key: key.clone() });
        };
        if provider.is_empty() || setting.is_empty() {
            return Err(ConfigError::InvalidOverrideKey { key: key.clone() });
        }

        overrides
            .entry(provider.to_ascii_lowercase())
            .or_default()
            .insert(setting.to_ascii_lowercase(), value.clone());
    }

    Ok(overrides)
}
