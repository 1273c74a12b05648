//! # SSO Settings Service
//!
//! Resolves the effective settings of authentication providers.
//!
//! A persisted record always wins and is tagged
//! [`SettingsSource::Database`](crate::models::SettingsSource::Database);
//! system defaults from the matching [`FallbackStrategy`] fill the gaps.
//! Providers without a persisted record are synthesized entirely from their
//! strategy and tagged `System`.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::access::{AccessFilter, PermissionEvaluator, Requester, ScopeEvaluator};
use crate::config::AppConfig;
use crate::context::RequestContext;
use crate::error::SsoSettingsError;
use crate::fallback::{FallbackStrategy, LdapStrategy, OAuthStrategy, SamlStrategy, find_strategy};
use crate::list_format::LIST_KEYS;
use crate::models::{ProviderSettings, Settings};
use crate::repositories::Store;

/// URL keys that take the system value when persisted empty.
const URL_KEYS: [&str; 5] = [
    "auth_url",
    "token_url",
    "api_url",
    "jwk_set_url",
    "signout_redirect_url",
];

/// Keys of which at most one source may be configured.
const EXCLUSIVE_GROUPS: [&[&str]; 3] = [
    &["certificate", "certificate_path"],
    &["private_key", "private_key_path"],
    &["idp_metadata", "idp_metadata_path", "idp_metadata_url"],
];

/// Provider universe handed to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Providers every listing covers, in listing order.
    pub providers: Vec<String>,
    /// Providers whose settings may be written.
    pub configurable_providers: Vec<String>,
}

impl ServiceOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            providers: config.providers.clone(),
            configurable_providers: config.configurable_providers.clone(),
        }
    }

    pub fn is_configurable(&self, provider: &str) -> bool {
        self.configurable_providers.iter().any(|p| p == provider)
    }
}

/// Resolver and admin entry point for provider settings.
pub struct SsoSettingsService {
    store: Arc<dyn Store>,
    strategies: Vec<Arc<dyn FallbackStrategy>>,
    access: AccessFilter,
    options: ServiceOptions,
}

impl SsoSettingsService {
    pub fn new(
        store: Arc<dyn Store>,
        strategies: Vec<Arc<dyn FallbackStrategy>>,
        evaluator: Arc<dyn PermissionEvaluator>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            store,
            strategies,
            access: AccessFilter::new(evaluator),
            options,
        }
    }

    /// Wires the built-in strategies and the scope evaluator from configuration.
    ///
    /// The SAML and LDAP strategies are only registered when their flags are on.
    pub fn from_config(config: &AppConfig, store: Arc<dyn Store>) -> Self {
        let mut strategies: Vec<Arc<dyn FallbackStrategy>> =
            vec![Arc::new(OAuthStrategy::new(config.auth_overrides.clone()))];
        if config.saml_enabled {
            strategies.push(Arc::new(SamlStrategy::new(config.auth_overrides.clone())));
        }
        if config.ldap_enabled {
            strategies.push(Arc::new(LdapStrategy::new(config.auth_overrides.clone())));
        }

        Self::new(
            store,
            strategies,
            Arc::new(ScopeEvaluator),
            ServiceOptions::from_config(config),
        )
    }

    /// Returns the effective settings of one provider.
    ///
    /// # Errors
    ///
    /// * [`SsoSettingsError::NoFallbackStrategy`] when nothing is persisted and
    ///   no strategy handles the provider
    /// * [`SsoSettingsError::Store`] / [`SsoSettingsError::Fallback`] when a
    ///   collaborator fails
    pub async fn get_for_provider(
        &self,
        ctx: &RequestContext,
        provider: &str,
    ) -> Result<ProviderSettings, SsoSettingsError> {
        match ctx.run(self.store.get(ctx, provider)).await? {
            Ok(mut record) => {
                record.settings = self
                    .merge_system_defaults(ctx, &record.provider, record.settings)
                    .await?;
                debug!(provider, source = %record.source, "Resolved SSO settings");
                Ok(record)
            }
            Err(err) if err.is_not_found() => {
                let record = self.system_settings(ctx, provider).await?;
                debug!(provider, source = %record.source, "Resolved SSO settings");
                Ok(record)
            }
            Err(err) => Err(SsoSettingsError::store("get", provider, err)),
        }
    }

    /// Lists the settings of every provider the requester may read.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        requester: &Requester,
    ) -> Result<Vec<ProviderSettings>, SsoSettingsError> {
        let records = self.list_all(ctx).await?;
        let total = records.len();
        let allowed = self.access.filter(ctx, records, requester).await?;
        debug!(
            requester = %requester.id,
            total,
            allowed = allowed.len(),
            "Filtered SSO settings listing"
        );
        Ok(allowed)
    }

    /// Lists persisted records followed by system records for every provider
    /// of the universe that has none.
    ///
    /// All-or-nothing: any fallback error fails the call.
    pub async fn list_all(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<ProviderSettings>, SsoSettingsError> {
        let persisted = ctx
            .run(self.store.list(ctx))
            .await?
            .map_err(|err| SsoSettingsError::store("list", "*", err))?;

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(persisted.len().max(self.options.providers.len()));

        for mut record in persisted {
            if !seen.insert(record.provider.clone()) {
                continue;
            }
            record.settings = self
                .merge_system_defaults(ctx, &record.provider, record.settings)
                .await?;
            records.push(record);
        }

        for provider in &self.options.providers {
            if seen.insert(provider.clone()) {
                records.push(self.system_settings(ctx, provider).await?);
            }
        }

        Ok(records)
    }

    /// Persists the full settings document of a configurable provider.
    pub async fn upsert(
        &self,
        ctx: &RequestContext,
        provider: &str,
        settings: Settings,
    ) -> Result<(), SsoSettingsError> {
        self.ensure_configurable(provider)?;

        let record = ProviderSettings::database(provider, settings);
        validate_list_keys(&record)?;

        ctx.run(self.store.upsert(ctx, &record))
            .await?
            .map_err(|err| SsoSettingsError::store("upsert", provider, err))?;

        info!(provider, "Saved SSO settings");
        Ok(())
    }

    /// Overlays `partial` on the current effective settings and persists the result.
    pub async fn patch(
        &self,
        ctx: &RequestContext,
        provider: &str,
        partial: Settings,
    ) -> Result<(), SsoSettingsError> {
        self.ensure_configurable(provider)?;

        let mut current = self.get_for_provider(ctx, provider).await?;
        current.settings.extend(partial);

        self.upsert(ctx, provider, current.settings).await
    }

    /// Removes the persisted record so the provider falls back to system defaults.
    pub async fn delete(&self, ctx: &RequestContext, provider: &str) -> Result<(), SsoSettingsError> {
        self.ensure_configurable(provider)?;

        match ctx.run(self.store.delete(ctx, provider)).await? {
            Ok(()) => {
                info!(provider, "Removed SSO settings");
                Ok(())
            }
            Err(err) if err.is_not_found() => Err(SsoSettingsError::NotFound {
                provider: provider.to_string(),
            }),
            Err(err) => Err(SsoSettingsError::store("delete", provider, err)),
        }
    }

    fn ensure_configurable(&self, provider: &str) -> Result<(), SsoSettingsError> {
        if self.options.is_configurable(provider) {
            Ok(())
        } else {
            Err(SsoSettingsError::NotConfigurable {
                provider: provider.to_string(),
            })
        }
    }

    async fn system_settings(
        &self,
        ctx: &RequestContext,
        provider: &str,
    ) -> Result<ProviderSettings, SsoSettingsError> {
        let strategy = find_strategy(&self.strategies, provider).ok_or_else(|| {
            SsoSettingsError::NoFallbackStrategy {
                provider: provider.to_string(),
            }
        })?;

        let settings = ctx
            .run(strategy.get_provider_config(ctx, provider))
            .await?
            .map_err(|source| SsoSettingsError::Fallback {
                provider: provider.to_string(),
                source,
            })?;

        Ok(ProviderSettings::system(provider, settings))
    }

    async fn merge_system_defaults(
        &self,
        ctx: &RequestContext,
        provider: &str,
        persisted: Settings,
    ) -> Result<Settings, SsoSettingsError> {
        let Some(strategy) = find_strategy(&self.strategies, provider) else {
            return Ok(persisted);
        };

        let system = ctx
            .run(strategy.get_provider_config(ctx, provider))
            .await?
            .map_err(|source| SsoSettingsError::Fallback {
                provider: provider.to_string(),
                source,
            })?;

        Ok(merge_settings(persisted, system))
    }
}

/// Fills `persisted` with keys from `system` without overriding what is set.
///
/// A persisted key of an exclusive group claims the whole group, even when
/// its value is empty.
pub fn merge_settings(mut persisted: Settings, system: Settings) -> Settings {
    let claimed: Vec<&[&str]> = EXCLUSIVE_GROUPS
        .iter()
        .copied()
        .filter(|group| group.iter().any(|key| persisted.contains_key(*key)))
        .collect();

    for (key, value) in system {
        if claimed.iter().any(|group| group.contains(&key.as_str())) {
            continue;
        }

        let take_system = match persisted.get(&key) {
            None => true,
            Some(current) => URL_KEYS.contains(&key.as_str()) && current.is_empty(),
        };
        if take_system {
            persisted.insert(key, value);
        }
    }

    persisted
}

fn validate_list_keys(record: &ProviderSettings) -> Result<(), SsoSettingsError> {
    for key in LIST_KEYS {
        record
            .list(key)
            .map_err(|err| SsoSettingsError::invalid_list(&record.provider, key, err))?;
    }
    Ok(())
}
