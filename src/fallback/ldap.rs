//! LDAP provider defaults
//!
//! Registered when LDAP settings management is switched on (`LDAP_ENABLED`).
//! Server definitions live under the nested `config` map.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::BoxError;
use crate::fallback::{FallbackStrategy, ProviderOverrides, apply_overrides};
use crate::models::{SettingValue, Settings};
use crate::providers;

#[derive(Debug, Clone, Default)]
pub struct LdapStrategy {
    overrides: ProviderOverrides,
}

impl LdapStrategy {
    pub fn new(overrides: ProviderOverrides) -> Self {
        Self { overrides }
    }

    pub fn defaults() -> Settings {
        let config = BTreeMap::from([("servers".to_string(), SettingValue::List(Vec::new()))]);

        Settings::from([
            ("enabled".to_string(), SettingValue::Bool(false)),
            ("allow_sign_up".to_string(), SettingValue::Bool(true)),
            ("skip_org_role_sync".to_string(), SettingValue::Bool(false)),
            ("config".to_string(), SettingValue::Map(config)),
        ])
    }
}

#[async_trait]
impl FallbackStrategy for LdapStrategy {
    fn is_match(&self, provider: &str) -> bool {
        provider == providers::LDAP
    }

    async fn get_provider_config(
        &self,
        _ctx: &RequestContext,
        provider: &str,
    ) -> Result<Settings, BoxError> {
        let mut settings = Self::defaults();
        apply_overrides(provider, &mut settings, self.overrides.get(provider))?;
        Ok(settings)
    }
}
