//! SAML provider defaults
//!
//! Only registered when SAML is licensed (`SAML_ENABLED`).

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::BoxError;
use crate::fallback::{FallbackStrategy, ProviderOverrides, apply_overrides};
use crate::models::{SettingValue, Settings};
use crate::providers;

#[derive(Debug, Clone, Default)]
pub struct SamlStrategy {
    overrides: ProviderOverrides,
}

impl SamlStrategy {
    pub fn new(overrides: ProviderOverrides) -> Self {
        Self { overrides }
    }

    pub fn defaults() -> Settings {
        let text = |value: &str| SettingValue::from(value);

        Settings::from([
            ("name".to_string(), text("SAML")),
            ("enabled".to_string(), SettingValue::Bool(false)),
            ("single_logout".to_string(), SettingValue::Bool(false)),
            ("allow_sign_up".to_string(), SettingValue::Bool(true)),
            ("auto_login".to_string(), SettingValue::Bool(false)),
            ("allow_idp_initiated".to_string(), SettingValue::Bool(false)),
            ("certificate".to_string(), text("")),
            ("certificate_path".to_string(), text("")),
            ("private_key".to_string(), text("")),
            ("private_key_path".to_string(), text("")),
            ("idp_metadata".to_string(), text("")),
            ("idp_metadata_path".to_string(), text("")),
            ("idp_metadata_url".to_string(), text("")),
            ("signature_algorithm".to_string(), text("")),
            ("max_issue_delay".to_string(), text("90s")),
            ("metadata_valid_duration".to_string(), text("48h")),
            ("relay_state".to_string(), text("")),
            (
                "name_id_format".to_string(),
                text("urn:oasis:names:tc:SAML:2.0:nameid-format:transient"),
            ),
            ("assertion_attribute_name".to_string(), text("displayName")),
            ("assertion_attribute_login".to_string(), text("mail")),
            ("assertion_attribute_email".to_string(), text("mail")),
            ("assertion_attribute_groups".to_string(), text("")),
            ("assertion_attribute_role".to_string(), text("")),
            ("assertion_attribute_org".to_string(), text("")),
            ("allowed_organizations".to_string(), text("")),
            ("role_values_none".to_string(), text("")),
            ("role_values_viewer".to_string(), text("")),
            ("role_values_editor".to_string(), text("")),
            ("role_values_admin".to_string(), text("")),
            ("role_values_grafana_admin".to_string(), text("")),
        ])
    }
}

#[async_trait]
impl FallbackStrategy for SamlStrategy {
    fn is_match(&self, provider: &str) -> bool {
        provider == providers::SAML
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
