//! OAuth provider defaults
//!
//! Built-in configuration for the OAuth provider family. Providers with well
//! known endpoints ship them; the rest leave the URLs empty.

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::BoxError;
use crate::fallback::{FallbackStrategy, ProviderOverrides, apply_overrides};
use crate::models::{SettingValue, Settings};
use crate::providers;

/// Endpoints and scopes that differ between OAuth providers.
struct Endpoints {
    scopes: &'static str,
    auth_url: &'static str,
    token_url: &'static str,
    api_url: &'static str,
}

fn endpoints(provider: &str) -> Endpoints {
    match provider {
        providers::GITHUB => Endpoints {
            scopes: "user:email,read:org",
            auth_url: "https://github.com/login/oauth/authorize",
            token_url: "https://github.com/login/oauth/access_token",
            api_url: "https://api.github.com/user",
        },
        providers::GITLAB => Endpoints {
            scopes: "openid email profile",
            auth_url: "https://gitlab.com/oauth/authorize",
            token_url: "https://gitlab.com/oauth/token",
            api_url: "https://gitlab.com/api/v4",
        },
        providers::GOOGLE => Endpoints {
            scopes: "openid email profile",
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            api_url: "https://openidconnect.googleapis.com/v1/userinfo",
        },
        providers::GRAFANA_COM => Endpoints {
            scopes: "user:email",
            auth_url: "https://grafana.com/oauth2/authorize",
            token_url: "https://grafana.com/api/oauth2/token",
            api_url: "https://grafana.com/api/oauth2/user",
        },
        providers::AZURE_AD => Endpoints {
            scopes: "openid email profile",
            auth_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            api_url: "",
        },
        providers::OKTA => Endpoints {
            scopes: "openid profile email groups",
            auth_url: "",
            token_url: "",
            api_url: "",
        },
        _ => Endpoints {
            scopes: "user:email",
            auth_url: "",
            token_url: "",
            api_url: "",
        },
    }
}

/// Fallback strategy for every provider in [`providers::OAUTH_PROVIDERS`].
#[derive(Debug, Clone, Default)]
pub struct OAuthStrategy {
    overrides: ProviderOverrides,
}

impl OAuthStrategy {
    pub fn new(overrides: ProviderOverrides) -> Self {
        Self { overrides }
    }

    /// Default settings before overrides are applied.
    pub fn defaults(provider: &str) -> Settings {
        let endpoints = endpoints(provider);
        let text = |value: &str| SettingValue::from(value);

        Settings::from([
            ("name".to_string(), SettingValue::from(providers::label(provider))),
            ("enabled".to_string(), SettingValue::Bool(false)),
            ("allow_sign_up".to_string(), SettingValue::Bool(true)),
            ("auto_login".to_string(), SettingValue::Bool(false)),
            ("client_id".to_string(), text("")),
            ("client_secret".to_string(), text("")),
            ("scopes".to_string(), text(endpoints.scopes)),
            ("auth_url".to_string(), text(endpoints.auth_url)),
            ("token_url".to_string(), text(endpoints.token_url)),
            ("api_url".to_string(), text(endpoints.api_url)),
            ("jwk_set_url".to_string(), text("")),
            ("signout_redirect_url".to_string(), text("")),
            ("allowed_domains".to_string(), text("")),
            ("allowed_groups".to_string(), text("")),
            ("allowed_organizations".to_string(), text("")),
            ("team_ids".to_string(), text("")),
            ("role_attribute_path".to_string(), text("")),
            ("role_attribute_strict".to_string(), SettingValue::Bool(false)),
            ("skip_org_role_sync".to_string(), SettingValue::Bool(false)),
            (
                "use_pkce".to_string(),
                SettingValue::Bool(provider == providers::GOOGLE),
            ),
            ("use_refresh_token".to_string(), SettingValue::Bool(false)),
            ("tls_skip_verify_insecure".to_string(), SettingValue::Bool(false)),
        ])
    }
}

#[async_trait]
impl FallbackStrategy for OAuthStrategy {
    fn is_match(&self, provider: &str) -> bool {
        providers::is_oauth(provider)
    }

    async fn get_provider_config(
        &self,
        _ctx: &RequestContext,
        provider: &str,
    ) -> Result<Settings, BoxError> {
        let mut settings = Self::defaults(provider);
        apply_overrides(provider, &mut settings, self.overrides.get(provider))?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_matches_oauth_family_only() {
        let strategy = OAuthStrategy::default();
        for provider in providers::OAUTH_PROVIDERS {
            assert!(strategy.is_match(provider), "{provider} should match");
        }
        assert!(!strategy.is_match("saml"));
        assert!(!strategy.is_match("ldap"));
    }

    #[tokio::test]
    async fn test_github_defaults() {
        let strategy = OAuthStrategy::default();
        let settings = strategy
            .get_provider_config(&RequestContext::new(), "github")
            .await
            .unwrap();

        assert_eq!(settings["name"], SettingValue::from("GitHub"));
        assert_eq!(settings["enabled"], SettingValue::Bool(false));
        assert_eq!(
            settings["auth_url"],
            SettingValue::from("https://github.com/login/oauth/authorize")
        );
        assert_eq!(settings["allowed_organizations"], SettingValue::from(""));
    }

    #[tokio::test]
    async fn test_overrides_are_applied_per_provider() {
        let overrides = ProviderOverrides::from([(
            "okta".to_string(),
            BTreeMap::from([
                ("enabled".to_string(), "true".to_string()),
                ("auth_url".to_string(), "https://okta.example/authorize".to_string()),
            ]),
        )]);
        let strategy = OAuthStrategy::new(overrides);
        let ctx = RequestContext::new();

        let okta = strategy.get_provider_config(&ctx, "okta").await.unwrap();
        assert_eq!(okta["enabled"], SettingValue::Bool(true));
        assert_eq!(
            okta["auth_url"],
            SettingValue::from("https://okta.example/authorize")
        );

        let github = strategy.get_provider_config(&ctx, "github").await.unwrap();
        assert_eq!(github["enabled"], SettingValue::Bool(false));
    }

    #[tokio::test]
    async fn test_bad_override_is_an_error() {
        let overrides = ProviderOverrides::from([(
            "gitlab".to_string(),
            BTreeMap::from([("allow_sign_up".to_string(), "sometimes".to_string())]),
        )]);
        let strategy = OAuthStrategy::new(overrides);

        let err = strategy
            .get_provider_config(&RequestContext::new(), "gitlab")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("allow_sign_up"));
    }
}
