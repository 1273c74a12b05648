//! Integration tests for SsoSettingsService resolution, listing and admin writes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use ssosettings::access::{ACTION_SETTINGS_READ, Requester};
use ssosettings::config::AppConfig;
use ssosettings::context::RequestContext;
use ssosettings::error::SsoSettingsError;
use ssosettings::fallback::{
    FallbackStrategy, LdapStrategy, OAuthStrategy, ProviderOverrides, SamlStrategy,
};
use ssosettings::models::{SettingValue, Settings, SettingsSource};
use ssosettings::providers::{OAUTH_PROVIDERS, default_universe};
use ssosettings::repositories::{InMemoryStore, Store};
use ssosettings::service::{ServiceOptions, SsoSettingsService};

mod test_utils;
use test_utils::{
    BrokenStore, FailingStrategy, FixedStrategy, PendingStrategy, RecordingEvaluator, service_with,
    settings, sources, strings,
};

fn disabled() -> Settings {
    Settings::from([("enabled".to_string(), SettingValue::Bool(false))])
}

#[tokio::test]
async fn get_falls_back_to_system_when_not_persisted() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(FixedStrategy::new(&["azuread"], disabled()));
    let (_, service) = service_with(vec![], vec![strategy], &["azuread"], &["azuread"]);

    let record = service
        .get_for_provider(&RequestContext::new(), "azuread")
        .await?;

    assert_eq!(record.provider, "azuread");
    assert_eq!(record.settings, disabled());
    assert_eq!(record.source, SettingsSource::System);
    Ok(())
}

#[tokio::test]
async fn get_prefers_persisted_record() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(FixedStrategy::new(
        &["github"],
        settings(&[("client_id", "system"), ("scopes", "user:email")]),
    ));
    let (_, service) = service_with(
        vec![("github", settings(&[("client_id", "persisted")]))],
        vec![strategy],
        &["github"],
        &["github"],
    );

    let record = service
        .get_for_provider(&RequestContext::new(), "github")
        .await?;

    assert_eq!(record.source, SettingsSource::Database);
    assert_eq!(record.settings["client_id"], SettingValue::from("persisted"));
    assert_eq!(record.settings["scopes"], SettingValue::from("user:email"));
    Ok(())
}

#[tokio::test]
async fn get_merges_empty_urls_from_system_defaults() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::new(ProviderOverrides::new()));
    let (_, service) = service_with(
        vec![(
            "github",
            settings(&[
                ("client_id", "client_id"),
                ("auth_url", ""),
                ("api_url", "https://overwritten-api.com/user"),
                ("team_ids", ""),
            ]),
        )],
        vec![strategy],
        &["github"],
        &["github"],
    );

    let record = service
        .get_for_provider(&RequestContext::new(), "github")
        .await?;

    assert_eq!(
        record.settings["auth_url"],
        SettingValue::from("https://github.com/login/oauth/authorize")
    );
    assert_eq!(
        record.settings["token_url"],
        SettingValue::from("https://github.com/login/oauth/access_token")
    );
    assert_eq!(
        record.settings["api_url"],
        SettingValue::from("https://overwritten-api.com/user")
    );
    assert_eq!(record.settings["team_ids"], SettingValue::from(""));
    Ok(())
}

#[tokio::test]
async fn get_is_idempotent() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (_, service) = service_with(
        vec![("gitlab", settings(&[("client_id", "abc")]))],
        vec![strategy],
        &["gitlab", "okta"],
        &[],
    );
    let ctx = RequestContext::new();

    for provider in ["gitlab", "okta"] {
        let first = service.get_for_provider(&ctx, provider).await?;
        let second = service.get_for_provider(&ctx, provider).await?;
        assert_eq!(first, second);
    }
    Ok(())
}

#[tokio::test]
async fn get_without_matching_strategy_fails() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (_, service) = service_with(vec![], vec![strategy], &["github"], &[]);

    let err = service
        .get_for_provider(&RequestContext::new(), "custom_idp")
        .await
        .unwrap_err();
    assert!(matches!(err, SsoSettingsError::NoFallbackStrategy { ref provider } if provider == "custom_idp"));
    Ok(())
}

#[tokio::test]
async fn get_persisted_without_strategy_is_returned_unmerged() -> Result<()> {
    let (_, service) = service_with(
        vec![("custom_idp", settings(&[("host", "idp.local")]))],
        vec![],
        &[],
        &[],
    );

    let record = service
        .get_for_provider(&RequestContext::new(), "custom_idp")
        .await?;
    assert_eq!(record.source, SettingsSource::Database);
    assert_eq!(record.settings, settings(&[("host", "idp.local")]));
    Ok(())
}

#[tokio::test]
async fn store_errors_are_wrapped_with_context() -> Result<()> {
    let service = SsoSettingsService::new(
        Arc::new(BrokenStore),
        vec![Arc::new(OAuthStrategy::default())],
        Arc::new(ssosettings::access::ScopeEvaluator),
        ServiceOptions {
            providers: strings(&["github"]),
            configurable_providers: strings(&["github"]),
        },
    );
    let ctx = RequestContext::new();

    let err = service.get_for_provider(&ctx, "github").await.unwrap_err();
    assert!(matches!(
        err,
        SsoSettingsError::Store { operation: "get", ref provider, .. } if provider == "github"
    ));
    assert!(err.to_string().contains("connection reset"));

    let err = service.list_all(&ctx).await.unwrap_err();
    assert!(matches!(err, SsoSettingsError::Store { operation: "list", .. }));
    Ok(())
}

#[tokio::test]
async fn list_combines_persisted_and_fallback_records() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (_, service) = service_with(
        vec![
            ("github", settings(&[("client_id", "gh")])),
            ("okta", settings(&[("client_id", "okta")])),
        ],
        vec![strategy],
        &OAUTH_PROVIDERS,
        &[],
    );

    let records = service
        .list(&RequestContext::new(), &Requester::service())
        .await?;

    assert_eq!(records.len(), 7);
    let sources = sources(&records);
    assert_eq!(sources.len(), 7, "no duplicates");
    assert_eq!(sources["github"], "database");
    assert_eq!(sources["okta"], "database");
    for provider in ["gitlab", "google", "generic_oauth", "grafana_com", "azuread"] {
        assert_eq!(sources[provider], "system", "{provider}");
    }

    // Persisted first, then fallback in universe order.
    let order: Vec<&str> = records.iter().map(|r| r.provider.as_str()).collect();
    assert_eq!(
        order,
        vec!["github", "okta", "gitlab", "google", "generic_oauth", "grafana_com", "azuread"]
    );
    Ok(())
}

#[tokio::test]
async fn list_keeps_persisted_records_outside_universe() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (_, service) = service_with(
        vec![("custom_idp", settings(&[("host", "idp.local")]))],
        vec![strategy],
        &["github"],
        &[],
    );

    let records = service.list_all(&RequestContext::new()).await?;
    let sources = sources(&records);
    assert_eq!(sources["custom_idp"], "database");
    assert_eq!(sources["github"], "system");
    Ok(())
}

#[tokio::test]
async fn list_is_all_or_nothing_on_fallback_errors() -> Result<()> {
    let ok: Arc<dyn FallbackStrategy> = Arc::new(FixedStrategy::new(&["github"], disabled()));
    let failing: Arc<dyn FallbackStrategy> = Arc::new(FailingStrategy::new(&["gitlab"]));
    let (_, service) = service_with(vec![], vec![ok, failing], &["github", "gitlab"], &[]);

    let err = service.list_all(&RequestContext::new()).await.unwrap_err();
    match err {
        SsoSettingsError::Fallback { provider, source } => {
            assert_eq!(provider, "gitlab");
            assert_eq!(source.to_string(), "defaults unavailable for gitlab");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn list_fails_when_universe_provider_has_no_strategy() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (_, service) = service_with(vec![], vec![strategy], &["github", "saml"], &[]);

    let err = service.list_all(&RequestContext::new()).await.unwrap_err();
    assert!(matches!(err, SsoSettingsError::NoFallbackStrategy { ref provider } if provider == "saml"));
    Ok(())
}

#[tokio::test]
async fn list_filters_by_requester_scopes() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (_, service) = service_with(vec![], vec![strategy], &OAUTH_PROVIDERS, &[]);

    let requester = Requester::new("user:42")
        .with_permission(ACTION_SETTINGS_READ, "settings:auth.azuread")
        .with_permission(ACTION_SETTINGS_READ, "settings:auth.github");

    let records = service.list(&RequestContext::new(), &requester).await?;
    let mut providers: Vec<&str> = records.iter().map(|r| r.provider.as_str()).collect();
    providers.sort();
    assert_eq!(providers, vec!["azuread", "github"]);
    Ok(())
}

#[tokio::test]
async fn list_filtering_is_monotonic() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (_, service) = service_with(vec![], vec![strategy], &OAUTH_PROVIDERS, &[]);
    let ctx = RequestContext::new();

    let narrow = Requester::new("u").with_permission(ACTION_SETTINGS_READ, "settings:auth.okta");
    let wide = narrow
        .clone()
        .with_permission(ACTION_SETTINGS_READ, "settings:auth.gitlab");

    let narrow_records = service.list(&ctx, &narrow).await?;
    let wide_records = service.list(&ctx, &wide).await?;
    for record in &narrow_records {
        assert!(wide_records.contains(record));
    }
    assert_eq!(wide_records.len(), narrow_records.len() + 1);
    Ok(())
}

#[tokio::test]
async fn list_propagates_permission_errors() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let store = Arc::new(ssosettings::repositories::InMemoryStore::new());
    let service = SsoSettingsService::new(
        store,
        vec![strategy],
        Arc::new(RecordingEvaluator {
            fail_for: Some("google".to_string()),
        }),
        ServiceOptions {
            providers: strings(&OAUTH_PROVIDERS),
            configurable_providers: vec![],
        },
    );

    let err = service
        .list(&RequestContext::new(), &Requester::service())
        .await
        .unwrap_err();
    assert!(matches!(err, SsoSettingsError::Permission { ref provider, .. } if provider == "google"));
    Ok(())
}

#[tokio::test]
async fn cancelled_context_returns_cancelled() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(PendingStrategy);
    let (_, service) = service_with(vec![], vec![strategy], &["github"], &[]);

    let ctx = RequestContext::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        service.get_for_provider(&ctx, "github"),
    )
    .await?
    .unwrap_err();
    assert!(matches!(err, SsoSettingsError::Cancelled));
    Ok(())
}

#[tokio::test]
async fn upsert_requires_configurable_provider() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (store, service) = service_with(vec![], vec![strategy], &OAUTH_PROVIDERS, &["github"]);
    let ctx = RequestContext::new();

    let err = service
        .upsert(&ctx, "grafana_com", settings(&[("client_id", "x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, SsoSettingsError::NotConfigurable { .. }));
    assert!(store.get(&ctx, "grafana_com").await.unwrap_err().is_not_found());

    service
        .upsert(&ctx, "github", settings(&[("client_id", "x")]))
        .await?;
    let record = service.get_for_provider(&ctx, "github").await?;
    assert_eq!(record.source, SettingsSource::Database);
    assert_eq!(record.settings["client_id"], SettingValue::from("x"));
    Ok(())
}

#[tokio::test]
async fn upsert_rejects_malformed_lists() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (store, service) = service_with(vec![], vec![strategy], &["okta"], &["okta"]);
    let ctx = RequestContext::new();

    let err = service
        .upsert(&ctx, "okta", settings(&[("allowed_groups", r#"["admins""#)]))
        .await
        .unwrap_err();
    match err {
        SsoSettingsError::InvalidSettings { provider, reason } => {
            assert_eq!(provider, "okta");
            assert!(reason.contains("allowed_groups"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.list(&ctx).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn patch_overlays_current_settings() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (store, service) = service_with(vec![], vec![strategy], &["google"], &["google"]);
    let ctx = RequestContext::new();

    service
        .patch(
            &ctx,
            "google",
            Settings::from([
                ("enabled".to_string(), SettingValue::Bool(true)),
                ("client_id".to_string(), SettingValue::from("google-client")),
            ]),
        )
        .await?;

    let stored = store.get(&ctx, "google").await?;
    assert_eq!(stored.settings["enabled"], SettingValue::Bool(true));
    assert_eq!(stored.settings["client_id"], SettingValue::from("google-client"));
    assert_eq!(
        stored.settings["token_url"],
        SettingValue::from("https://oauth2.googleapis.com/token")
    );
    Ok(())
}

#[tokio::test]
async fn delete_restores_system_defaults() -> Result<()> {
    let strategy: Arc<dyn FallbackStrategy> = Arc::new(OAuthStrategy::default());
    let (_, service) = service_with(
        vec![("gitlab", settings(&[("client_id", "gl")]))],
        vec![strategy],
        &["gitlab"],
        &["gitlab"],
    );
    let ctx = RequestContext::new();

    service.delete(&ctx, "gitlab").await?;
    let record = service.get_for_provider(&ctx, "gitlab").await?;
    assert_eq!(record.source, SettingsSource::System);

    let err = service.delete(&ctx, "gitlab").await.unwrap_err();
    assert!(matches!(err, SsoSettingsError::NotFound { ref provider } if provider == "gitlab"));
    Ok(())
}

fn configured_service(config: &AppConfig) -> (Arc<InMemoryStore>, SsoSettingsService) {
    let store = Arc::new(InMemoryStore::new());
    let service = SsoSettingsService::from_config(config, store.clone());
    (store, service)
}

#[tokio::test]
async fn from_config_without_saml_license_has_no_saml_strategy() -> Result<()> {
    let (_, service) = configured_service(&AppConfig::default());
    let ctx = RequestContext::new();

    let err = service.get_for_provider(&ctx, "saml").await.unwrap_err();
    assert!(matches!(err, SsoSettingsError::NoFallbackStrategy { ref provider } if provider == "saml"));

    let err = service.get_for_provider(&ctx, "ldap").await.unwrap_err();
    assert!(matches!(err, SsoSettingsError::NoFallbackStrategy { ref provider } if provider == "ldap"));

    let records = service.list_all(&ctx).await?;
    let order: Vec<&str> = records.iter().map(|r| r.provider.as_str()).collect();
    assert_eq!(order, OAUTH_PROVIDERS.to_vec());
    Ok(())
}

#[tokio::test]
async fn from_config_with_saml_license_resolves_saml() -> Result<()> {
    let config = AppConfig {
        saml_enabled: true,
        providers: default_universe(true, false),
        ..AppConfig::default()
    };
    let (_, service) = configured_service(&config);
    let ctx = RequestContext::new();

    let record = service.get_for_provider(&ctx, "saml").await?;
    assert_eq!(record.source, SettingsSource::System);
    assert_eq!(record.settings, SamlStrategy::defaults());

    let records = service.list_all(&ctx).await?;
    assert_eq!(records.len(), 8);
    assert_eq!(records.last().map(|r| r.provider.as_str()), Some("saml"));
    Ok(())
}

#[tokio::test]
async fn from_config_with_ldap_enabled_manages_ldap() -> Result<()> {
    let mut config = AppConfig {
        ldap_enabled: true,
        providers: default_universe(false, true),
        ..AppConfig::default()
    };
    config.configurable_providers.push("ldap".to_string());
    let (store, service) = configured_service(&config);
    let ctx = RequestContext::new();

    let record = service.get_for_provider(&ctx, "ldap").await?;
    assert_eq!(record.source, SettingsSource::System);
    assert_eq!(record.settings, LdapStrategy::defaults());

    let document: Settings = serde_json::from_value(json!({
        "enabled": true,
        "config": {
            "servers": [
                {"host": "192.168.0.1", "bind_password": "bind_password_1"},
                {"host": "192.168.0.2", "bind_password": "bind_password_2"},
            ]
        }
    }))?;
    service.upsert(&ctx, "ldap", document.clone()).await?;

    assert_eq!(store.get(&ctx, "ldap").await?.settings, document);

    let record = service.get_for_provider(&ctx, "ldap").await?;
    assert_eq!(record.source, SettingsSource::Database);
    assert_eq!(record.settings["enabled"], SettingValue::Bool(true));
    assert_eq!(record.settings["config"], document["config"]);
    assert_eq!(record.settings["allow_sign_up"], SettingValue::Bool(true));
    assert_eq!(record.settings["skip_org_role_sync"], SettingValue::Bool(false));

    let records = service.list_all(&ctx).await?;
    assert_eq!(records.len(), 8);
    Ok(())
}
