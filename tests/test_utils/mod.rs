//! Test utilities shared by the integration tests.
//!
//! Provides an in-memory SQLite database with migrations applied and test
//! doubles for the store, fallback strategy and permission evaluator seams.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use ssosettings::access::{Permission, PermissionEvaluator, Requester, ScopeEvaluator};
use ssosettings::context::RequestContext;
use ssosettings::error::{BoxError, StoreError};
use ssosettings::fallback::FallbackStrategy;
use ssosettings::models::{ProviderSettings, SettingValue, Settings};
use ssosettings::repositories::{InMemoryStore, Store};
use ssosettings::service::{ServiceOptions, SsoSettingsService};

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Sets up an in-memory SQLite database with all migrations applied and returns an Arc.
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// Builds a settings map from string pairs.
pub fn settings(pairs: &[(&str, &str)]) -> Settings {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), SettingValue::from(*value)))
        .collect()
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Strategy returning a fixed map for a fixed set of providers.
pub struct FixedStrategy {
    providers: Vec<String>,
    config: Settings,
    calls: AtomicUsize,
}

impl FixedStrategy {
    pub fn new(providers: &[&str], config: Settings) -> Self {
        Self {
            providers: strings(providers),
            config,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FallbackStrategy for FixedStrategy {
    fn is_match(&self, provider: &str) -> bool {
        self.providers.iter().any(|p| p == provider)
    }

    async fn get_provider_config(
        &self,
        _ctx: &RequestContext,
        _provider: &str,
    ) -> Result<Settings, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.config.clone())
    }
}

/// Strategy that matches the given providers and always fails.
pub struct FailingStrategy {
    providers: Vec<String>,
}

impl FailingStrategy {
    pub fn new(providers: &[&str]) -> Self {
        Self {
            providers: strings(providers),
        }
    }
}

#[async_trait]
impl FallbackStrategy for FailingStrategy {
    fn is_match(&self, provider: &str) -> bool {
        self.providers.iter().any(|p| p == provider)
    }

    async fn get_provider_config(
        &self,
        _ctx: &RequestContext,
        provider: &str,
    ) -> Result<Settings, BoxError> {
        Err(format!("defaults unavailable for {}", provider).into())
    }
}

/// Strategy that never completes; used to observe cancellation.
pub struct PendingStrategy;

#[async_trait]
impl FallbackStrategy for PendingStrategy {
    fn is_match(&self, _provider: &str) -> bool {
        true
    }

    async fn get_provider_config(
        &self,
        _ctx: &RequestContext,
        _provider: &str,
    ) -> Result<Settings, BoxError> {
        std::future::pending().await
    }
}

/// Store whose every operation fails with a database error.
pub struct BrokenStore;

#[async_trait]
impl Store for BrokenStore {
    async fn get(&self, _ctx: &RequestContext, _provider: &str) -> Result<ProviderSettings, StoreError> {
        Err(StoreError::Database(sea_orm::DbErr::Custom("connection reset".to_string())))
    }

    async fn list(&self, _ctx: &RequestContext) -> Result<Vec<ProviderSettings>, StoreError> {
        Err(StoreError::Database(sea_orm::DbErr::Custom("connection reset".to_string())))
    }

    async fn upsert(&self, _ctx: &RequestContext, _settings: &ProviderSettings) -> Result<(), StoreError> {
        Err(StoreError::Database(sea_orm::DbErr::Custom("connection reset".to_string())))
    }

    async fn delete(&self, _ctx: &RequestContext, _provider: &str) -> Result<(), StoreError> {
        Err(StoreError::Database(sea_orm::DbErr::Custom("connection reset".to_string())))
    }
}

/// Evaluator that denies a fixed provider and errors for another.
pub struct RecordingEvaluator {
    pub fail_for: Option<String>,
}

#[async_trait]
impl PermissionEvaluator for RecordingEvaluator {
    async fn evaluate(
        &self,
        ctx: &RequestContext,
        requester: &Requester,
        permission: &Permission,
    ) -> Result<bool, BoxError> {
        if let Some(provider) = &self.fail_for {
            if permission.scope.ends_with(provider.as_str()) {
                return Err("permission backend down".into());
            }
        }
        ScopeEvaluator.evaluate(ctx, requester, permission).await
    }
}

/// Service over an in-memory store with the given persisted records.
pub fn service_with(
    persisted: Vec<(&str, Settings)>,
    strategies: Vec<Arc<dyn FallbackStrategy>>,
    providers: &[&str],
    configurable: &[&str],
) -> (Arc<InMemoryStore>, SsoSettingsService) {
    let store = Arc::new(InMemoryStore::with_records(persisted));
    let service = SsoSettingsService::new(
        store.clone(),
        strategies,
        Arc::new(ScopeEvaluator),
        ServiceOptions {
            providers: strings(providers),
            configurable_providers: strings(configurable),
        },
    );
    (store, service)
}

/// Maps provider -> source for quick assertions.
pub fn sources(records: &[ProviderSettings]) -> BTreeMap<String, String> {
    records
        .iter()
        .map(|r| (r.provider.clone(), r.source.to_string()))
        .collect()
}
