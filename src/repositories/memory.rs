//! In-memory settings store
//!
//! Process-local [`Store`] used when no database is configured and by tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::context::RequestContext;
use crate::error::StoreError;
use crate::models::{ProviderSettings, Settings};
use crate::repositories::Store;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, Settings>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `(provider, settings)` pairs.
    pub fn with_records<I, P>(records: I) -> Self
    where
        I: IntoIterator<Item = (P, Settings)>,
        P: Into<String>,
    {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|(provider, settings)| (provider.into(), settings))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(
        &self,
        ctx: &RequestContext,
        provider: &str,
    ) -> Result<ProviderSettings, StoreError> {
        let records = ctx.run(self.records.read()).await?;
        records
            .get(provider)
            .map(|settings| ProviderSettings::database(provider, settings.clone()))
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self, ctx: &RequestContext) -> Result<Vec<ProviderSettings>, StoreError> {
        let records = ctx.run(self.records.read()).await?;
        Ok(records
            .iter()
            .map(|(provider, settings)| ProviderSettings::database(provider, settings.clone()))
            .collect())
    }

    async fn upsert(
        &self,
        ctx: &RequestContext,
        settings: &ProviderSettings,
    ) -> Result<(), StoreError> {
        let mut records = ctx.run(self.records.write()).await?;
        records.insert(settings.provider.clone(), settings.settings.clone());
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, provider: &str) -> Result<(), StoreError> {
        let mut records = ctx.run(self.records.write()).await?;
        records
            .remove(provider)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
