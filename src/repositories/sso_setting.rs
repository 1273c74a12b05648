//! SSO settings repository for database operations
//!
//! This module provides the SsoSettingsRepository struct which encapsulates
//! SeaORM operations for the sso_setting table. Deletes are soft: the row is
//! flagged and revived by the next upsert for the same provider.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, prelude::DateTimeWithTimeZone,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::StoreError;
use crate::models::sso_setting::{self, Entity as SsoSetting};
use crate::models::{ProviderSettings, Settings};
use crate::repositories::Store;

/// Repository for persisted provider settings
#[derive(Debug, Clone)]
pub struct SsoSettingsRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl SsoSettingsRepository {
    /// Creates a new SsoSettingsRepository instance
    ///
    /// # Arguments
    ///
    /// * `db` - Database connection pool
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Finds the live (not soft-deleted) row for a provider
    pub async fn find_active(&self, provider: &str) -> Result<Option<sso_setting::Model>, DbErr> {
        SsoSetting::find()
            .filter(sso_setting::Column::Provider.eq(provider))
            .filter(sso_setting::Column::IsDeleted.eq(false))
            .one(&*self.db)
            .await
    }

    /// Finds all live rows ordered by provider
    pub async fn find_all_active(&self) -> Result<Vec<sso_setting::Model>, DbErr> {
        SsoSetting::find()
            .filter(sso_setting::Column::IsDeleted.eq(false))
            .order_by_asc(sso_setting::Column::Provider)
            .all(&*self.db)
            .await
    }

    async fn write(&self, provider: &str, document: serde_json::Value) -> Result<(), DbErr> {
        let now: DateTimeWithTimeZone = Utc::now().into();

        // Includes soft-deleted rows so the unique provider index is never violated.
        let existing = SsoSetting::find()
            .filter(sso_setting::Column::Provider.eq(provider))
            .one(&*self.db)
            .await?;

        match existing {
            Some(model) => {
                let mut active_model: sso_setting::ActiveModel = model.into();
                active_model.settings = Set(document);
                active_model.is_deleted = Set(false);
                active_model.updated_at = Set(now);
                active_model.update(&*self.db).await?;
            }
            None => {
                let active_model = sso_setting::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    provider: Set(provider.to_string()),
                    settings: Set(document),
                    is_deleted: Set(false),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active_model.insert(&*self.db).await?;
            }
        }

        Ok(())
    }

    async fn soft_delete(&self, provider: &str) -> Result<bool, DbErr> {
        let Some(model) = self.find_active(provider).await? else {
            return Ok(false);
        };

        let mut active_model: sso_setting::ActiveModel = model.into();
        active_model.is_deleted = Set(true);
        active_model.updated_at = Set(Utc::now().into());
        active_model.update(&*self.db).await?;
        Ok(true)
    }
}

fn to_provider_settings(model: sso_setting::Model) -> Result<ProviderSettings, StoreError> {
    let settings: Settings = serde_json::from_value(model.settings)?;
    Ok(ProviderSettings::database(model.provider, settings))
}

#[async_trait]
impl Store for SsoSettingsRepository {
    async fn get(
        &self,
        ctx: &RequestContext,
        provider: &str,
    ) -> Result<ProviderSettings, StoreError> {
        let model = ctx
            .run(self.find_active(provider))
            .await??
            .ok_or(StoreError::NotFound)?;
        to_provider_settings(model)
    }

    async fn list(&self, ctx: &RequestContext) -> Result<Vec<ProviderSettings>, StoreError> {
        let models = ctx.run(self.find_all_active()).await??;
        models.into_iter().map(to_provider_settings).collect()
    }

    async fn upsert(
        &self,
        ctx: &RequestContext,
        settings: &ProviderSettings,
    ) -> Result<(), StoreError> {
        let document = serde_json::to_value(&settings.settings)?;
        ctx.run(self.write(&settings.provider, document)).await??;
        tracing::debug!(provider = %settings.provider, "Persisted SSO settings");
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, provider: &str) -> Result<(), StoreError> {
        if ctx.run(self.soft_delete(provider)).await?? {
            tracing::debug!(provider, "Soft-deleted SSO settings");
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}
