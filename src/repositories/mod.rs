//! # Repository Layer
//!
//! Persistence for provider settings. [`Store`] is the seam the settings
//! service depends on; [`SsoSettingsRepository`] backs it with SeaORM and
//! [`InMemoryStore`] keeps records in process memory.

pub mod memory;
pub mod sso_setting;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::StoreError;
use crate::models::ProviderSettings;

pub use memory::InMemoryStore;
pub use sso_setting::SsoSettingsRepository;

/// Key-value persistence holding at most one settings record per provider.
///
/// Records returned by `get` and `list` are tagged
/// [`SettingsSource::Database`](crate::models::SettingsSource::Database).
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the persisted record, or [`StoreError::NotFound`].
    async fn get(
        &self,
        ctx: &RequestContext,
        provider: &str,
    ) -> Result<ProviderSettings, StoreError>;

    /// Returns every persisted record.
    async fn list(&self, ctx: &RequestContext) -> Result<Vec<ProviderSettings>, StoreError>;

    /// Inserts or replaces the record for `settings.provider`.
    async fn upsert(
        &self,
        ctx: &RequestContext,
        settings: &ProviderSettings,
    ) -> Result<(), StoreError>;

    /// Removes the record, or fails with [`StoreError::NotFound`].
    async fn delete(&self, ctx: &RequestContext, provider: &str) -> Result<(), StoreError>;
}
