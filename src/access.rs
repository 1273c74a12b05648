//! # Access Filtering
//!
//! Narrows a settings listing to the providers a requester may read.
//!
//! Permissions are `(action, scope)` pairs. Provider settings are guarded by
//! the action [`ACTION_SETTINGS_READ`] on the scope `settings:auth.<provider>`.
//! A granted scope ending in `*` covers every scope sharing its prefix, so
//! `settings:auth.*`, `settings:*` and `*` grant every provider.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::{BoxError, SsoSettingsError};
use crate::models::ProviderSettings;

pub const ACTION_SETTINGS_READ: &str = "settings:read";
pub const ACTION_SETTINGS_WRITE: &str = "settings:write";

/// Scope guarding the settings of one provider.
pub fn provider_scope(provider: &str) -> String {
    format!("settings:auth.{}", provider)
}

/// A permission to check: an action on a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub action: String,
    pub scope: String,
}

impl Permission {
    pub fn new(action: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            scope: scope.into(),
        }
    }

    /// `settings:read` on the provider's scope.
    pub fn read_provider(provider: &str) -> Self {
        Self::new(ACTION_SETTINGS_READ, provider_scope(provider))
    }
}

/// Identity and grants of the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requester {
    pub id: String,
    /// Granted scopes per action.
    pub permissions: BTreeMap<String, BTreeSet<String>>,
}

impl Requester {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            permissions: BTreeMap::new(),
        }
    }

    /// Adds a granted scope for `action`.
    pub fn with_permission(mut self, action: impl Into<String>, scope: impl Into<String>) -> Self {
        self.permissions
            .entry(action.into())
            .or_default()
            .insert(scope.into());
        self
    }

    /// Internal caller allowed to read every provider.
    pub fn service() -> Self {
        Self::new("service").with_permission(ACTION_SETTINGS_READ, "*")
    }

    pub fn scopes(&self, action: &str) -> impl Iterator<Item = &str> {
        self.permissions
            .get(action)
            .into_iter()
            .flat_map(|scopes| scopes.iter().map(String::as_str))
    }
}

/// Decides whether a requester holds a permission.
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    async fn evaluate(
        &self,
        ctx: &RequestContext,
        requester: &Requester,
        permission: &Permission,
    ) -> Result<bool, BoxError>;
}

/// Whether `granted` covers `requested`, honouring trailing `*` wildcards.
pub fn scope_covers(granted: &str, requested: &str) -> bool {
    match granted.strip_suffix('*') {
        Some(prefix) => requested.starts_with(prefix),
        None => granted == requested,
    }
}

/// In-process evaluator over the requester's granted scopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeEvaluator;

#[async_trait]
impl PermissionEvaluator for ScopeEvaluator {
    async fn evaluate(
        &self,
        _ctx: &RequestContext,
        requester: &Requester,
        permission: &Permission,
    ) -> Result<bool, BoxError> {
        Ok(requester
            .scopes(&permission.action)
            .any(|granted| scope_covers(granted, &permission.scope)))
    }
}

/// Drops records the requester is not allowed to read.
#[derive(Clone)]
pub struct AccessFilter {
    evaluator: Arc<dyn PermissionEvaluator>,
}

impl AccessFilter {
    pub fn new(evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Keeps each record whose provider scope the requester can read.
    ///
    /// Input order is preserved. The first evaluator error aborts the call.
    pub async fn filter(
        &self,
        ctx: &RequestContext,
        records: Vec<ProviderSettings>,
        requester: &Requester,
    ) -> Result<Vec<ProviderSettings>, SsoSettingsError> {
        let mut allowed = Vec::with_capacity(records.len());

        for record in records {
            let permission = Permission::read_provider(&record.provider);
            let granted = ctx
                .run(self.evaluator.evaluate(ctx, requester, &permission))
                .await?
                .map_err(|source| SsoSettingsError::Permission {
                    provider: record.provider.clone(),
                    source,
                })?;

            if granted {
                allowed.push(record);
            } else {
                tracing::trace!(
                    requester = %requester.id,
                    provider = %record.provider,
                    "Dropping provider settings the requester cannot read"
                );
            }
        }

        Ok(allowed)
    }
}
