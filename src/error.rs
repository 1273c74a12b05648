//! # Error Handling
//!
//! This module provides the error types shared by the settings resolver,
//! the stores and the fallback strategies.

use thiserror::Error;

use crate::context::Cancelled;
use crate::list_format::ListFormatError;

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by a [`Store`](crate::repositories::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No persisted record exists for the provider.
    #[error("settings not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("settings document could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Errors returned by the settings service.
#[derive(Debug, Error)]
pub enum SsoSettingsError {
    #[error("no settings found for provider '{provider}'")]
    NotFound { provider: String },

    #[error("no fallback strategy configured for provider '{provider}'")]
    NoFallbackStrategy { provider: String },

    #[error("provider '{provider}' is not configurable")]
    NotConfigurable { provider: String },

    #[error("invalid settings for provider '{provider}': {reason}")]
    InvalidSettings { provider: String, reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("store {operation} failed for provider '{provider}': {source}")]
    Store {
        operation: &'static str,
        provider: String,
        #[source]
        source: StoreError,
    },

    #[error("fallback strategy failed for provider '{provider}': {source}")]
    Fallback {
        provider: String,
        #[source]
        source: BoxError,
    },

    #[error("permission evaluation failed for provider '{provider}': {source}")]
    Permission {
        provider: String,
        #[source]
        source: BoxError,
    },
}

impl From<Cancelled> for SsoSettingsError {
    fn from(_: Cancelled) -> Self {
        SsoSettingsError::Cancelled
    }
}

impl SsoSettingsError {
    /// Wraps a store failure, keeping cancellation distinguishable.
    pub fn store(operation: &'static str, provider: impl Into<String>, source: StoreError) -> Self {
        match source {
            StoreError::Cancelled(_) => SsoSettingsError::Cancelled,
            source => SsoSettingsError::Store {
                operation,
                provider: provider.into(),
                source,
            },
        }
    }

    pub fn invalid_list(provider: &str, key: &str, error: ListFormatError) -> Self {
        SsoSettingsError::InvalidSettings {
            provider: provider.to_string(),
            reason: format!("'{}': {}", key, error),
        }
    }
}
