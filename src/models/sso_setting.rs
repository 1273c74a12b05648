//! SSO setting entity model
//!
//! This module contains the SeaORM entity model for the sso_setting table,
//! which stores one administrator-persisted settings document per provider.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Persisted settings row for one authentication provider
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sso_setting")]
pub struct Model {
    /// Unique identifier for the row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Provider identifier, unique across rows
    pub provider: String,

    /// Settings document as a JSON object
    #[sea_orm(column_type = "JsonBinary")]
    pub settings: JsonValue,

    /// Soft-delete marker
    pub is_deleted: bool,

    /// Timestamp when the row was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the row was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
