//! # SSO Settings Library
//!
//! Resolves the effective settings of external authentication providers by
//! combining persisted administrator settings with system defaults, filters
//! listings by caller permissions, and runs read-only checks over the result.

pub mod access;
pub mod checks;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod fallback;
pub mod list_format;
pub mod models;
pub mod providers;
pub mod repositories;
pub mod service;
pub mod telemetry;
pub use migration;
