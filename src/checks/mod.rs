//! # Checks
//!
//! Read-only diagnostics over resolved configuration.
//!
//! A [`Check`] supplies items (for SSO settings: one [`ProviderSettings`] per
//! provider) and a list of [`Step`]s. The [`CheckRunner`] runs every step on
//! every item and collects the resulting [`CheckReportFailure`]s.
//!
//! [`ProviderSettings`]: crate::models::ProviderSettings

pub mod report;
pub mod runner;
pub mod ssosetting;

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::{Cancelled, RequestContext};
use crate::error::BoxError;

pub use report::{CheckErrorLink, CheckReport, CheckReportFailure, Severity};
pub use runner::CheckRunner;
pub use ssosetting::{ListFormatValidation, SsoSettingCheck};

/// An item handed to steps; each step downcasts it to the type it inspects.
pub type CheckItem = Arc<dyn Any + Send + Sync>;

/// Parameters of a check run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSpec {
    /// Free-form key/value data passed to every step.
    pub data: BTreeMap<String, String>,
}

impl CheckSpec {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The item is not of the type the step inspects.
    #[error("step '{step_id}' expected an item of type {expected}")]
    TypeMismatch {
        step_id: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// A named, stateless validation over a single item.
#[async_trait]
pub trait Step: Send + Sync {
    fn id(&self) -> &'static str;
    fn title(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn resolution(&self) -> &'static str;

    /// Inspects one item. Problems found in the item are returned as
    /// failures; an `Err` means the step could not inspect it at all.
    async fn run(
        &self,
        ctx: &RequestContext,
        spec: &CheckSpec,
        item: &(dyn Any + Send + Sync),
    ) -> Result<Vec<CheckReportFailure>, StepError>;
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("check '{check_id}' is not registered")]
    UnknownCheck { check_id: String },

    #[error("check '{check_id}' has no item '{item_id}'")]
    ItemNotFound { check_id: String, item_id: String },

    #[error("check '{check_id}' failed to load items: {source}")]
    Items {
        check_id: String,
        #[source]
        source: BoxError,
    },

    #[error("check run cancelled")]
    Cancelled,
}

impl From<Cancelled> for CheckError {
    fn from(_: Cancelled) -> Self {
        CheckError::Cancelled
    }
}

/// Supplies items and the steps that inspect them.
#[async_trait]
pub trait Check: Send + Sync {
    fn id(&self) -> &'static str;

    /// All items the check covers.
    async fn items(&self, ctx: &RequestContext) -> Result<Vec<CheckItem>, BoxError>;

    /// A single item by identifier, `None` when the check does not know it.
    async fn item(&self, ctx: &RequestContext, id: &str) -> Result<Option<CheckItem>, BoxError>;

    fn steps(&self) -> Vec<Arc<dyn Step>>;
}
