//! SSO settings check
//!
//! Inspects the effective settings of every provider in the universe.

mod list_format;

use std::sync::Arc;

use async_trait::async_trait;

use crate::checks::{Check, CheckItem, Step};
use crate::context::RequestContext;
use crate::error::{BoxError, SsoSettingsError};
use crate::service::SsoSettingsService;

pub use list_format::ListFormatValidation;

pub const CHECK_ID: &str = "ssosetting";

pub struct SsoSettingCheck {
    service: Arc<SsoSettingsService>,
    steps: Vec<Arc<dyn Step>>,
}

impl SsoSettingCheck {
    pub fn new(service: Arc<SsoSettingsService>, list_format: ListFormatValidation) -> Self {
        Self {
            service,
            steps: vec![Arc::new(list_format)],
        }
    }
}

#[async_trait]
impl Check for SsoSettingCheck {
    fn id(&self) -> &'static str {
        CHECK_ID
    }

    async fn items(&self, ctx: &RequestContext) -> Result<Vec<CheckItem>, BoxError> {
        let records = self.service.list_all(ctx).await?;
        Ok(records
            .into_iter()
            .map(|record| Arc::new(record) as CheckItem)
            .collect())
    }

    async fn item(&self, ctx: &RequestContext, id: &str) -> Result<Option<CheckItem>, BoxError> {
        match self.service.get_for_provider(ctx, id).await {
            Ok(record) => Ok(Some(Arc::new(record) as CheckItem)),
            Err(SsoSettingsError::NoFallbackStrategy { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn steps(&self) -> Vec<Arc<dyn Step>> {
        self.steps.clone()
    }
}
