//! List-format validation step
//!
//! Flags list-typed settings whose value is not a string or does not parse
//! as a list.

use std::any::Any;

use async_trait::async_trait;

use crate::checks::{CheckErrorLink, CheckReportFailure, CheckSpec, Severity, Step, StepError};
use crate::config::AppConfig;
use crate::context::{Cancelled, RequestContext};
use crate::list_format::{self, LIST_KEYS};
use crate::models::{ProviderSettings, SettingValue};
use crate::providers;

pub const STEP_ID: &str = "list_format_validation";

/// Validates the encoding of every list-typed key of a provider record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFormatValidation {
    docs_base_url: String,
    app_sub_url: String,
}

impl ListFormatValidation {
    /// # Arguments
    ///
    /// * `docs_base_url` - Base of the per-provider documentation pages
    /// * `app_sub_url` - Path prefix the admin UI is served under, may be empty
    pub fn new(docs_base_url: impl Into<String>, app_sub_url: impl Into<String>) -> Self {
        Self {
            docs_base_url: docs_base_url.into().trim_end_matches('/').to_string(),
            app_sub_url: app_sub_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.docs_base_url.clone(), config.app_sub_url.clone())
    }

    fn links(&self, record: &ProviderSettings, label: &str) -> Vec<CheckErrorLink> {
        vec![
            CheckErrorLink::new(
                format!(
                    "{}/{}",
                    self.docs_base_url,
                    providers::docs_slug(&record.provider)
                ),
                "Documentation",
            ),
            CheckErrorLink::new(
                format!(
                    "{}/admin/authentication/{}",
                    self.app_sub_url, record.provider
                ),
                format!("Configure {}", label),
            ),
        ]
    }

    fn failure(&self, record: &ProviderSettings, label: &str, item: String) -> CheckReportFailure {
        CheckReportFailure::new(
            Severity::High,
            STEP_ID,
            item,
            record.provider.clone(),
            self.links(record, label),
        )
    }
}

#[async_trait]
impl Step for ListFormatValidation {
    fn id(&self) -> &'static str {
        STEP_ID
    }

    fn title(&self) -> &'static str {
        "List format validation"
    }

    fn description(&self) -> &'static str {
        "Checks that list settings such as allowed groups, organizations and role values use a supported list format."
    }

    fn resolution(&self) -> &'static str {
        "Use a JSON array of strings (e.g. [\"a\", \"b\"]) or a comma or space separated list (e.g. a, b)."
    }

    async fn run(
        &self,
        ctx: &RequestContext,
        _spec: &CheckSpec,
        item: &(dyn Any + Send + Sync),
    ) -> Result<Vec<CheckReportFailure>, StepError> {
        if ctx.is_cancelled() {
            return Err(Cancelled.into());
        }

        let record = item
            .downcast_ref::<ProviderSettings>()
            .ok_or(StepError::TypeMismatch {
                step_id: STEP_ID,
                expected: "ProviderSettings",
            })?;

        let label = record.label();
        let mut failures = Vec::new();

        for key in LIST_KEYS {
            let Some(value) = record.get(key) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }

            match value {
                SettingValue::String(raw) => {
                    if !list_format::is_valid(raw) {
                        failures.push(self.failure(
                            record,
                            &label,
                            format!("{} - Invalid format for '{}': {}", label, key, raw),
                        ));
                    }
                }
                other => failures.push(self.failure(
                    record,
                    &label,
                    format!(
                        "{} - Invalid type for '{}': expected string, got {}",
                        label,
                        key,
                        other.type_name()
                    ),
                )),
            }
        }

        Ok(failures)
    }
}
