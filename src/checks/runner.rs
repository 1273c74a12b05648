//! Check runner
//!
//! Runs registered checks sequentially and aggregates their failures.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::checks::{Check, CheckError, CheckItem, CheckReport, CheckSpec, StepError};
use crate::context::RequestContext;
use crate::error::BoxError;

#[derive(Clone, Default)]
pub struct CheckRunner {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRunner {
    pub fn new(checks: Vec<Arc<dyn Check>>) -> Self {
        Self { checks }
    }

    pub fn register(&mut self, check: Arc<dyn Check>) {
        self.checks.push(check);
    }

    pub fn check_ids(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.id()).collect()
    }

    /// Runs every registered check over all of its items.
    ///
    /// Items are fetched once per check. A failure to fetch them aborts the
    /// run; a step that cannot inspect an item only loses that contribution.
    pub async fn run(
        &self,
        ctx: &RequestContext,
        spec: &CheckSpec,
    ) -> Result<Vec<CheckReport>, CheckError> {
        let mut reports = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let items = check
                .items(ctx)
                .await
                .map_err(|source| items_error(ctx, check.id(), source))?;

            let report = run_check(ctx, spec, check.as_ref(), &items).await?;
            info!(
                check_id = %report.check_id,
                items = report.count,
                failures = report.failures.len(),
                "Check completed"
            );
            reports.push(report);
        }

        Ok(reports)
    }

    /// Runs one check against a single item.
    pub async fn run_item(
        &self,
        ctx: &RequestContext,
        spec: &CheckSpec,
        check_id: &str,
        item_id: &str,
    ) -> Result<CheckReport, CheckError> {
        let check = self
            .checks
            .iter()
            .find(|check| check.id() == check_id)
            .ok_or_else(|| CheckError::UnknownCheck {
                check_id: check_id.to_string(),
            })?;

        let item = check
            .item(ctx, item_id)
            .await
            .map_err(|source| items_error(ctx, check_id, source))?
            .ok_or_else(|| CheckError::ItemNotFound {
                check_id: check_id.to_string(),
                item_id: item_id.to_string(),
            })?;

        run_check(ctx, spec, check.as_ref(), &[item]).await
    }
}

fn items_error(ctx: &RequestContext, check_id: &str, source: BoxError) -> CheckError {
    if ctx.is_cancelled() {
        CheckError::Cancelled
    } else {
        CheckError::Items {
            check_id: check_id.to_string(),
            source,
        }
    }
}

async fn run_check(
    ctx: &RequestContext,
    spec: &CheckSpec,
    check: &dyn Check,
    items: &[CheckItem],
) -> Result<CheckReport, CheckError> {
    let steps = check.steps();
    let mut failures = Vec::new();

    for item in items {
        for step in &steps {
            match step.run(ctx, spec, item.as_ref()).await {
                Ok(found) => failures.extend(found),
                Err(StepError::Cancelled(_)) => return Err(CheckError::Cancelled),
                Err(err) => {
                    warn!(
                        check_id = check.id(),
                        step_id = step.id(),
                        error = %err,
                        "Step skipped item"
                    );
                }
            }
        }
    }

    debug!(check_id = check.id(), steps = steps.len(), "Ran check steps");

    Ok(CheckReport {
        check_id: check.id().to_string(),
        count: items.len(),
        failures,
    })
}
