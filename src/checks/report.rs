//! Check report types
//!
//! The serialized field names are consumed downstream and must not change.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Low,
}

/// A link attached to a failure, e.g. documentation or an admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckErrorLink {
    pub url: String,
    pub message: String,
}

impl CheckErrorLink {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// One diagnostic finding produced by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReportFailure {
    pub severity: Severity,
    #[serde(rename = "stepID")]
    pub step_id: String,
    pub item: String,
    #[serde(rename = "itemID")]
    pub item_id: String,
    pub links: Vec<CheckErrorLink>,
}

impl CheckReportFailure {
    pub fn new(
        severity: Severity,
        step_id: impl Into<String>,
        item: impl Into<String>,
        item_id: impl Into<String>,
        links: Vec<CheckErrorLink>,
    ) -> Self {
        Self {
            severity,
            step_id: step_id.into(),
            item: item.into(),
            item_id: item_id.into(),
            links,
        }
    }
}

/// Aggregated outcome of one check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    #[serde(rename = "checkID")]
    pub check_id: String,
    /// Number of items inspected.
    pub count: usize,
    pub failures: Vec<CheckReportFailure>,
}
