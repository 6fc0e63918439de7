//! Check results

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::item::ReportItem;

/// Outcome of one reported result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Skip,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
            Status::Skip => "SKIP",
        }
    }

    /// Label shown in the HTML report.
    pub fn indicator(&self) -> &'static str {
        match self {
            Status::Pass => "PASS ✅",
            Status::Fail => "FAIL 🔥",
            Status::Skip => "SKIP ⏩",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single result yielded by a check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: Status,
    /// Stable machine-readable code, e.g. `pass` or `missing-input`
    pub code: String,
    pub header: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ReportItem>,
}

impl CheckResult {
    fn new(status: Status, code: &str, header: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            header: header.into(),
            items: Vec::new(),
        }
    }

    pub fn pass(code: &str, header: impl Into<String>) -> Self {
        Self::new(Status::Pass, code, header)
    }

    pub fn fail(code: &str, header: impl Into<String>) -> Self {
        Self::new(Status::Fail, code, header)
    }

    pub fn skip(code: &str, header: impl Into<String>) -> Self {
        Self::new(Status::Skip, code, header)
    }

    pub fn with_items(mut self, items: Vec<ReportItem>) -> Self {
        self.items = items;
        self
    }

    pub fn is_fail(&self) -> bool {
        self.status == Status::Fail
    }
}
