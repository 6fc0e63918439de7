//! Aggregated results of all checks

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{CheckResult, Status};

pub const DEFAULT_TITLE: &str = "Shaping checks results";

/// The font the checks ran against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Results of one check, in the order they were produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub results: Vec<CheckResult>,
}

impl Section {
    pub fn count(&self, status: Status) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Pass/fail/skip totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub font: FontInfo,
    pub generated_at: DateTime<Utc>,
    /// Check name to its section, in the order the checks ran
    pub checks: IndexMap<String, Section>,
}

impl Report {
    pub fn new(title: impl Into<String>, font: FontInfo) -> Self {
        Self {
            title: title.into(),
            font,
            generated_at: Utc::now(),
            checks: IndexMap::new(),
        }
    }

    /// Open the section for a check; results recorded under `name` land here.
    pub fn section(&mut self, name: &str, title: &str) -> &mut Section {
        self.checks
            .entry(name.to_string())
            .or_insert_with(|| Section {
                title: title.to_string(),
                results: Vec::new(),
            })
    }

    pub fn record(&mut self, name: &str, title: &str, result: CheckResult) {
        self.section(name, title).results.push(result);
    }

    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.values().flat_map(|s| s.results.iter())
    }

    /// False as soon as any check failed.
    pub fn passed(&self) -> bool {
        !self.results().any(CheckResult::is_fail)
    }

    pub fn summary(&self) -> Summary {
        self.checks.values().fold(Summary::default(), |acc, s| Summary {
            passed: acc.passed + s.count(Status::Pass),
            failed: acc.failed + s.count(Status::Fail),
            skipped: acc.skipped + s.count(Status::Skip),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Report {
        let mut report = Report::new(DEFAULT_TITLE, FontInfo::default());
        report.record("b", "Second", CheckResult::pass("pass", "x.json: No regression detected"));
        report.record("a", "First", CheckResult::skip("skip", "No applicable tests ran."));
        report.record("b", "Second", CheckResult::pass("pass", "y.json: No regression detected"));
        report
    }

    #[test]
    fn test_sections_keep_order() {
        let report = report();
        let names: Vec<&String> = report.checks.keys().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(report.checks["b"].results.len(), 2);
        assert!(report.passed());
        assert_eq!(
            report.summary(),
            Summary {
                passed: 2,
                failed: 0,
                skipped: 1
            }
        );
    }

    #[test]
    fn test_any_fail_fails_the_report() {
        let mut report = report();
        report.record("a", "First", CheckResult::fail("missing-input", "z.json: test is missing an input key."));
        assert!(!report.passed());
        assert_eq!(report.summary().failed, 1);
    }

    #[test]
    fn test_json_round_trip() {
        let report = report();
        let parsed: Report = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
