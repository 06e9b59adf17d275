//! The aggregate result of one gate run, as serialized with `--json`.

use crate::config::GATE_VERSION;
use crate::rules::import_graph::ImportGraphMetrics;
use crate::rules::tokens::TokenMetrics;
use crate::rules::utility_classes::UtilityClassMetrics;
use crate::rules::{Severity, Violation, sort_violations};
use serde::Serialize;

/// Informational counters. Never affect the gate decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    pub files_analyzed: usize,
    pub component_files_analyzed: usize,
    pub type_script_files_analyzed: usize,
    pub analyzers_run: usize,
    pub analyze_time_ms: u64,
    pub utility_classes: UtilityClassMetrics,
    pub tokens: TokenMetrics,
    pub import_graph: ImportGraphMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_violations: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub blocked: bool,
}

impl Summary {
    pub fn of(violations: &[Violation]) -> Self {
        let error_count = violations.iter().filter(|v| v.is_error()).count();
        Self {
            total_violations: violations.len(),
            error_count,
            warning_count: violations.len() - error_count,
            blocked: error_count > 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub version: String,
    pub project_dir: String,
    pub timestamp: String,
    pub metrics: ReportMetrics,
    pub summary: Summary,
    pub violations: Vec<Violation>,
}

impl AnalysisReport {
    /// Sorts the violations into their stable order and derives the summary.
    pub fn new(project_dir: String, metrics: ReportMetrics, mut violations: Vec<Violation>) -> Self {
        sort_violations(&mut violations);
        Self {
            version: GATE_VERSION.to_string(),
            project_dir,
            timestamp: chrono::Utc::now().to_rfc3339(),
            metrics,
            summary: Summary::of(&violations),
            violations,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.summary.blocked
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_error())
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Which severities the human-readable output lists. Errors are always
/// listed; the filter only decides whether warnings follow them.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeverityFilter {
    Error,
    Warning,
    #[default]
    All,
}

impl SeverityFilter {
    pub fn shows(self, severity: Severity) -> bool {
        match severity {
            Severity::Error => true,
            Severity::Warning => self != SeverityFilter::Error,
        }
    }
}
