pub mod class_tokenizer;
pub mod engine;
pub mod graph;
pub mod import_graph;
pub mod imports;
pub mod languages;
pub mod report;
pub mod resolve;
pub mod semantic;
pub mod static_analysis;
pub mod structural;
pub mod syntax;
pub mod tables;
pub mod tokens;
pub mod utility_classes;
pub mod visitor;

pub use engine::GateEngine;
pub use report::{AnalysisReport, SeverityFilter};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// One rule breach. `file`, `line` and `column` are absent for project-level
/// rules such as cycle reports or unused tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Violation {
    pub fn new(rule: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            message: message.into(),
            line: None,
            column: None,
            file: None,
        }
    }

    pub fn error(rule: &str, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Error, message)
    }

    pub fn warning(rule: &str, message: impl Into<String>) -> Self {
        Self::new(rule, Severity::Warning, message)
    }

    /// 1-based line and column.
    pub fn at(mut self, (line, column): (usize, usize)) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn in_file(mut self, path: &Path) -> Self {
        self.file = Some(path.display().to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Ordering key used to make a run's output stable: file-scoped
    /// violations first (by file, line, column), project-level ones last.
    pub fn sort_key(&self) -> (bool, &str, usize, usize, &str, &str) {
        (
            self.file.is_none(),
            self.file.as_deref().unwrap_or(""),
            self.line.unwrap_or(0),
            self.column.unwrap_or(0),
            self.rule.as_str(),
            self.message.as_str(),
        )
    }
}

pub fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serializes_lowercase() {
        let v = Violation::error("NO_ANY_TYPE", "Usage of \"any\" type is not allowed").at((3, 7));
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["severity"], "error");
        assert_eq!(json["line"], 3);
        assert!(json.get("file").is_none(), "project-level fields are omitted");
    }

    #[test]
    fn test_sort_puts_project_level_last() {
        let mut list = vec![
            Violation::error("CIRCULAR_DEPENDENCY", "a -> b -> a"),
            Violation::warning("NO_HARDCODED_PX", "x").at((9, 1)).in_file(Path::new("/p/b.tsx")),
            Violation::error("NO_INLINE_STYLES", "y").at((2, 4)).in_file(Path::new("/p/b.tsx")),
            Violation::error("NO_GSAP_FROM", "z").at((1, 1)).in_file(Path::new("/p/a.tsx")),
        ];
        sort_violations(&mut list);
        let rules: Vec<&str> = list.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(
            rules,
            vec!["NO_GSAP_FROM", "NO_INLINE_STYLES", "NO_HARDCODED_PX", "CIRCULAR_DEPENDENCY"]
        );
    }
}
