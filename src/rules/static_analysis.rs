use crate::rules::Violation;
use crate::rules::syntax::{ParseFailure, SourceFile};
use crate::rules::tokens::TokenMetrics;
use crate::rules::utility_classes::UtilityClassMetrics;
use std::path::Path;

/// Per-file analyzer. Implementations are pure functions of the parsed file.
pub trait StaticAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(&self, file: &SourceFile) -> FileAnalysis;

    /// Reads and parses `path` first; a parse failure becomes the single
    /// `PARSE_ERROR` violation and no rule runs.
    fn analyze_path(&self, path: &Path) -> FileAnalysis {
        match SourceFile::load(path) {
            Ok(file) => self.analyze(&file),
            Err(failure) => FileAnalysis::violations(vec![parse_error(path, &failure)]),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum AnalyzerMetrics {
    #[default]
    None,
    UtilityClasses(UtilityClassMetrics),
    Tokens(TokenMetrics),
}

#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    pub violations: Vec<Violation>,
    pub metrics: AnalyzerMetrics,
}

impl FileAnalysis {
    pub fn violations(violations: Vec<Violation>) -> Self {
        Self {
            violations,
            metrics: AnalyzerMetrics::None,
        }
    }
}

pub fn parse_error(path: &Path, failure: &ParseFailure) -> Violation {
    let violation = Violation::error("PARSE_ERROR", format!("Failed to parse file: {}", failure))
        .in_file(path);
    match failure.location() {
        Some(loc) => violation.at(loc),
        None => violation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::structural::StructuralAnalyzer;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_failure_is_single_violation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Broken.tsx");
        fs::write(&path, "export const X = () => <div style={{color: \"red\"}};\n").unwrap();

        let analysis = StructuralAnalyzer::default().analyze_path(&path);
        assert_eq!(analysis.violations.len(), 1);
        let v = &analysis.violations[0];
        assert_eq!(v.rule, "PARSE_ERROR");
        assert!(v.is_error());
        assert!(v.line.is_some());
    }
}
