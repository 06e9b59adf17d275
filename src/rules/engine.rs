//! Orchestration: discovery, one parse per file, per-file analyzers in
//! parallel, the semantic batch, project-wide checks, and the final report.

use crate::config::GateConfig;
use crate::files::{discover, relative_display};
use crate::rules::Violation;
use crate::rules::import_graph::ImportGraphAnalyzer;
use crate::rules::report::{AnalysisReport, ReportMetrics};
use crate::rules::semantic::program::project_resolver;
use crate::rules::semantic::{Program, SemanticAnalyzer};
use crate::rules::static_analysis::{AnalyzerMetrics, FileAnalysis, StaticAnalyzer, parse_error};
use crate::rules::structural::StructuralAnalyzer;
use crate::rules::syntax::SourceFile;
use crate::rules::tables::RuleTables;
use crate::rules::tokens::TokenAnalyzer;
use crate::rules::utility_classes::UtilityClassAnalyzer;
use anyhow::Context;
use rayon::prelude::*;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct GateEngine {
    config: GateConfig,
    tables: RuleTables,
    component_analyzers: Vec<Box<dyn StaticAnalyzer>>,
}

impl GateEngine {
    pub fn new(config: GateConfig, tables: RuleTables) -> Self {
        let component_analyzers: Vec<Box<dyn StaticAnalyzer>> = vec![
            Box::new(StructuralAnalyzer::new(config.clone(), tables.clone())),
            Box::new(UtilityClassAnalyzer::new(config.clone(), tables.clone())),
            Box::new(TokenAnalyzer::new(config.clone(), tables.clone())),
        ];
        Self {
            config,
            tables,
            component_analyzers,
        }
    }

    /// Engine configured from the project's `.brudirc.toml`, if any.
    pub fn for_project(root: &Path) -> anyhow::Result<Self> {
        let config = GateConfig::load(root)?;
        Ok(Self::new(config, RuleTables::default()))
    }

    /// Registers one more per-file analyzer for component files.
    #[cfg(test)]
    fn with_analyzer(mut self, analyzer: Box<dyn StaticAnalyzer>) -> Self {
        self.component_analyzers.push(analyzer);
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn run(&self, project_dir: &Path) -> anyhow::Result<AnalysisReport> {
        let root = project_dir
            .canonicalize()
            .with_context(|| format!("project directory not found: {}", project_dir.display()))?;
        anyhow::ensure!(root.is_dir(), "not a directory: {}", root.display());

        let started = Instant::now();
        let files = discover(&root, &self.config);
        let mut violations: Vec<Violation> = Vec::new();
        let mut metrics = ReportMetrics {
            files_analyzed: files.sources.len(),
            component_files_analyzed: files.components.len(),
            type_script_files_analyzed: files.typed.len(),
            ..ReportMetrics::default()
        };

        let parsed = self.parse_all(&files.sources, &mut violations);

        // Per-file analyzers
        let components: Vec<&Arc<SourceFile>> =
            files.components.iter().filter_map(|p| parsed.get(p)).collect();
        let outcomes: Vec<Vec<(Option<FileAnalysis>, Option<Violation>)>> = components
            .par_iter()
            .map(|file| {
                debug!(file = %file.path.display(), "analyzing component file");
                self.component_analyzers
                    .iter()
                    .map(|analyzer| {
                        match catch_unwind(AssertUnwindSafe(|| analyzer.analyze(file))) {
                            Ok(analysis) => (Some(analysis), None),
                            Err(panic) => (
                                None,
                                Some(analyzer_error(analyzer.name(), &file.path, &root, &panic_message(panic))),
                            ),
                        }
                    })
                    .collect()
            })
            .collect();
        for (analysis, fault) in outcomes.into_iter().flatten() {
            if let Some(fault) = fault {
                violations.push(fault);
            }
            let Some(analysis) = analysis else { continue };
            match &analysis.metrics {
                AnalyzerMetrics::UtilityClasses(m) => metrics.utility_classes.merge(m),
                AnalyzerMetrics::Tokens(m) => metrics.tokens.merge(m),
                AnalyzerMetrics::None => {}
            }
            violations.extend(analysis.violations);
        }
        if !components.is_empty() {
            metrics.analyzers_run += self.component_analyzers.len();
        }

        // Semantic batch over the typed files
        let typed: Vec<Arc<SourceFile>> = files
            .typed
            .iter()
            .filter_map(|p| parsed.get(p).cloned())
            .collect();
        if !typed.is_empty() {
            violations.extend(self.run_semantic(&root, typed));
            metrics.analyzers_run += 1;
        }

        // Project-wide checks over every parsed source
        let all: Vec<&SourceFile> = parsed.values().map(|f| f.as_ref()).collect();
        let tokens = TokenAnalyzer::new(self.config.clone(), self.tables.clone());
        match catch_unwind(AssertUnwindSafe(|| tokens.unused_tokens(&all))) {
            Ok(found) => violations.extend(found),
            Err(panic) => violations.push(analyzer_error(tokens.name(), &root, &root, &panic_message(panic))),
        }

        let graph = ImportGraphAnalyzer::new(self.config.clone());
        let graph_result = catch_unwind(AssertUnwindSafe(|| {
            let resolver = project_resolver(&root);
            graph.analyze(&root, &all, &resolver)
        }));
        match graph_result {
            Ok((found, graph_metrics)) => {
                violations.extend(found);
                metrics.import_graph = graph_metrics;
            }
            Err(panic) => violations.push(analyzer_error("import-graph", &root, &root, &panic_message(panic))),
        }
        metrics.analyzers_run += 1;

        metrics.analyze_time_ms = started.elapsed().as_millis() as u64;
        let report = AnalysisReport::new(root.display().to_string(), metrics, violations);
        info!(
            files = report.metrics.files_analyzed,
            errors = report.summary.error_count,
            warnings = report.summary.warning_count,
            blocked = report.summary.blocked,
            elapsed_ms = report.metrics.analyze_time_ms,
            "gate run finished"
        );
        Ok(report)
    }

    /// Parses every source once. Each failure is reported as a single
    /// `PARSE_ERROR` and the file is left out of every analyzer.
    fn parse_all(&self, sources: &[PathBuf], violations: &mut Vec<Violation>) -> BTreeMap<PathBuf, Arc<SourceFile>> {
        let results: Vec<(&PathBuf, Result<SourceFile, _>)> =
            sources.par_iter().map(|p| (p, SourceFile::load(p))).collect();

        let mut parsed = BTreeMap::new();
        for (path, result) in results {
            match result {
                Ok(file) => {
                    parsed.insert(path.clone(), Arc::new(file));
                }
                Err(failure) => {
                    debug!(file = %path.display(), error = %failure, "parse failed");
                    violations.push(parse_error(path, &failure));
                }
            }
        }
        parsed
    }

    fn run_semantic(&self, root: &Path, typed: Vec<Arc<SourceFile>>) -> Vec<Violation> {
        let analyzer = SemanticAnalyzer::new(self.config.clone(), self.tables.clone());
        let program = match catch_unwind(AssertUnwindSafe(|| Program::build(root, typed))) {
            Ok(program) => program,
            Err(panic) => return vec![analyzer_error(analyzer.name(), root, root, &panic_message(panic))],
        };

        let mut violations = analyzer.analyze_project(&program);
        let per_file: Vec<Vec<Violation>> = program
            .files()
            .par_iter()
            .map(|file| match catch_unwind(AssertUnwindSafe(|| analyzer.analyze_file(&program, file))) {
                Ok(Ok(found)) => found,
                Ok(Err(e)) => vec![analyzer_error(analyzer.name(), &file.path, root, &format!("{:#}", e))],
                Err(panic) => vec![analyzer_error(analyzer.name(), &file.path, root, &panic_message(panic))],
            })
            .collect();
        violations.extend(per_file.into_iter().flatten());
        violations
    }
}

impl Default for GateEngine {
    fn default() -> Self {
        Self::new(GateConfig::default(), RuleTables::default())
    }
}

/// `ANALYZER_ERROR` warning for a fault in `analyzer` while handling
/// `target`. A fault on the project root is project-level and has no file.
fn analyzer_error(analyzer: &str, target: &Path, root: &Path, reason: &str) -> Violation {
    warn!(analyzer, file = %target.display(), reason, "analyzer failed");
    if target == root {
        return Violation::warning("ANALYZER_ERROR", format!("{} analyzer failed: {}", analyzer, reason));
    }
    let message = format!("{} analyzer failed on {}: {}", analyzer, relative_display(target, root), reason);
    Violation::warning("ANALYZER_ERROR", message).in_file(target)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    const STRICT: &str = r#"{ "compilerOptions": { "strict": true } }"#;

    fn rules(report: &AnalysisReport) -> Vec<&str> {
        report.violations.iter().map(|v| v.rule.as_str()).collect()
    }

    #[test]
    fn test_clean_project_passes() {
        let dir = project(&[
            ("tsconfig.json", STRICT),
            (
                "src/Hero.tsx",
                "export function Hero() {\n  return <section id=\"hero\" className=\"flex p-4\"><h1 className=\"text-4xl\">Hi</h1></section>;\n}\n",
            ),
        ]);
        let report = GateEngine::default().run(dir.path()).unwrap();
        assert!(!report.is_blocked(), "unexpected: {:?}", rules(&report));
        assert_eq!(report.metrics.files_analyzed, 1);
        assert_eq!(report.metrics.component_files_analyzed, 1);
        assert_eq!(report.metrics.type_script_files_analyzed, 1);
        assert_eq!(report.metrics.analyzers_run, 5);
    }

    #[test]
    fn test_inline_color_blocks() {
        let dir = project(&[
            ("tsconfig.json", STRICT),
            ("src/Box.tsx", "export const Box = () => <div style={{ color: \"#ff0000\" }} />;\n"),
        ]);
        let report = GateEngine::default().run(dir.path()).unwrap();
        assert!(report.is_blocked());
        assert!(rules(&report).contains(&"NO_HARDCODED_COLORS"));
        assert_eq!(report.summary.blocked, report.errors().next().is_some());
    }

    #[test]
    fn test_parse_error_reported_once() {
        let dir = project(&[
            ("tsconfig.json", STRICT),
            ("src/Broken.tsx", "export const Broken = () => <div>;\n"),
            ("src/ok.ts", "export const ok = 1;\n"),
        ]);
        let report = GateEngine::default().run(dir.path()).unwrap();
        let parse_errors: Vec<&Violation> =
            report.violations.iter().filter(|v| v.rule == "PARSE_ERROR").collect();
        assert_eq!(parse_errors.len(), 1);
        assert!(parse_errors[0].file.as_deref().unwrap().ends_with("Broken.tsx"));
        assert_eq!(report.metrics.files_analyzed, 2);
    }

    #[test]
    fn test_strict_flag_unset_blocks() {
        let dir = project(&[
            ("tsconfig.json", r#"{ "compilerOptions": {} }"#),
            ("src/util.ts", "export const one = (): number => 1;\n"),
        ]);
        let report = GateEngine::default().run(dir.path()).unwrap();
        assert_eq!(rules(&report), vec!["STRICT_MODE_CHECK"]);
        assert!(report.is_blocked());
    }

    #[test]
    fn test_mutual_imports_report_graph_cycle_once() {
        let dir = project(&[
            ("tsconfig.json", STRICT),
            ("a.ts", "import { b } from './b';\nexport const a = (): number => b;\n"),
            ("b.ts", "import { a } from './a';\nexport const b = 1;\nexport const c = a;\n"),
        ]);
        let report = GateEngine::default().run(dir.path()).unwrap();
        let found = rules(&report);
        assert_eq!(found.iter().filter(|r| **r == "CIRCULAR_DEPENDENCY").count(), 1);
        assert_eq!(found.iter().filter(|r| **r == "NO_CIRCULAR_IMPORTS").count(), 2);
        assert_eq!(report.metrics.import_graph.circular_dependencies, 1);
    }

    struct Exploding;

    impl StaticAnalyzer for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        fn analyze(&self, _file: &SourceFile) -> FileAnalysis {
            panic!("rule blew up");
        }
    }

    #[test]
    fn test_analyzer_fault_becomes_warning() {
        let dir = project(&[
            ("tsconfig.json", STRICT),
            ("src/Card.tsx", "export const Card = () => <div className=\"p-4\" />;\n"),
        ]);
        let engine = GateEngine::default().with_analyzer(Box::new(Exploding));
        let report = engine.run(dir.path()).unwrap();
        let fault = report
            .violations
            .iter()
            .find(|v| v.rule == "ANALYZER_ERROR")
            .expect("fault reported");
        assert!(!fault.is_error());
        assert_eq!(fault.message, "exploding analyzer failed on src/Card.tsx: rule blew up");
        assert!(!report.is_blocked());
    }

    #[test]
    fn test_project_level_fault_has_no_file() {
        let root = Path::new("/proj");
        let fault = analyzer_error("import-graph", root, root, "boom");
        assert_eq!(fault.message, "import-graph analyzer failed: boom");
        assert!(fault.file.is_none());

        let scoped = analyzer_error("semantic", &root.join("src/a.ts"), root, "boom");
        assert_eq!(scoped.file.as_deref(), Some("/proj/src/a.ts"));
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(GateEngine::default().run(&dir.path().join("nope")).is_err());
    }
}
