//! Type-level rules over the typed files of a project, run as one batch
//! against a shared [`Program`].

pub mod checks;
pub mod implicit_any;
pub mod program;

pub use program::Program;

use crate::config::GateConfig;
use crate::rules::Violation;
use crate::rules::syntax::SourceFile;
use crate::rules::tables::RuleTables;

pub struct SemanticAnalyzer {
    config: GateConfig,
    tables: RuleTables,
}

impl SemanticAnalyzer {
    pub fn new(config: GateConfig, tables: RuleTables) -> Self {
        Self { config, tables }
    }

    pub fn name(&self) -> &'static str {
        "semantic"
    }

    /// Project-scoped checks that run once per batch, whatever the files
    /// contain.
    pub fn analyze_project(&self, program: &Program) -> Vec<Violation> {
        checks::strict_mode(program)
    }

    /// Every per-file rule, in a fixed order. Violations carry the file path.
    pub fn analyze_file(&self, program: &Program, file: &SourceFile) -> anyhow::Result<Vec<Violation>> {
        let mut violations = checks::explicit_any(file)?;
        violations.extend(checks::implicit_any(file, program, &self.tables));
        violations.extend(checks::unused_imports(file));
        violations.extend(checks::anonymous_default_export(file));
        violations.extend(checks::deep_nesting(file, &self.config));
        violations.extend(checks::prop_drilling(file, &self.config));
        violations.extend(checks::duplicated_types(file));
        violations.extend(checks::circular_imports(file, program));
        Ok(violations.into_iter().map(|v| v.in_file(&file.path)).collect())
    }

    /// The whole batch: project checks, then each file in program order.
    pub fn analyze(&self, program: &Program) -> anyhow::Result<Vec<Violation>> {
        let mut violations = self.analyze_project(program);
        for file in program.files() {
            violations.extend(self.analyze_file(program, file)?);
        }
        Ok(violations)
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new(GateConfig::default(), RuleTables::default())
    }
}
