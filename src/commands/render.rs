use crate::config::GATE_VERSION;
use crate::rules::report::{AnalysisReport, SeverityFilter};
use crate::rules::tables::RULE_CATALOG;
use crate::rules::{Severity, Violation};
use colored::*;
use std::fmt::Write as _;
use std::path::Path;

/// Location column of a human-readable line: `src/a.tsx:12:5`, or
/// `[project-level]` for violations without a file.
fn short_location(v: &Violation, project_dir: &str) -> String {
    let Some(file) = v.file.as_deref() else {
        return "[project-level]".to_string();
    };
    let short = Path::new(file)
        .strip_prefix(project_dir)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| file.to_string());
    match (v.line, v.column) {
        (Some(line), Some(column)) => format!("{}:{}:{}", short, line, column),
        _ => short,
    }
}

/// Multi-line summary: header, errors (always), warnings (unless filtered
/// out), and the final gate line.
pub fn render_human(report: &AnalysisReport, filter: SeverityFilter) -> String {
    let mut out = String::new();
    let m = &report.metrics;

    let _ = writeln!(out, "\n{}", format!("BRUDI AST GATE v{}", report.version).bold());
    let _ = writeln!(out, "   Project: {}", report.project_dir);
    let _ = writeln!(
        out,
        "   Files: {} ({} components, {} TypeScript)",
        m.files_analyzed, m.component_files_analyzed, m.type_script_files_analyzed
    );
    let _ = writeln!(out, "   Time: {}ms", m.analyze_time_ms);
    let _ = writeln!(out, "   Analyzers: {}/5\n", m.analyzers_run);

    let errors: Vec<&Violation> = report.errors().collect();
    if !errors.is_empty() && filter.shows(Severity::Error) {
        let _ = writeln!(out, "{}", format!("{} ERROR(s) — BLOCKING", errors.len()).red().bold());
        for v in errors {
            let _ = writeln!(
                out,
                "   {} [{}] {} — {}",
                "x".red(),
                v.rule.yellow(),
                short_location(v, &report.project_dir),
                v.message
            );
        }
        out.push('\n');
    }

    let warnings: Vec<&Violation> = report.warnings().collect();
    if !warnings.is_empty() && filter.shows(Severity::Warning) {
        let _ = writeln!(out, "{}", format!("{} WARNING(s)", warnings.len()).yellow().bold());
        for v in warnings {
            let _ = writeln!(
                out,
                "   {} [{}] {} — {}",
                "!".yellow(),
                v.rule.yellow(),
                short_location(v, &report.project_dir),
                v.message
            );
        }
        out.push('\n');
    }

    if report.is_blocked() {
        let _ = writeln!(
            out,
            "{}",
            format!("AST GATE: BLOCKED ({} errors)", report.summary.error_count).red().bold()
        );
    } else {
        let _ = writeln!(
            out,
            "{}",
            format!("AST GATE: PASSED ({} warnings)", report.summary.warning_count).green().bold()
        );
    }
    out
}

pub fn render_json(report: &AnalysisReport) -> anyhow::Result<String> {
    report.to_json()
}

/// Renders a SARIF 2.1.0 log of every violation. Project-level findings are
/// anchored to the project directory.
pub fn render_sarif(report: &AnalysisReport) -> String {
    let mut seen_rules: Vec<&str> = Vec::new();
    for v in &report.violations {
        if !seen_rules.contains(&v.rule.as_str()) {
            seen_rules.push(&v.rule);
        }
    }

    let rules_json: Vec<serde_json::Value> = seen_rules
        .iter()
        .map(|id| {
            let description = RULE_CATALOG
                .iter()
                .find(|r| r.id == *id)
                .map(|r| r.description)
                .unwrap_or(*id);
            serde_json::json!({
                "id": id,
                "shortDescription": { "text": description }
            })
        })
        .collect();

    let results_json: Vec<serde_json::Value> = report
        .violations
        .iter()
        .map(|v| {
            let level = match v.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            let uri = v
                .file
                .as_deref()
                .map(|f| {
                    Path::new(f)
                        .strip_prefix(&report.project_dir)
                        .map(|p| p.to_string_lossy().replace('\\', "/"))
                        .unwrap_or_else(|_| f.to_string())
                })
                .unwrap_or_else(|| ".".to_string());
            serde_json::json!({
                "ruleId": v.rule,
                "level": level,
                "message": { "text": v.message },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": uri,
                            "uriBaseId": "%SRCROOT%"
                        },
                        "region": {
                            "startLine": v.line.unwrap_or(1),
                            "startColumn": v.column.unwrap_or(1)
                        }
                    }
                }]
            })
        })
        .collect();

    let sarif = serde_json::json!({
        "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "brudi-gate",
                    "version": GATE_VERSION,
                    "rules": rules_json
                }
            },
            "results": results_json
        }]
    });

    serde_json::to_string_pretty(&sarif).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::report::ReportMetrics;

    fn report() -> AnalysisReport {
        let violations = vec![
            Violation::error("NO_INLINE_STYLES", "Inline styles are not allowed")
                .at((3, 7))
                .in_file(Path::new("/proj/src/Hero.tsx")),
            Violation::warning("DEEP_IMPORT_CHAIN", "Import chain depth is 6, exceeds max of 4 levels"),
        ];
        AnalysisReport::new("/proj".to_string(), ReportMetrics::default(), violations)
    }

    #[test]
    fn test_human_output_groups_and_filters() {
        colored::control::set_override(false);
        let all = render_human(&report(), SeverityFilter::All);
        assert!(all.contains("1 ERROR(s) — BLOCKING"));
        assert!(all.contains("[NO_INLINE_STYLES] src/Hero.tsx:3:7 — Inline styles are not allowed"));
        assert!(all.contains("[DEEP_IMPORT_CHAIN] [project-level] — Import chain depth"));
        assert!(all.contains("AST GATE: BLOCKED (1 errors)"));

        let errors_only = render_human(&report(), SeverityFilter::Error);
        assert!(errors_only.contains("NO_INLINE_STYLES"));
        assert!(!errors_only.contains("DEEP_IMPORT_CHAIN"));
    }

    #[test]
    fn test_human_output_passed_line() {
        colored::control::set_override(false);
        let passing = AnalysisReport::new(
            "/proj".to_string(),
            ReportMetrics::default(),
            vec![Violation::warning("NO_HARDCODED_PX", "px").at((1, 1)).in_file(Path::new("/proj/a.tsx"))],
        );
        assert!(render_human(&passing, SeverityFilter::All).contains("AST GATE: PASSED (1 warnings)"));
    }

    #[test]
    fn test_render_sarif_produces_valid_structure() {
        let sarif = render_sarif(&report());
        let parsed: serde_json::Value = serde_json::from_str(&sarif).expect("must be valid JSON");
        assert_eq!(parsed["version"], "2.1.0");
        let results = &parsed["runs"][0]["results"];
        assert_eq!(results[0]["ruleId"], "NO_INLINE_STYLES");
        assert_eq!(results[0]["level"], "error");
        assert_eq!(
            results[0]["locations"][0]["physicalLocation"]["artifactLocation"]["uri"],
            "src/Hero.tsx"
        );
        assert_eq!(results[0]["locations"][0]["physicalLocation"]["region"]["startLine"], 3);
        assert_eq!(results[1]["level"], "warning");
        assert_eq!(parsed["runs"][0]["tool"]["driver"]["rules"].as_array().unwrap().len(), 2);
    }
}
