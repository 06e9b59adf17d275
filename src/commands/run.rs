use super::OutputFormat;
use super::render::{render_human, render_json, render_sarif};
use crate::rules::{AnalysisReport, GateEngine, SeverityFilter};
use colored::*;
use std::path::Path;
use tracing::error;

pub const EXIT_PASSED: i32 = 0;
pub const EXIT_BLOCKED: i32 = 1;
/// Missing project directory, or any failure to analyze or render.
pub const EXIT_FAILURE: i32 = 2;

/// Runs the gate and prints the report. Returns the process exit code.
pub fn handle_run(project_dir: &Path, format: OutputFormat, severity: SeverityFilter) -> i32 {
    if !project_dir.is_dir() {
        eprintln!(
            "{} Project directory not found: {}",
            "error:".red().bold(),
            project_dir.display()
        );
        return EXIT_FAILURE;
    }

    let report = match analyze(project_dir) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %format!("{:#}", e), "gate run failed");
            eprintln!("{} {:#}", "error:".red().bold(), e);
            return EXIT_FAILURE;
        }
    };

    let rendered = match format {
        OutputFormat::Json => render_json(&report),
        OutputFormat::Sarif => Ok(render_sarif(&report)),
        OutputFormat::Human => Ok(render_human(&report, severity)),
    };
    emit(rendered, &report)
}

/// Prints the rendered report and picks the exit code. A render failure is
/// fatal regardless of the gate decision.
fn emit(rendered: anyhow::Result<String>, report: &AnalysisReport) -> i32 {
    match rendered {
        Ok(output) => {
            println!("{}", output.trim_end_matches('\n'));
            exit_code(report)
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "report rendering failed");
            eprintln!("{} {:#}", "error:".red().bold(), e);
            EXIT_FAILURE
        }
    }
}

pub fn analyze(project_dir: &Path) -> anyhow::Result<AnalysisReport> {
    GateEngine::for_project(project_dir)?.run(project_dir)
}

pub fn exit_code(report: &AnalysisReport) -> i32 {
    if report.is_blocked() { EXIT_BLOCKED } else { EXIT_PASSED }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::report::ReportMetrics;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dir_exits_2() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(handle_run(&missing, OutputFormat::Json, SeverityFilter::All), EXIT_FAILURE);
    }

    #[test]
    fn test_render_failure_exits_2() {
        let report = AnalysisReport::new("/p".to_string(), ReportMetrics::default(), Vec::new());
        assert_eq!(emit(Err(anyhow::anyhow!("serialization failed")), &report), EXIT_FAILURE);
        assert_eq!(emit(Ok("{}".to_string()), &report), EXIT_PASSED);
    }

    #[test]
    fn test_exit_code_tracks_errors() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("Box.jsx"), "export const Box = () => <div className=\"p-4\" />;\n").unwrap();
        let report = analyze(dir.path()).unwrap();
        assert_eq!(exit_code(&report), EXIT_PASSED);

        fs::write(
            src.join("Box.jsx"),
            "export const Box = () => <div style={{ color: 'red' }} />;\n",
        )
        .unwrap();
        let report = analyze(dir.path()).unwrap();
        assert_eq!(exit_code(&report), EXIT_BLOCKED);
    }
}
