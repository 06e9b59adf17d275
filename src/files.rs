//! # Source discovery
//!
//! Walks a project root and returns the files the gate analyzes, split into
//! the sets each analyzer consumes.

use crate::config::GateConfig;
use crate::rules::languages::{SourceKind, is_component_file, is_typed_file};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Files discovered under one project root, sorted by path.
#[derive(Debug, Default, Clone)]
pub struct ProjectFiles {
    /// Every parseable source file (TS, TSX, JS, JSX).
    pub sources: Vec<PathBuf>,
    /// `.tsx`/`.jsx` files: structural, utility-class and token analyzers.
    pub components: Vec<PathBuf>,
    /// `.ts`/`.tsx` files (no declaration files): semantic analyzer batch.
    pub typed: Vec<PathBuf>,
}

/// Collects eligible source files under `root`.
///
/// # Arguments
/// * `root` - Absolute project directory
/// * `config` - Supplies the dependency/build directory names to skip
///
/// Hidden directories are skipped, `.gitignore` is honoured, and any path
/// component listed in `config.ignore_dirs` excludes the whole subtree.
pub fn discover(root: &Path, config: &GateConfig) -> ProjectFiles {
    let ignore_dirs = config.ignore_dirs.clone();
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_str().unwrap_or("");
            !ignore_dirs.iter().any(|d| d == name)
        })
        .build();

    let mut sources = Vec::new();
    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        if SourceKind::from_path(path).is_some() && !is_declaration_file(path) {
            sources.push(path.to_path_buf());
        }
    }
    sources.sort();

    let components = sources.iter().filter(|p| is_component_file(p)).cloned().collect();
    let typed = sources.iter().filter(|p| is_typed_file(p)).cloned().collect();
    debug!(count = sources.len(), root = %root.display(), "discovered source files");

    ProjectFiles {
        sources,
        components,
        typed,
    }
}

fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with(".d.ts"))
        .unwrap_or(false)
}

/// Path relative to `root` with forward slashes, for display.
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_skips_dependency_and_hidden_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for rel in [
            "src/App.tsx",
            "src/util.ts",
            "src/legacy.js",
            "src/types.d.ts",
            "src/styles.css",
            "node_modules/pkg/index.js",
            ".next/server/page.js",
            ".cache/x.ts",
            "dist/bundle.js",
        ] {
            let p = root.join(rel);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(&p, "export {};\n").unwrap();
        }

        let files = discover(root, &GateConfig::default());
        let rel: Vec<String> = files.sources.iter().map(|p| relative_display(p, root)).collect();
        assert_eq!(rel, vec!["src/App.tsx", "src/legacy.js", "src/util.ts"]);
        assert_eq!(files.components.len(), 1);
        assert_eq!(files.typed.len(), 2);
    }
}
