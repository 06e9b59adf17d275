//! Module specifier resolution: relative paths and `paths` aliases, with
//! extension and `index` fallbacks. Bare package specifiers resolve to
//! nothing.

use crate::config::CompilerOptions;
use std::path::{Component, Path, PathBuf};

pub const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// `(prefix, base directory)`, longest prefix first.
    aliases: Vec<(String, PathBuf)>,
}

impl ModuleResolver {
    /// Builds the alias table from compiler options. Without declared
    /// `paths` the conventional `@` -> `<root>/src` mapping applies.
    pub fn new(root: &Path, options: Option<&CompilerOptions>) -> Self {
        let mut aliases: Vec<(String, PathBuf)> = Vec::new();
        if let Some(options) = options {
            let base = options
                .paths_base
                .clone()
                .unwrap_or_else(|| root.to_path_buf());
            for (pattern, targets) in &options.paths {
                let Some(target) = targets.first() else { continue };
                let prefix = pattern.trim_end_matches("/*").trim_end_matches('*');
                let target = target.trim_end_matches("/*").trim_end_matches('*');
                if prefix.is_empty() {
                    continue;
                }
                aliases.push((prefix.to_string(), normalize_path(&base.join(target))));
            }
        }
        if aliases.is_empty() {
            aliases.push(("@".to_string(), root.join("src")));
        }
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { aliases }
    }

    pub fn aliases(&self) -> &[(String, PathBuf)] {
        &self.aliases
    }

    /// Candidate path for `specifier` before touching the filesystem, or
    /// `None` for package imports.
    pub fn candidate(&self, specifier: &str, from_file: &Path) -> Option<PathBuf> {
        if specifier.starts_with('.') {
            let dir = from_file.parent().unwrap_or(Path::new(""));
            return Some(normalize_path(&dir.join(specifier)));
        }
        for (alias, base) in &self.aliases {
            if specifier == alias {
                return Some(base.clone());
            }
            if let Some(rest) = specifier.strip_prefix(alias.as_str()) {
                if let Some(rest) = rest.strip_prefix('/') {
                    return Some(normalize_path(&base.join(rest)));
                }
            }
        }
        None
    }

    /// Existing file `specifier` refers to when imported from `from_file`.
    pub fn resolve(&self, specifier: &str, from_file: &Path) -> Option<PathBuf> {
        resolve_file(&self.candidate(specifier, from_file)?)
    }
}

/// Exact file, then with a source extension appended, then a `.js`-style
/// specifier mapped onto its TypeScript sibling, then `index.*`.
pub fn resolve_file(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    let file_name = candidate.file_name()?.to_string_lossy().into_owned();
    for ext in RESOLVE_EXTENSIONS {
        let with_ext = candidate.with_file_name(format!("{}.{}", file_name, ext));
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    let js_like = candidate
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "js" | "jsx" | "mjs" | "cjs"));
    if js_like {
        for ext in ["ts", "tsx"] {
            let sibling = candidate.with_extension(ext);
            if sibling.is_file() {
                return Some(sibling);
            }
        }
    }
    if candidate.is_dir() {
        for ext in RESOLVE_EXTENSIONS {
            let index = candidate.join(format!("index.{}", ext));
            if index.is_file() {
                return Some(index);
            }
        }
    }
    None
}

/// Lexically removes `.` and `..` components without touching the disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, "export {};\n").unwrap();
        p
    }

    #[test]
    fn test_relative_resolution_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let from = touch(root, "src/app/page.tsx");
        let button = touch(root, "src/ui/button.tsx");
        let index = touch(root, "src/lib/index.ts");
        let util = touch(root, "src/util.ts");

        let resolver = ModuleResolver::new(root, None);
        assert_eq!(resolver.resolve("../ui/button", &from), Some(button));
        assert_eq!(resolver.resolve("../lib", &from), Some(index));
        assert_eq!(resolver.resolve("../util.js", &from), Some(util));
        assert_eq!(resolver.resolve("react", &from), None);
        assert_eq!(resolver.resolve("./missing", &from), None);
    }

    #[test]
    fn test_default_alias_maps_to_src() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let from = touch(root, "app/page.tsx");
        let target = touch(root, "src/components/Hero.tsx");
        let resolver = ModuleResolver::new(root, None);
        assert_eq!(resolver.resolve("@/components/Hero", &from), Some(target));
    }

    #[test]
    fn test_declared_paths_replace_default() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let from = touch(root, "src/page.tsx");
        let target = touch(root, "lib/ui/Card.tsx");
        let mut paths = BTreeMap::new();
        paths.insert("~ui/*".to_string(), vec!["lib/ui/*".to_string()]);
        let options = CompilerOptions {
            paths,
            paths_base: Some(root.to_path_buf()),
            ..CompilerOptions::default()
        };
        let resolver = ModuleResolver::new(root, Some(&options));
        assert_eq!(resolver.resolve("~ui/Card", &from), Some(target));
        assert_eq!(resolver.resolve("@/page", &from), None);
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/./c/../d")),
            PathBuf::from("/a/b/d")
        );
    }
}
