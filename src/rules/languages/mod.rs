use std::path::Path;
use tree_sitter::Language;

/// Source flavours the gate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    TypeScript,
    Tsx,
    JavaScript,
}

impl SourceKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" | "cts" => Some(SourceKind::TypeScript),
            "tsx" => Some(SourceKind::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(SourceKind::JavaScript),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the tree-sitter grammar for this flavour. The JavaScript
    /// grammar already understands JSX.
    pub fn language(self) -> Language {
        match self {
            SourceKind::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceKind::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            SourceKind::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// Files that may contain JSX and are checked by the per-file analyzers.
pub fn is_component_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx" | "jsx")
    )
}

/// Files handed to the semantic (type-level) analyzer.
pub fn is_typed_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "mts" | "cts")
    ) && !path.to_string_lossy().ends_with(".d.ts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(SourceKind::from_extension("tsx"), Some(SourceKind::Tsx));
        assert_eq!(SourceKind::from_extension("ts"), Some(SourceKind::TypeScript));
        assert_eq!(SourceKind::from_extension("jsx"), Some(SourceKind::JavaScript));
        assert_eq!(SourceKind::from_extension("go"), None);
    }

    #[test]
    fn test_partitions() {
        assert!(is_component_file(Path::new("src/hero.tsx")));
        assert!(!is_component_file(Path::new("src/tokens.ts")));
        assert!(is_typed_file(Path::new("src/hero.tsx")));
        assert!(is_typed_file(Path::new("src/tokens.ts")));
        assert!(!is_typed_file(Path::new("src/env.d.ts")));
        assert!(!is_typed_file(Path::new("src/legacy.jsx")));
    }
}
