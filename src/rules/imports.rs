//! Top-level `import` declarations of a parsed file.

use crate::rules::syntax::{NodeKind, SourceFile, location, named_children};
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Exported name in the source module (`default` for default imports,
    /// `*` for namespace imports).
    pub imported: String,
    /// Local name bound in this file.
    pub local: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub source: String,
    pub bindings: Vec<ImportBinding>,
    pub type_only: bool,
    pub line: usize,
    pub column: usize,
}

pub fn top_level_imports(file: &SourceFile) -> Vec<ImportDecl> {
    named_children(file.root())
        .into_iter()
        .filter(|n| NodeKind::of(n) == NodeKind::ImportStatement)
        .filter_map(|n| import_decl(file, n))
        .collect()
}

fn import_decl(file: &SourceFile, statement: Node<'_>) -> Option<ImportDecl> {
    let source_node = statement.child_by_field_name("source")?;
    let source = file.string_value(source_node)?;
    let (line, column) = location(statement);

    let mut cursor = statement.walk();
    let type_only = statement
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == "type");

    let mut bindings = Vec::new();
    for clause in named_children(statement) {
        if NodeKind::of(&clause) != NodeKind::ImportClause {
            continue;
        }
        for part in named_children(clause) {
            match NodeKind::of(&part) {
                NodeKind::Identifier => bindings.push(binding(file, "default", part)),
                NodeKind::NamespaceImport => {
                    if let Some(id) = named_children(part)
                        .into_iter()
                        .find(|c| NodeKind::of(c) == NodeKind::Identifier)
                    {
                        bindings.push(binding(file, "*", id));
                    }
                }
                _ if part.kind() == "named_imports" => {
                    for spec in named_children(part) {
                        if NodeKind::of(&spec) != NodeKind::ImportSpecifier {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else { continue };
                        let imported = file
                            .string_value(name)
                            .unwrap_or_else(|| file.text(name).to_string());
                        let local = spec.child_by_field_name("alias").unwrap_or(name);
                        bindings.push(binding(file, &imported, local));
                    }
                }
                _ => {}
            }
        }
    }

    Some(ImportDecl {
        source,
        bindings,
        type_only,
        line,
        column,
    })
}

fn binding(file: &SourceFile, imported: &str, local: Node<'_>) -> ImportBinding {
    let (line, column) = location(local);
    ImportBinding {
        imported: imported.to_string(),
        local: file.text(local).to_string(),
        line,
        column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::syntax::parse_snippet;

    #[test]
    fn test_binding_shapes() {
        let file = parse_snippet(
            "a.ts",
            "import React, { useState as useS, type FC } from 'react';\nimport * as ui from \"./ui\";\nimport type { Props } from './types';\nimport './global.css';\nfunction f() {}\n",
        );
        let imports = top_level_imports(&file);
        assert_eq!(imports.len(), 4);

        let locals: Vec<(&str, &str)> = imports[0]
            .bindings
            .iter()
            .map(|b| (b.imported.as_str(), b.local.as_str()))
            .collect();
        assert_eq!(locals, vec![("default", "React"), ("useState", "useS"), ("FC", "FC")]);
        assert_eq!(imports[1].bindings[0].local, "ui");
        assert_eq!(imports[1].bindings[0].imported, "*");
        assert!(imports[2].type_only);
        assert!(!imports[0].type_only);
        assert!(imports[3].bindings.is_empty());
        assert_eq!(imports[3].source, "./global.css");
    }
}
