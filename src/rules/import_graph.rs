//! Project-wide import graph checks: cycles, chain depth, fan-in and the
//! shared primitives directory.

use crate::config::GateConfig;
use crate::files::relative_display;
use crate::rules::Violation;
use crate::rules::graph::DependencyGraph;
use crate::rules::imports::{ImportDecl, top_level_imports};
use crate::rules::resolve::ModuleResolver;
use crate::rules::syntax::{NodeKind, SourceFile, location, named_children, walk_preorder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use tree_sitter::Node;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportGraphMetrics {
    pub file_count: usize,
    pub edge_count: usize,
    pub circular_dependencies: usize,
    pub max_import_depth: usize,
}

pub struct ImportGraphAnalyzer {
    config: GateConfig,
}

impl ImportGraphAnalyzer {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        root: &Path,
        files: &[&SourceFile],
        resolver: &ModuleResolver,
    ) -> (Vec<Violation>, ImportGraphMetrics) {
        let graph = DependencyGraph::build(files.iter().copied(), resolver);
        let mut violations = Vec::new();

        let cycles = graph.cycles();
        for cycle in &cycles {
            let rendered: Vec<String> = cycle.iter().map(|p| relative_display(p, root)).collect();
            violations.push(Violation::error(
                "CIRCULAR_DEPENDENCY",
                format!("Circular dependency detected: {}", rendered.join(" -> ")),
            ));
        }

        let max_depth = graph.longest_chain();
        let limit = self.config.thresholds.max_import_depth;
        if max_depth > limit {
            violations.push(Violation::warning(
                "DEEP_IMPORT_CHAIN",
                format!("Import chain depth is {}, exceeds max of {} levels", max_depth, limit),
            ));
        }

        let primitives_dir = root.join(&self.config.primitives_dir);
        let imports: Vec<(&SourceFile, Vec<ImportDecl>)> =
            files.iter().map(|f| (*f, top_level_imports(f))).collect();

        if primitives_dir.is_dir() {
            let used = imports.iter().any(|(file, decls)| {
                decls
                    .iter()
                    .any(|d| self.is_primitives_import(&d.source, &file.path, &primitives_dir, resolver))
            });
            if !used {
                violations.push(Violation::warning(
                    "PRIMITIVES_NOT_USED",
                    format!(
                        "{}/ directory exists but is not imported anywhere",
                        self.config.primitives_dir.trim_end_matches('/')
                    ),
                ));
            }
        }

        for (file, decls) in &imports {
            if file.path.starts_with(&primitives_dir) {
                continue;
            }
            if let Some(v) = self.overwritten_primitives(root, file, decls, &primitives_dir, resolver) {
                violations.push(v);
            }
        }

        let fan_in_limit = self.config.thresholds.max_import_fan_in;
        for (target, count) in graph.fan_in() {
            if count > fan_in_limit {
                let name = target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                violations.push(
                    Violation::warning(
                        "DUPLICATE_IMPORT",
                        format!("Module \"{}\" is imported in {} files. Consider re-exporting.", name, count),
                    )
                    .in_file(target),
                );
            }
        }

        let metrics = ImportGraphMetrics {
            file_count: graph.file_count(),
            edge_count: graph.edge_count(),
            circular_dependencies: cycles.len(),
            max_import_depth: max_depth,
        };
        (violations, metrics)
    }

    fn is_primitives_import(
        &self,
        source: &str,
        from: &Path,
        primitives_dir: &Path,
        resolver: &ModuleResolver,
    ) -> bool {
        if source.contains("/primitives") || source.starts_with("primitives/") || source == "primitives" {
            return true;
        }
        resolver
            .candidate(source, from)
            .is_some_and(|c| c.starts_with(primitives_dir))
    }

    /// Names a file takes from the primitives directory and exports again,
    /// either directly or wrapped in its own component.
    fn overwritten_primitives(
        &self,
        root: &Path,
        file: &SourceFile,
        decls: &[ImportDecl],
        primitives_dir: &Path,
        resolver: &ModuleResolver,
    ) -> Option<Violation> {
        let imported: BTreeSet<String> = decls
            .iter()
            .filter(|d| self.is_primitives_import(&d.source, &file.path, primitives_dir, resolver))
            .flat_map(|d| d.bindings.iter().map(|b| b.local.clone()))
            .collect();

        let mut overwritten: Vec<String> = Vec::new();
        let mut first_at: Option<(usize, usize)> = None;
        let mut note = |entry: String, node: Node<'_>| {
            if !overwritten.contains(&entry) {
                overwritten.push(entry);
            }
            first_at.get_or_insert(location(node));
        };

        for export in named_children(file.root())
            .into_iter()
            .filter(|n| NodeKind::of(n) == NodeKind::ExportStatement)
        {
            let source = export
                .child_by_field_name("source")
                .and_then(|s| file.string_value(s));
            let is_default = has_default_keyword(export);

            if let Some(source) = source {
                if self.is_primitives_import(&source, &file.path, primitives_dir, resolver) {
                    for (local, exported) in export_specifiers(file, export) {
                        note(exported.unwrap_or(local), export);
                    }
                }
                continue;
            }
            if imported.is_empty() {
                continue;
            }

            for (local, exported) in export_specifiers(file, export) {
                if imported.contains(&local) {
                    note(exported.unwrap_or(local), export);
                }
            }

            if let Some(value) = export.child_by_field_name("value") {
                if NodeKind::of(&value) == NodeKind::Identifier && imported.contains(file.text(value)) {
                    note("default".to_string(), export);
                }
            }

            if let Some(declaration) = export.child_by_field_name("declaration") {
                for (name, body) in declared_components(file, declaration) {
                    if imported.contains(&name) {
                        note(name.clone(), export);
                        continue;
                    }
                    let label = if is_default { "default".to_string() } else { name.clone() };
                    for wrapped in rendered_primitives(file, body, &imported) {
                        if name_wraps(&name, &wrapped) {
                            note(format!("{} (wraps {})", label, wrapped), export);
                        }
                    }
                }
            }
        }

        if overwritten.is_empty() {
            return None;
        }
        let violation = Violation::warning(
            "PRIMITIVES_OVERWRITTEN",
            format!(
                "{} re-exports modified versions of primitives: {}",
                relative_display(&file.path, root),
                overwritten.join(", ")
            ),
        )
        .in_file(&file.path);
        Some(match first_at {
            Some(loc) => violation.at(loc),
            None => violation,
        })
    }
}

fn has_default_keyword(export: Node<'_>) -> bool {
    let mut cursor = export.walk();
    let found = export
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == "default");
    found
}

/// `(local, exported alias)` for each `export { a as b }` specifier.
fn export_specifiers(file: &SourceFile, export: Node<'_>) -> Vec<(String, Option<String>)> {
    named_children(export)
        .into_iter()
        .filter(|c| NodeKind::of(c) == NodeKind::ExportClause)
        .flat_map(named_children)
        .filter(|s| NodeKind::of(s) == NodeKind::ExportSpecifier)
        .filter_map(|s| {
            let name = s.child_by_field_name("name")?;
            let alias = s.child_by_field_name("alias").map(|a| file.text(a).to_string());
            Some((file.text(name).to_string(), alias))
        })
        .collect()
}

/// Named declarations in an export: functions, classes and variables, with
/// the node holding their implementation.
fn declared_components<'t>(file: &SourceFile, declaration: Node<'t>) -> Vec<(String, Node<'t>)> {
    match NodeKind::of(&declaration) {
        NodeKind::LexicalDeclaration | NodeKind::VariableDeclaration => named_children(declaration)
            .into_iter()
            .filter(|d| NodeKind::of(d) == NodeKind::VariableDeclarator)
            .filter_map(|d| {
                let name = d.child_by_field_name("name")?;
                let value = d.child_by_field_name("value")?;
                Some((file.text(name).to_string(), value))
            })
            .collect(),
        _ => declaration
            .child_by_field_name("name")
            .map(|n| vec![(file.text(n).to_string(), declaration)])
            .unwrap_or_default(),
    }
}

/// Imported primitives rendered as JSX somewhere inside `body`.
fn rendered_primitives(file: &SourceFile, body: Node<'_>, imported: &BTreeSet<String>) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    walk_preorder(body, |node| {
        if !NodeKind::of(&node).is_jsx_tag() {
            return;
        }
        let Some(tag) = file.jsx_tag_name(node) else { return };
        let head = tag.split('.').next().unwrap_or(tag);
        if imported.contains(head) && !found.iter().any(|f| f == tag) {
            found.push(tag.to_string());
        }
    });
    found
}

/// A wrapper carries the primitive's name inside its own (`FancyCard` for
/// `Card`); ordinary components that merely render a primitive do not.
fn name_wraps(name: &str, primitive: &str) -> bool {
    let base = primitive.rsplit('.').next().unwrap_or(primitive);
    name != base && name.contains(base)
}
