//! Per-file semantic rules. Each takes the parsed file plus whatever shared
//! context it needs and returns violations in traversal order.

use crate::config::GateConfig;
use crate::files::relative_display;
use crate::rules::Violation;
use crate::rules::imports::top_level_imports;
use crate::rules::semantic::implicit_any;
use crate::rules::semantic::program::Program;
use crate::rules::syntax::{
    NodeKind, SourceFile, is_binding_reference, location, named_children, walk_preorder,
};
use crate::rules::tables::RuleTables;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator};

const ANY_QUERY: &str = "(predefined_type) @type";

pub fn explicit_any(file: &SourceFile) -> anyhow::Result<Vec<Violation>> {
    let language = file.kind.language();
    let query = Query::new(&language, ANY_QUERY)?;
    let mut cursor = QueryCursor::new();
    let mut captures = cursor.captures(&query, file.root(), file.source.as_bytes());

    let mut violations = Vec::new();
    while let Some((m, _)) = captures.next() {
        for capture in m.captures {
            if file.text(capture.node) == "any" {
                violations.push(
                    Violation::error("NO_ANY_TYPE", "Usage of \"any\" type is not allowed")
                        .at(location(capture.node)),
                );
            }
        }
    }
    Ok(violations)
}

pub fn implicit_any(file: &SourceFile, program: &Program, tables: &RuleTables) -> Vec<Violation> {
    let enabled = program
        .config_for(&file.path)
        .is_some_and(|c| c.options.no_implicit_any_enabled());
    if !enabled {
        return Vec::new();
    }
    implicit_any::diagnostics(file)
        .into_iter()
        .filter(|d| tables.implicit_any_codes.contains(&d.code))
        .map(|d| Violation::error("NO_IMPLICIT_ANY", d.message).at((d.line, d.column)))
        .collect()
}

pub fn unused_imports(file: &SourceFile) -> Vec<Violation> {
    let imports = top_level_imports(file);
    if imports.is_empty() {
        return Vec::new();
    }

    let mut referenced: BTreeSet<&str> = BTreeSet::new();
    for statement in named_children(file.root())
        .into_iter()
        .filter(|n| NodeKind::of(n) != NodeKind::ImportStatement)
    {
        walk_preorder(statement, |node| {
            if is_binding_reference(node) {
                referenced.insert(file.text(node));
            }
        });
    }

    imports
        .iter()
        .flat_map(|i| i.bindings.iter())
        .filter(|b| !referenced.contains(b.local.as_str()))
        .map(|b| {
            Violation::warning("NO_UNUSED_IMPORTS", format!("Import \"{}\" is not used", b.local))
                .at((b.line, b.column))
        })
        .collect()
}

pub fn anonymous_default_export(file: &SourceFile) -> Vec<Violation> {
    let mut violations = Vec::new();
    for export in named_children(file.root())
        .into_iter()
        .filter(|n| NodeKind::of(n) == NodeKind::ExportStatement)
    {
        let mut cursor = export.walk();
        let tokens: Vec<&str> = export
            .children(&mut cursor)
            .filter(|c| !c.is_named())
            .map(|c| c.kind())
            .collect();

        if tokens.contains(&"default") {
            if let Some(value) = export.child_by_field_name("value") {
                let message = match NodeKind::of(&value) {
                    NodeKind::ArrowFunction => Some("Default export should not be an arrow function"),
                    NodeKind::FunctionExpression if value.child_by_field_name("name").is_none() => {
                        Some("Default export should not be an anonymous function")
                    }
                    _ => None,
                };
                if let Some(message) = message {
                    violations.push(Violation::warning("NO_DEFAULT_EXPORT_ANON", message).at(location(value)));
                }
            }
        }

        if tokens.contains(&"type") {
            continue;
        }
        for clause in named_children(export)
            .into_iter()
            .filter(|c| NodeKind::of(c) == NodeKind::ExportClause)
        {
            for spec in named_children(clause) {
                let text_of = |field| spec.child_by_field_name(field).map(|n| file.text(n));
                if text_of("name") == Some("default") || text_of("alias") == Some("default") {
                    violations.push(
                        Violation::warning("NO_DEFAULT_EXPORT_ANON", "Default export should be explicitly named")
                            .at(location(spec)),
                    );
                }
            }
        }
    }
    violations
}

/// Function-like nodes with more function-like ancestors than allowed.
pub fn deep_nesting(file: &SourceFile, config: &GateConfig) -> Vec<Violation> {
    let max = config.thresholds.max_function_nesting;
    let mut violations = Vec::new();
    let mut cursor = file.root().walk();
    let mut path_is_function: Vec<bool> = Vec::new();
    let mut depth = 0usize;

    loop {
        let node = cursor.node();
        let is_function = NodeKind::of(&node).is_function_like();
        if is_function {
            if depth > max {
                violations.push(
                    Violation::warning(
                        "NO_DEEP_NESTING",
                        format!("Function nested {} levels deep (max {})", depth, max),
                    )
                    .at(location(node)),
                );
            }
            depth += 1;
        }
        path_is_function.push(is_function);

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if path_is_function.pop() == Some(true) {
                depth -= 1;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return violations;
            }
        }
    }
}

const FORWARDED_NAMES: &[&str] = &["props", "params"];

fn mentions_forwarded(text: &str) -> bool {
    FORWARDED_NAMES.iter().any(|n| text.contains(n))
}

/// Parameter named exactly `props` or `params`.
fn takes_props(file: &SourceFile, func: Node<'_>) -> bool {
    if let Some(param) = func.child_by_field_name("parameter") {
        return FORWARDED_NAMES.contains(&file.text(param));
    }
    let Some(params) = func.child_by_field_name("parameters") else { return false };
    named_children(params).into_iter().any(|p| {
        p.child_by_field_name("pattern")
            .is_some_and(|pattern| FORWARDED_NAMES.contains(&file.text(pattern)))
    })
}

/// Attributes of a tag that forward props: `{...props}` spreads and values
/// whose expression text mentions `props`/`params`.
fn forwarding_attributes(file: &SourceFile, tag: Node<'_>) -> usize {
    file.jsx_attributes(tag)
        .into_iter()
        .filter(|attr| match NodeKind::of(attr) {
            NodeKind::JsxAttribute => {
                let (_, value) = file.jsx_attribute(*attr);
                value
                    .filter(|v| NodeKind::of(v) == NodeKind::JsxExpression)
                    .and_then(|v| named_children(v).into_iter().next())
                    .is_some_and(|expr| mentions_forwarded(file.text(expr)))
            }
            NodeKind::JsxExpression => mentions_forwarded(file.text(*attr)),
            _ => false,
        })
        .count()
}

/// Counts forwarding attributes along each JSX element ancestry path below a
/// props-taking function. A tag whose running count passes the limit is
/// reported once, with the highest count seen there.
pub fn prop_drilling(file: &SourceFile, config: &GateConfig) -> Vec<Violation> {
    let max = config.thresholds.max_prop_drilling;
    let mut worst: BTreeMap<(usize, usize), usize> = BTreeMap::new();

    walk_preorder(file.root(), |node| {
        let kind = NodeKind::of(&node);
        let component = match kind {
            NodeKind::FunctionDeclaration => node.child_by_field_name("name").is_some(),
            NodeKind::ArrowFunction => true,
            _ => false,
        };
        if !component || !takes_props(file, node) {
            return;
        }
        let Some(body) = node.child_by_field_name("body") else { return };

        let mut stack: Vec<(Node<'_>, usize)> = vec![(body, 0)];
        while let Some((current, level)) = stack.pop() {
            let mut level = level;
            let kind = NodeKind::of(&current);
            if kind.is_jsx_element() {
                let tag = if kind == NodeKind::JsxElement {
                    current.child_by_field_name("open_tag")
                } else {
                    Some(current)
                };
                if let Some(tag) = tag {
                    level += forwarding_attributes(file, tag);
                    if level > max {
                        let slot = worst.entry(location(tag)).or_default();
                        *slot = (*slot).max(level);
                    }
                }
            }
            let mut cursor = current.walk();
            let children: Vec<Node<'_>> = current.named_children(&mut cursor).collect();
            for child in children.into_iter().rev() {
                stack.push((child, level));
            }
        }
    });

    worst
        .into_iter()
        .map(|(loc, level)| {
            Violation::warning(
                "NO_PROP_DRILLING",
                format!("Props being passed through {} component levels (max {})", level, max),
            )
            .at(loc)
        })
        .collect()
}

/// One error per non-strict project config, plus one project-level error
/// when some batch file has no config at all.
pub fn strict_mode(program: &Program) -> Vec<Violation> {
    let mut violations = Vec::new();
    if program.is_empty() {
        return violations;
    }
    for config in program.configs() {
        if config.options.strict_enabled() {
            continue;
        }
        let name = config
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        violations.push(
            Violation::error(
                "STRICT_MODE_CHECK",
                format!("{} must have \"compilerOptions.strict\": true", name),
            )
            .in_file(&config.path),
        );
    }
    if program.has_unconfigured_files() {
        violations.push(Violation::error(
            "STRICT_MODE_CHECK",
            "tsconfig.json not found in project hierarchy",
        ));
    }
    violations
}

/// Whitespace-, comment- and separator-insensitive rendering of a type's
/// shape: type parameters, heritage and body, without its name.
fn type_shape(file: &SourceFile, declaration: Node<'_>) -> String {
    let name_id = declaration.child_by_field_name("name").map(|n| n.id());
    let mut raw = String::new();
    for part in named_children(declaration)
        .into_iter()
        .filter(|c| Some(c.id()) != name_id)
    {
        raw.push_str(file.text(part));
        raw.push(' ');
    }
    normalize_shape(&raw)
}

fn normalize_shape(raw: &str) -> String {
    let mut spaced = String::with_capacity(raw.len() * 2);
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
                spaced.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                spaced.push(' ');
            }
            ';' | ',' => spaced.push(' '),
            '{' | '}' | '(' | ')' | '[' | ']' | '<' | '>' | ':' | '|' | '&' | '?' | '=' => {
                spaced.push(' ');
                spaced.push(c);
                spaced.push(' ');
            }
            _ => spaced.push(c),
        }
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn duplicated_types(file: &SourceFile) -> Vec<Violation> {
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut violations = Vec::new();

    walk_preorder(file.root(), |node| {
        if !matches!(
            NodeKind::of(&node),
            NodeKind::TypeAliasDeclaration | NodeKind::InterfaceDeclaration
        ) {
            return;
        }
        let Some(name) = node.child_by_field_name("name") else { return };
        let (line, column) = location(node);
        let shape = type_shape(file, node);
        match first_seen.get(&shape) {
            Some(first_line) => violations.push(
                Violation::warning(
                    "NO_DUPLICATED_TYPES",
                    format!("Type \"{}\" is identical to type at line {}", file.text(name), first_line),
                )
                .at((line, column)),
            ),
            None => {
                first_seen.insert(shape, line);
            }
        }
    });
    violations
}

pub fn circular_imports(file: &SourceFile, program: &Program) -> Vec<Violation> {
    let Some(cycle) = program.graph().cycle_through(&file.path) else {
        return Vec::new();
    };
    let rendered: Vec<String> = cycle
        .iter()
        .map(|p| relative_display(p, program.root()))
        .collect();
    vec![Violation::error(
        "NO_CIRCULAR_IMPORTS",
        format!("File is part of a circular import chain: {}", rendered.join(" -> ")),
    )]
}
