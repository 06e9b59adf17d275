//! Syntactic stand-in for the type checker's implicit-any diagnostics.
//!
//! Only declarations whose type cannot come from anywhere else are reported:
//! a parameter with neither annotation nor default inside a function that is
//! not contextually typed, an untyped rest or destructured parameter, an
//! exported variable with neither annotation nor initializer, a class
//! field with neither, and `new` on a plain function.

use crate::rules::syntax::{NodeKind, SourceFile, location, logical_parent, named_children, walk_preorder};
use std::collections::BTreeSet;
use tree_sitter::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: u32,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    fn new(code: u32, message: String, node: Node<'_>) -> Self {
        let (line, column) = location(node);
        Self {
            code,
            message,
            line,
            column,
        }
    }
}

/// All implicit-any diagnostics of `file`, in source order.
pub fn diagnostics(file: &SourceFile) -> Vec<Diagnostic> {
    let mut functions: BTreeSet<&str> = BTreeSet::new();
    walk_preorder(file.root(), |node| {
        if NodeKind::of(&node) == NodeKind::FunctionDeclaration {
            if let Some(name) = node.child_by_field_name("name") {
                functions.insert(file.text(name));
            }
        }
    });

    let mut out = Vec::new();
    walk_preorder(file.root(), |node| match NodeKind::of(&node) {
        kind if kind.is_function_like() => check_function(file, node, &mut out),
        NodeKind::NewExpression => check_new_target(file, node, &functions, &mut out),
        NodeKind::ExportStatement => check_exported_variables(file, node, &mut out),
        NodeKind::PublicFieldDefinition => check_field(file, node, &mut out),
        _ => {}
    });
    out
}

fn check_function(file: &SourceFile, func: Node<'_>, out: &mut Vec<Diagnostic>) {
    if func.child_by_field_name("body").is_none() {
        return;
    }
    let contextual = is_contextually_typed(func);

    // `x => ..` without parentheses
    if let Some(param) = func.child_by_field_name("parameter") {
        if !contextual && NodeKind::of(&param) == NodeKind::Identifier {
            out.push(Diagnostic::new(
                7006,
                format!("Parameter '{}' implicitly has an 'any' type.", file.text(param)),
                param,
            ));
        }
        return;
    }

    let Some(params) = func.child_by_field_name("parameters") else { return };
    for param in named_children(params) {
        if !matches!(
            NodeKind::of(&param),
            NodeKind::RequiredParameter | NodeKind::OptionalParameter
        ) {
            continue;
        }
        if param.child_by_field_name("type").is_some() {
            continue;
        }
        let Some(pattern) = param.child_by_field_name("pattern") else { continue };
        let has_default = param.child_by_field_name("value").is_some();

        match NodeKind::of(&pattern) {
            NodeKind::RestPattern if !contextual => {
                let name = named_children(pattern)
                    .into_iter()
                    .next()
                    .map(|n| file.text(n).to_string())
                    .unwrap_or_default();
                out.push(Diagnostic::new(
                    7019,
                    format!("Rest parameter '{}' implicitly has an 'any[]' type.", name),
                    pattern,
                ));
            }
            NodeKind::ObjectPattern | NodeKind::ArrayPattern if !contextual && !has_default => {
                for name in binding_names(pattern) {
                    out.push(Diagnostic::new(
                        7031,
                        format!("Binding element '{}' implicitly has an 'any' type.", file.text(name)),
                        name,
                    ));
                }
            }
            NodeKind::Identifier if !contextual && !has_default => {
                out.push(Diagnostic::new(
                    7006,
                    format!("Parameter '{}' implicitly has an 'any' type.", file.text(pattern)),
                    pattern,
                ));
            }
            _ => {}
        }
    }
}

/// Identifiers bound by a destructuring pattern. Elements with their own
/// default take their type from it.
fn binding_names(pattern: Node<'_>) -> Vec<Node<'_>> {
    let mut names = Vec::new();
    let mut stack = vec![pattern];
    while let Some(node) = stack.pop() {
        match NodeKind::of(&node) {
            NodeKind::ShorthandPropertyIdentifierPattern | NodeKind::Identifier => names.push(node),
            NodeKind::ObjectPattern | NodeKind::ArrayPattern | NodeKind::RestPattern => {
                stack.extend(named_children(node).into_iter().rev());
            }
            NodeKind::PairPattern => {
                if let Some(value) = node.child_by_field_name("value") {
                    stack.push(value);
                }
            }
            _ => {}
        }
    }
    names
}

/// Whether the surrounding expression supplies the function's parameter
/// types. Object-literal methods inherit from their object.
fn is_contextually_typed(func: Node<'_>) -> bool {
    match NodeKind::of(&func) {
        NodeKind::MethodDefinition => match func.parent() {
            Some(object) if NodeKind::of(&object) == NodeKind::Object => has_contextual_type(object),
            _ => false,
        },
        NodeKind::FunctionDeclaration | NodeKind::GeneratorFunctionDeclaration => false,
        _ => has_contextual_type(func),
    }
}

/// A call or `new` argument, a JSX expression, the initializer of an
/// annotated variable, the operand of `as`/`satisfies`, or a property value
/// of an object literal that is itself contextually typed.
fn has_contextual_type(expr: Node<'_>) -> bool {
    let Some(parent) = logical_parent(expr) else { return false };
    match NodeKind::of(&parent) {
        NodeKind::Arguments
        | NodeKind::JsxExpression
        | NodeKind::AsExpression
        | NodeKind::SatisfiesExpression => true,
        NodeKind::VariableDeclarator => parent.child_by_field_name("type").is_some(),
        NodeKind::Pair => match parent.parent() {
            Some(object) if NodeKind::of(&object) == NodeKind::Object => has_contextual_type(object),
            _ => false,
        },
        _ => false,
    }
}

/// `new f()` where `f` is a plain function declared in this file, which has
/// no construct signature.
fn check_new_target(file: &SourceFile, new: Node<'_>, functions: &BTreeSet<&str>, out: &mut Vec<Diagnostic>) {
    let Some(target) = new.child_by_field_name("constructor") else { return };
    if NodeKind::of(&target) == NodeKind::Identifier && functions.contains(file.text(target)) {
        out.push(Diagnostic::new(
            7009,
            "'new' expression, whose target lacks a construct signature, implicitly has an 'any' type."
                .to_string(),
            new,
        ));
    }
}

fn check_exported_variables(file: &SourceFile, export: Node<'_>, out: &mut Vec<Diagnostic>) {
    let Some(declaration) = export.child_by_field_name("declaration") else { return };
    if !matches!(
        NodeKind::of(&declaration),
        NodeKind::LexicalDeclaration | NodeKind::VariableDeclaration
    ) {
        return;
    }
    for declarator in named_children(declaration) {
        if NodeKind::of(&declarator) != NodeKind::VariableDeclarator {
            continue;
        }
        if declarator.child_by_field_name("type").is_some()
            || declarator.child_by_field_name("value").is_some()
        {
            continue;
        }
        if let Some(name) = declarator.child_by_field_name("name") {
            out.push(Diagnostic::new(
                7005,
                format!("Variable '{}' implicitly has an 'any' type.", file.text(name)),
                name,
            ));
        }
    }
}

fn check_field(file: &SourceFile, field: Node<'_>, out: &mut Vec<Diagnostic>) {
    if field.child_by_field_name("type").is_some() || field.child_by_field_name("value").is_some() {
        return;
    }
    if let Some(name) = field.child_by_field_name("name") {
        out.push(Diagnostic::new(
            7008,
            format!("Member '{}' implicitly has an 'any' type.", file.text(name)),
            name,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::syntax::parse_snippet;

    fn codes(source: &str) -> Vec<(u32, String)> {
        let file = parse_snippet("a.ts", source);
        diagnostics(&file)
            .into_iter()
            .map(|d| (d.code, d.message))
            .collect()
    }

    #[test]
    fn test_untyped_parameters() {
        let found = codes("function add(a, b: number, c = 1) { return a + b + c; }\nconst f = x => x;\n");
        assert_eq!(
            found,
            vec![
                (7006, "Parameter 'a' implicitly has an 'any' type.".to_string()),
                (7006, "Parameter 'x' implicitly has an 'any' type.".to_string()),
            ]
        );
    }

    #[test]
    fn test_contextual_typing_exempts() {
        let source = "items.map((item) => item.id);\nconst h: Handler = (e) => e;\nconst o: Api = { run(v) { return v; } };\nregister({ onDone: (r) => r });\nconst n: Nested = { inner: { go: (s) => s } };\n";
        assert!(codes(source).is_empty());

        let untyped = codes("const handlers = { f: (x) => x, run(v) { return v; } };\n");
        assert_eq!(
            untyped,
            vec![
                (7006, "Parameter 'x' implicitly has an 'any' type.".to_string()),
                (7006, "Parameter 'v' implicitly has an 'any' type.".to_string()),
            ]
        );
    }

    #[test]
    fn test_new_on_plain_function() {
        let found = codes("function Point() {}\nclass Line {}\nconst p = new Point();\nconst l = new Line();\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, 7009);
    }

    #[test]
    fn test_rest_destructured_exported_and_field() {
        let source = "export function log(...args) {}\nexport function pick({ a, b }) { return a + b; }\nexport let pending;\nclass Store { cache; size = 0; }\n";
        let found: Vec<u32> = codes(source).into_iter().map(|(c, _)| c).collect();
        assert_eq!(found, vec![7019, 7031, 7031, 7005, 7008]);
    }
}
