//! Parsed source files and the typed view over tree-sitter nodes that every
//! analyzer works against.

use crate::rules::languages::SourceKind;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: {0}")]
    Unsupported(String),
    #[error("grammar could not be loaded: {0}")]
    Language(String),
    #[error("parser produced no tree")]
    NoTree,
    #[error("unexpected token `{snippet}` at {line}:{column}")]
    Syntax {
        line: usize,
        column: usize,
        snippet: String,
    },
}

impl ParseFailure {
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            ParseFailure::Syntax { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

/// Closed classification of the node kinds the rules care about. Anything
/// else is `Other`, so matching on this enum is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    ImportStatement,
    ImportClause,
    ImportSpecifier,
    NamespaceImport,
    ExportStatement,
    ExportClause,
    ExportSpecifier,
    JsxElement,
    JsxSelfClosingElement,
    JsxOpeningElement,
    JsxAttribute,
    JsxExpression,
    CallExpression,
    NewExpression,
    MemberExpression,
    SubscriptExpression,
    AsExpression,
    SatisfiesExpression,
    SpreadElement,
    Arguments,
    Object,
    Pair,
    String,
    TemplateString,
    TemplateSubstitution,
    Number,
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunction,
    MethodDefinition,
    GeneratorFunctionDeclaration,
    GeneratorFunction,
    FormalParameters,
    RequiredParameter,
    OptionalParameter,
    RestPattern,
    ObjectPattern,
    ArrayPattern,
    PairPattern,
    AssignmentPattern,
    ObjectAssignmentPattern,
    TypeAliasDeclaration,
    InterfaceDeclaration,
    PredefinedType,
    LexicalDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    PublicFieldDefinition,
    ClassBody,
    ClassDeclaration,
    Identifier,
    TypeIdentifier,
    PropertyIdentifier,
    ShorthandPropertyIdentifier,
    ShorthandPropertyIdentifierPattern,
    ParenthesizedExpression,
    Comment,
    Error,
    Other,
}

impl NodeKind {
    pub fn of(node: &Node<'_>) -> Self {
        match node.kind() {
            "program" => NodeKind::Program,
            "import_statement" => NodeKind::ImportStatement,
            "import_clause" => NodeKind::ImportClause,
            "import_specifier" => NodeKind::ImportSpecifier,
            "namespace_import" => NodeKind::NamespaceImport,
            "export_statement" => NodeKind::ExportStatement,
            "export_clause" => NodeKind::ExportClause,
            "export_specifier" => NodeKind::ExportSpecifier,
            "jsx_element" => NodeKind::JsxElement,
            "jsx_self_closing_element" => NodeKind::JsxSelfClosingElement,
            "jsx_opening_element" => NodeKind::JsxOpeningElement,
            "jsx_attribute" => NodeKind::JsxAttribute,
            "jsx_expression" => NodeKind::JsxExpression,
            "call_expression" => NodeKind::CallExpression,
            "new_expression" => NodeKind::NewExpression,
            "member_expression" => NodeKind::MemberExpression,
            "subscript_expression" => NodeKind::SubscriptExpression,
            "as_expression" => NodeKind::AsExpression,
            "satisfies_expression" => NodeKind::SatisfiesExpression,
            "spread_element" => NodeKind::SpreadElement,
            "arguments" => NodeKind::Arguments,
            "object" => NodeKind::Object,
            "pair" => NodeKind::Pair,
            "string" => NodeKind::String,
            "template_string" => NodeKind::TemplateString,
            "template_substitution" => NodeKind::TemplateSubstitution,
            "number" => NodeKind::Number,
            "function_declaration" => NodeKind::FunctionDeclaration,
            "function_expression" | "function" => NodeKind::FunctionExpression,
            "arrow_function" => NodeKind::ArrowFunction,
            "method_definition" => NodeKind::MethodDefinition,
            "generator_function_declaration" => NodeKind::GeneratorFunctionDeclaration,
            "generator_function" => NodeKind::GeneratorFunction,
            "formal_parameters" => NodeKind::FormalParameters,
            "required_parameter" => NodeKind::RequiredParameter,
            "optional_parameter" => NodeKind::OptionalParameter,
            "rest_pattern" => NodeKind::RestPattern,
            "object_pattern" => NodeKind::ObjectPattern,
            "array_pattern" => NodeKind::ArrayPattern,
            "pair_pattern" => NodeKind::PairPattern,
            "assignment_pattern" => NodeKind::AssignmentPattern,
            "object_assignment_pattern" => NodeKind::ObjectAssignmentPattern,
            "type_alias_declaration" => NodeKind::TypeAliasDeclaration,
            "interface_declaration" => NodeKind::InterfaceDeclaration,
            "predefined_type" => NodeKind::PredefinedType,
            "lexical_declaration" => NodeKind::LexicalDeclaration,
            "variable_declaration" => NodeKind::VariableDeclaration,
            "variable_declarator" => NodeKind::VariableDeclarator,
            "public_field_definition" | "field_definition" => NodeKind::PublicFieldDefinition,
            "class_body" => NodeKind::ClassBody,
            "class_declaration" => NodeKind::ClassDeclaration,
            "identifier" => NodeKind::Identifier,
            "type_identifier" => NodeKind::TypeIdentifier,
            "property_identifier" => NodeKind::PropertyIdentifier,
            "shorthand_property_identifier" => NodeKind::ShorthandPropertyIdentifier,
            "shorthand_property_identifier_pattern" => NodeKind::ShorthandPropertyIdentifierPattern,
            "parenthesized_expression" => NodeKind::ParenthesizedExpression,
            "comment" => NodeKind::Comment,
            "ERROR" => NodeKind::Error,
            _ => NodeKind::Other,
        }
    }

    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDeclaration
                | NodeKind::FunctionExpression
                | NodeKind::ArrowFunction
                | NodeKind::MethodDefinition
                | NodeKind::GeneratorFunctionDeclaration
                | NodeKind::GeneratorFunction
        )
    }

    /// A JSX element instantiation, with or without children.
    pub fn is_jsx_element(self) -> bool {
        matches!(self, NodeKind::JsxElement | NodeKind::JsxSelfClosingElement)
    }

    /// The node that carries a tag name and attributes.
    pub fn is_jsx_tag(self) -> bool {
        matches!(self, NodeKind::JsxOpeningElement | NodeKind::JsxSelfClosingElement)
    }

    pub fn is_reference_name(self) -> bool {
        matches!(
            self,
            NodeKind::Identifier
                | NodeKind::TypeIdentifier
                | NodeKind::PropertyIdentifier
                | NodeKind::ShorthandPropertyIdentifier
                | NodeKind::ShorthandPropertyIdentifierPattern
        )
    }
}

pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub source: String,
    pub tree: Tree,
}

impl SourceFile {
    pub fn load(path: &Path) -> Result<Self, ParseFailure> {
        let source = fs::read_to_string(path).map_err(|e| ParseFailure::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(path, source)
    }

    pub fn parse(path: &Path, source: String) -> Result<Self, ParseFailure> {
        let kind = SourceKind::from_path(path)
            .ok_or_else(|| ParseFailure::Unsupported(path.display().to_string()))?;
        let mut parser = Parser::new();
        parser
            .set_language(&kind.language())
            .map_err(|e| ParseFailure::Language(e.to_string()))?;
        let tree = parser.parse(&source, None).ok_or(ParseFailure::NoTree)?;

        let root = tree.root_node();
        if root.has_error() {
            let bad = first_error_node(root).unwrap_or(root);
            let pos = bad.start_position();
            let snippet: String = bad
                .utf8_text(source.as_bytes())
                .unwrap_or("")
                .chars()
                .take(24)
                .collect();
            return Err(ParseFailure::Syntax {
                line: pos.row + 1,
                column: pos.column + 1,
                snippet: snippet.lines().next().unwrap_or("").to_string(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            source,
            tree,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Value of a `string` node without its quotes.
    pub fn string_value(&self, node: Node<'_>) -> Option<String> {
        if NodeKind::of(&node) != NodeKind::String {
            return None;
        }
        let raw = self.text(node);
        if raw.len() < 2 {
            return Some(String::new());
        }
        Some(raw[1..raw.len() - 1].to_string())
    }

    /// Static text of a template literal, each `${...}` replaced by
    /// `placeholder`.
    pub fn template_value(&self, node: Node<'_>, placeholder: &str) -> Option<String> {
        if NodeKind::of(&node) != NodeKind::TemplateString {
            return None;
        }
        let range = node.byte_range();
        if range.end - range.start < 2 {
            return Some(String::new());
        }
        let (start, end) = (range.start + 1, range.end - 1);
        let mut out = String::new();
        let mut cursor = start;
        for child in named_children(node) {
            if NodeKind::of(&child) != NodeKind::TemplateSubstitution {
                continue;
            }
            let sub = child.byte_range();
            if sub.start > cursor {
                out.push_str(self.source.get(cursor..sub.start).unwrap_or(""));
            }
            out.push_str(placeholder);
            cursor = sub.end;
        }
        if end > cursor {
            out.push_str(self.source.get(cursor..end).unwrap_or(""));
        }
        Some(out)
    }

    /// String or template literal value, `None` for anything else.
    pub fn literal_value(&self, node: Node<'_>) -> Option<String> {
        self.string_value(node)
            .or_else(|| self.template_value(node, "${...}"))
    }

    /// Key of an object `pair` when it is an identifier or a string.
    pub fn property_key(&self, pair: Node<'_>) -> Option<String> {
        let key = pair.child_by_field_name("key")?;
        match NodeKind::of(&key) {
            NodeKind::PropertyIdentifier | NodeKind::Identifier => Some(self.text(key).to_string()),
            NodeKind::String => self.string_value(key),
            _ => None,
        }
    }

    /// `(key, value)` for every keyed pair of an object literal, in order.
    pub fn object_entries<'t>(&self, object: Node<'t>) -> Vec<(String, Node<'t>)> {
        named_children(object)
            .into_iter()
            .filter(|c| NodeKind::of(c) == NodeKind::Pair)
            .filter_map(|pair| {
                let key = self.property_key(pair)?;
                let value = pair.child_by_field_name("value")?;
                Some((key, value))
            })
            .collect()
    }

    /// Tag name of a `jsx_opening_element` or `jsx_self_closing_element`.
    /// Fragments have no name.
    pub fn jsx_tag_name(&self, tag: Node<'_>) -> Option<&str> {
        tag.child_by_field_name("name").map(|n| self.text(n))
    }

    /// Name and value node of a `jsx_attribute`.
    pub fn jsx_attribute<'t>(&self, attr: Node<'t>) -> (Option<&str>, Option<Node<'t>>) {
        let children = named_children(attr);
        let name = children.first().map(|n| self.text(*n));
        let value = if children.len() > 1 { children.last().copied() } else { None };
        (name, value)
    }

    /// Attribute nodes (`jsx_attribute` and spread `jsx_expression`) of a tag.
    pub fn jsx_attributes<'t>(&self, tag: Node<'t>) -> Vec<Node<'t>> {
        let name_id = tag.child_by_field_name("name").map(|n| n.id());
        named_children(tag)
            .into_iter()
            .filter(|c| Some(c.id()) != name_id)
            .filter(|c| matches!(NodeKind::of(c), NodeKind::JsxAttribute | NodeKind::JsxExpression))
            .collect()
    }

    pub fn has_jsx_attribute(&self, tag: Node<'_>, name: &str) -> bool {
        self.jsx_attributes(tag)
            .into_iter()
            .filter(|a| NodeKind::of(a) == NodeKind::JsxAttribute)
            .any(|a| self.jsx_attribute(a).0 == Some(name))
    }
}

/// 1-based `(line, column)` of a node's start.
pub fn location(node: Node<'_>) -> (usize, usize) {
    let p = node.start_position();
    (p.row + 1, p.column + 1)
}

pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| NodeKind::of(c) != NodeKind::Comment)
        .collect()
}

/// A name that may refer to a binding in scope. Property names after `.` and
/// object keys never do.
pub fn is_binding_reference(node: Node<'_>) -> bool {
    if !NodeKind::of(&node).is_reference_name() {
        return false;
    }
    let Some(parent) = node.parent() else { return true };
    let field = match NodeKind::of(&parent) {
        NodeKind::MemberExpression => "property",
        NodeKind::Pair => "key",
        _ => return true,
    };
    parent.child_by_field_name(field).map(|n| n.id()) != Some(node.id())
}

/// Skips any number of wrapping parentheses.
pub fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while NodeKind::of(&node) == NodeKind::ParenthesizedExpression {
        match named_children(node).into_iter().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// First non-parenthesis ancestor of `node`.
pub fn logical_parent(node: Node<'_>) -> Option<Node<'_>> {
    let mut parent = node.parent()?;
    while NodeKind::of(&parent) == NodeKind::ParenthesizedExpression {
        parent = parent.parent()?;
    }
    Some(parent)
}

/// Pre-order walk over every node below (and including) `root`.
pub fn walk_preorder<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.node().id() == root.id() {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn first_error_node(root: Node<'_>) -> Option<Node<'_>> {
    let mut found = None;
    walk_preorder(root, |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node);
        }
    });
    found
}

#[cfg(test)]
pub(crate) fn parse_snippet(name: &str, source: &str) -> SourceFile {
    SourceFile::parse(Path::new(name), source.to_string()).expect("snippet should parse")
}
