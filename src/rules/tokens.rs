//! Design-token adoption: literal durations, easings and colors where a
//! token reference is expected, plus the project-wide unused-token check.

use crate::config::GateConfig;
use crate::rules::Violation;
use crate::rules::imports::top_level_imports;
use crate::rules::static_analysis::{AnalyzerMetrics, FileAnalysis, StaticAnalyzer};
use crate::rules::structural::animation_call;
use crate::rules::syntax::{NodeKind, SourceFile, location, named_children, unwrap_parens, walk_preorder};
use crate::rules::tables::{RuleTables, TOKEN_COLOR_PROPS, TOKEN_OBJECTS};
use crate::rules::visitor::{NodeRule, RuleContext, walk};
use serde::Serialize;
use std::collections::BTreeSet;
use tree_sitter::Node;

static COLOR_LITERAL_RE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
    regex::Regex::new(r"(#[0-9a-fA-F]{3,6}|rgb\(|rgba\(|hsl\(|hsla\()").unwrap()
});
static VAR_REF_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"var\s*\(\s*--").unwrap());
static VAR_NAME_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"var\(--([^)]+)\)").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetrics {
    pub token_references: usize,
    pub hardcoded_values: usize,
    pub adoption_ratio: f64,
}

impl TokenMetrics {
    pub fn merge(&mut self, other: &TokenMetrics) {
        self.token_references += other.token_references;
        self.hardcoded_values += other.hardcoded_values;
        self.update_ratio();
    }

    fn update_ratio(&mut self) {
        let total = self.token_references + self.hardcoded_values;
        self.adoption_ratio = if total == 0 {
            0.0
        } else {
            self.token_references as f64 / total as f64
        };
    }
}

fn has_color_literal(value: &str) -> bool {
    COLOR_LITERAL_RE.is_match(value) && !VAR_REF_RE.is_match(value)
}

/// Object-literal pair of the tween vars for a `gsap.to/from/fromTo` call,
/// taken from the call's last argument.
fn tween_entries<'t>(call: Node<'t>, ctx: &RuleContext<'_>) -> Vec<(String, Node<'t>)> {
    if animation_call(call, ctx.file, ctx.config, ctx.tables).is_none() {
        return Vec::new();
    }
    let Some(args) = call.child_by_field_name("arguments") else { return Vec::new() };
    let Some(last) = named_children(args).last().map(|n| unwrap_parens(*n)) else {
        return Vec::new();
    };
    if NodeKind::of(&last) != NodeKind::Object {
        return Vec::new();
    }
    named_children(last)
        .into_iter()
        .filter(|p| NodeKind::of(p) == NodeKind::Pair)
        .filter_map(|p| Some((ctx.file.property_key(p)?, p)))
        .collect()
}

struct HardcodedDuration;

impl NodeRule for HardcodedDuration {
    fn id(&self) -> &'static str {
        "HARDCODED_DURATION"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind == NodeKind::CallExpression
    }

    fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        tween_entries(node, ctx)
            .into_iter()
            .filter(|(key, pair)| {
                key == "duration"
                    && pair
                        .child_by_field_name("value")
                        .is_some_and(|v| NodeKind::of(&v) == NodeKind::Number)
            })
            .map(|(_, pair)| {
                Violation::error(self.id(), "Hardcoded duration in gsap call. Use token reference instead.")
                    .at(location(pair))
            })
            .collect()
    }
}

struct HardcodedEasing;

impl NodeRule for HardcodedEasing {
    fn id(&self) -> &'static str {
        "HARDCODED_EASING"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind == NodeKind::CallExpression
    }

    fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        tween_entries(node, ctx)
            .into_iter()
            .filter(|(key, pair)| {
                key == "ease"
                    && pair
                        .child_by_field_name("value")
                        .is_some_and(|v| NodeKind::of(&v) == NodeKind::String)
            })
            .map(|(_, pair)| {
                Violation::error(self.id(), "Hardcoded easing in gsap call. Use token reference instead.")
                    .at(location(pair))
            })
            .collect()
    }
}

struct HardcodedColorInJsx;

impl NodeRule for HardcodedColorInJsx {
    fn id(&self) -> &'static str {
        "HARDCODED_COLOR_IN_JSX"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        matches!(kind, NodeKind::JsxAttribute | NodeKind::Pair)
    }

    fn check(&self, node: Node<'_>, kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let message = if kind == NodeKind::JsxAttribute {
            let (_, value) = ctx.file.jsx_attribute(node);
            let literal = value.and_then(|v| ctx.file.string_value(v));
            match literal {
                Some(v) if has_color_literal(&v) => "Hardcoded color value in JSX. Use design token instead.",
                _ => return Vec::new(),
            }
        } else {
            let Some(key) = ctx.file.property_key(node) else { return Vec::new() };
            if !TOKEN_COLOR_PROPS.contains(&key.as_str()) {
                return Vec::new();
            }
            let Some(value) = node.child_by_field_name("value") else { return Vec::new() };
            match NodeKind::of(&value) {
                NodeKind::String if ctx.file.string_value(value).is_some_and(|v| has_color_literal(&v)) => {
                    "Hardcoded color value in style object. Use design token instead."
                }
                NodeKind::TemplateString
                    if ctx.file.template_value(value, " ").is_some_and(|v| has_color_literal(&v)) =>
                {
                    "Hardcoded color value in template literal. Use design token instead."
                }
                _ => return Vec::new(),
            }
        };
        vec![Violation::error(self.id(), message).at(location(node))]
    }
}

fn is_token_object(name: &str) -> bool {
    TOKEN_OBJECTS.contains(&name)
}

/// `tokens.x` / `tokens['x']` property name, if `node` is such an access.
fn token_access(file: &SourceFile, node: Node<'_>) -> Option<String> {
    let object = node.child_by_field_name("object")?;
    if NodeKind::of(&object) != NodeKind::Identifier || !is_token_object(file.text(object)) {
        return None;
    }
    match NodeKind::of(&node) {
        NodeKind::MemberExpression => node.child_by_field_name("property").map(|p| file.text(p).to_string()),
        NodeKind::SubscriptExpression => file.string_value(node.child_by_field_name("index")?),
        _ => None,
    }
}

fn imports_tokens_module(source: &str) -> bool {
    let last = source.rsplit('/').next().unwrap_or(source);
    let stem = last.split('.').next().unwrap_or(last);
    is_token_object(stem)
}

fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub struct TokenAnalyzer {
    config: GateConfig,
    tables: RuleTables,
    rules: Vec<Box<dyn NodeRule>>,
}

impl TokenAnalyzer {
    pub fn new(config: GateConfig, tables: RuleTables) -> Self {
        Self {
            config,
            tables,
            rules: vec![
                Box::new(HardcodedDuration),
                Box::new(HardcodedEasing),
                Box::new(HardcodedColorInJsx),
            ],
        }
    }

    fn count_references(&self, file: &SourceFile) -> usize {
        let mut count = 0;
        walk_preorder(file.root(), |node| {
            if token_access(file, node).is_some() {
                count += 1;
            }
        });
        count
            + top_level_imports(file)
                .iter()
                .filter(|i| imports_tokens_module(&i.source))
                .map(|i| i.bindings.iter().filter(|b| b.imported != "*").count())
                .sum::<usize>()
    }

    /// Locates the tokens module among `files` (by configured file name).
    pub fn find_tokens_file<'a>(&self, files: &[&'a SourceFile]) -> Option<&'a SourceFile> {
        files.iter().copied().find(|f| {
            f.path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| self.config.tokens_file_names.iter().any(|t| t == n))
        })
    }

    /// Warns once for every exported token never referenced by another file.
    pub fn unused_tokens(&self, files: &[&SourceFile]) -> Vec<Violation> {
        let Some(tokens_file) = self.find_tokens_file(files) else {
            return Vec::new();
        };
        let exported = exported_names(tokens_file);
        if exported.is_empty() {
            return Vec::new();
        }

        let mut used: BTreeSet<String> = BTreeSet::new();
        for file in files.iter().filter(|f| f.path != tokens_file.path) {
            walk_preorder(file.root(), |node| {
                if let Some(name) = token_access(file, node) {
                    used.insert(name);
                }
                if NodeKind::of(&node) == NodeKind::String {
                    if let Some(value) = file.string_value(node) {
                        for caps in VAR_NAME_RE.captures_iter(&value) {
                            used.insert(kebab_to_camel(&caps[1]));
                        }
                    }
                }
            });
            for import in top_level_imports(file) {
                for binding in import.bindings {
                    used.insert(binding.imported);
                    used.insert(binding.local);
                }
            }
        }

        exported
            .into_iter()
            .filter(|name| !used.contains(name))
            .map(|name| {
                Violation::warning(
                    "TOKEN_DEFINED_NOT_USED",
                    format!("Token \"{}\" is defined but not used in the project", name),
                )
            })
            .collect()
    }
}

impl Default for TokenAnalyzer {
    fn default() -> Self {
        Self::new(GateConfig::default(), RuleTables::default())
    }
}

/// Names exported by `export const/function/class` and `export { .. }`.
fn exported_names(file: &SourceFile) -> Vec<String> {
    let mut names = Vec::new();
    for export in named_children(file.root())
        .into_iter()
        .filter(|n| NodeKind::of(n) == NodeKind::ExportStatement)
    {
        if let Some(declaration) = export.child_by_field_name("declaration") {
            match NodeKind::of(&declaration) {
                NodeKind::LexicalDeclaration | NodeKind::VariableDeclaration => {
                    for declarator in named_children(declaration) {
                        if let Some(name) = declarator.child_by_field_name("name") {
                            if NodeKind::of(&name) == NodeKind::Identifier {
                                names.push(file.text(name).to_string());
                            }
                        }
                    }
                }
                _ => {
                    if let Some(name) = declaration.child_by_field_name("name") {
                        names.push(file.text(name).to_string());
                    }
                }
            }
        }
        for clause in named_children(export)
            .into_iter()
            .filter(|c| NodeKind::of(c) == NodeKind::ExportClause)
        {
            for spec in named_children(clause) {
                let shown = spec
                    .child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"));
                if let Some(shown) = shown {
                    names.push(file.text(shown).to_string());
                }
            }
        }
    }
    names.dedup();
    names
}

impl StaticAnalyzer for TokenAnalyzer {
    fn name(&self) -> &'static str {
        "tokens"
    }

    fn analyze(&self, file: &SourceFile) -> FileAnalysis {
        let violations = walk(file, &self.rules, &self.config, &self.tables);
        let mut metrics = TokenMetrics {
            token_references: self.count_references(file),
            hardcoded_values: violations
                .iter()
                .filter(|v| v.rule == "HARDCODED_COLOR_IN_JSX")
                .count(),
            adoption_ratio: 0.0,
        };
        metrics.update_ratio();
        FileAnalysis {
            violations,
            metrics: AnalyzerMetrics::Tokens(metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::syntax::parse_snippet;

    fn run(source: &str) -> (Vec<Violation>, TokenMetrics) {
        let file = parse_snippet("Hero.tsx", source);
        let analysis = TokenAnalyzer::default().analyze(&file);
        let AnalyzerMetrics::Tokens(metrics) = analysis.metrics else {
            panic!("token metrics expected");
        };
        (analysis.violations, metrics)
    }

    #[test]
    fn test_duration_and_easing_literals() {
        let (violations, _) = run("gsap.to(el, { y: 0, duration: 0.6, ease: \"power2.out\" });\n");
        let rules: Vec<&str> = violations.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["HARDCODED_DURATION", "HARDCODED_EASING"]);

        let (violations, _) = run("gsap.to(el, { y: 0, duration: tokens.duration.base, ease: tokens.ease });\n");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_color_in_jsx_and_adoption_ratio() {
        let source = r##"import { colorPrimary } from "../tokens";
export const Hero = () => (
  <svg fill="#ff00aa" stroke="var(--line)">
    <path style={{ color: tokens.ink, backgroundColor: `rgba(0,0,0,${a})` }} />
  </svg>
);
"##;
        let (violations, metrics) = run(source);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.rule == "HARDCODED_COLOR_IN_JSX"));
        assert_eq!(metrics.hardcoded_values, 2);
        assert_eq!(metrics.token_references, 2);
        assert!((metrics.adoption_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ratio_is_zero_without_data() {
        let (_, metrics) = run("export const A = () => <div />;\n");
        assert_eq!(metrics.adoption_ratio, 0.0);
    }

    #[test]
    fn test_unused_tokens_project_check() {
        let tokens = parse_snippet(
            "src/tokens.ts",
            "export const colorPrimary = '#111';\nexport const spacingLg = '2rem';\nexport const radiusSm = '4px';\nconst internal = 1;\nexport { internal as easeOut };\n",
        );
        let page = parse_snippet(
            "src/Page.tsx",
            "import { colorPrimary } from './tokens';\nexport const P = () => <div data-x={tokens['easeOut']} className=\"p\" title=\"var(--spacing-lg)\" />;\n",
        );
        let analyzer = TokenAnalyzer::default();
        let violations = analyzer.unused_tokens(&[&tokens, &page]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "Token \"radiusSm\" is defined but not used in the project");
        assert!(violations[0].file.is_none());
    }

    #[test]
    fn test_kebab_to_camel() {
        assert_eq!(kebab_to_camel("color-primary-dark"), "colorPrimaryDark");
        assert_eq!(kebab_to_camel("space"), "space");
    }
}
