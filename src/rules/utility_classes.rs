//! Utility-class (Tailwind-style) analyzer: extracts class strings from JSX
//! attributes and class-combining helpers, tokenizes them and validates
//! aggregate constraints across the file.

use crate::config::GateConfig;
use crate::rules::Violation;
use crate::rules::class_tokenizer::{ClassToken, ClassTokenizer};
use crate::rules::static_analysis::{AnalyzerMetrics, FileAnalysis, StaticAnalyzer};
use crate::rules::syntax::{NodeKind, SourceFile, location, logical_parent, named_children, walk_preorder};
use crate::rules::tables::{RuleTables, TEXT_SIZE_SCALE, text_size_rank};
use serde::Serialize;
use std::collections::BTreeSet;
use tree_sitter::Node;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtilityClassMetrics {
    pub unique_spacing_values: usize,
    pub unique_max_w_values: usize,
    pub unique_font_sizes: usize,
    pub arbitrary_value_count: usize,
    pub max_grid_cols: u32,
}

impl UtilityClassMetrics {
    /// Project roll-up: distinct-value counts and grid density take the
    /// worst file, arbitrary values add up.
    pub fn merge(&mut self, other: &UtilityClassMetrics) {
        self.unique_spacing_values = self.unique_spacing_values.max(other.unique_spacing_values);
        self.unique_max_w_values = self.unique_max_w_values.max(other.unique_max_w_values);
        self.unique_font_sizes = self.unique_font_sizes.max(other.unique_font_sizes);
        self.arbitrary_value_count += other.arbitrary_value_count;
        self.max_grid_cols = self.max_grid_cols.max(other.max_grid_cols);
    }
}

/// One extracted class list with where it came from.
#[derive(Debug, Clone)]
pub struct ClassString {
    pub value: String,
    pub line: usize,
    pub column: usize,
    /// Tag name of the element the classes are attached to, if any.
    pub element: Option<String>,
}

impl ClassString {
    fn violation(&self, violation: Violation) -> Violation {
        violation.at((self.line, self.column))
    }
}

pub fn extract_class_strings(file: &SourceFile, config: &GateConfig, tables: &RuleTables) -> Vec<ClassString> {
    let mut found = Vec::new();
    walk_preorder(file.root(), |node| match NodeKind::of(&node) {
        kind if kind.is_jsx_tag() => {
            let element = file.jsx_tag_name(node).map(str::to_string);
            for attr in file.jsx_attributes(node) {
                if NodeKind::of(&attr) != NodeKind::JsxAttribute {
                    continue;
                }
                let (name, value) = file.jsx_attribute(attr);
                if !name.is_some_and(|n| RuleTables::contains(&tables.class_attributes, n)) {
                    continue;
                }
                let Some(value) = value else { continue };
                let literal = match NodeKind::of(&value) {
                    NodeKind::JsxExpression => named_children(value).into_iter().next(),
                    _ => Some(value),
                };
                if let Some(literal) = literal {
                    if let Some(text) = static_classes(file, literal) {
                        found.push(class_string(text, literal, element.clone()));
                    }
                }
            }
        }
        NodeKind::CallExpression => {
            let Some(callee) = node.child_by_field_name("function") else { return };
            if NodeKind::of(&callee) != NodeKind::Identifier || !config.is_class_helper(file.text(callee)) {
                return;
            }
            let element = helper_owner(file, node, tables);
            let Some(args) = node.child_by_field_name("arguments") else { return };
            for arg in named_children(args) {
                if let Some(text) = static_classes(file, arg) {
                    found.push(class_string(text, arg, element.clone()));
                }
            }
        }
        _ => {}
    });
    found
}

fn class_string(value: String, node: Node<'_>, element: Option<String>) -> ClassString {
    let (line, column) = location(node);
    ClassString {
        value,
        line,
        column,
        element,
    }
}

fn static_classes(file: &SourceFile, node: Node<'_>) -> Option<String> {
    file.string_value(node).or_else(|| file.template_value(node, " "))
}

/// Element a helper call belongs to when it is the direct value of a class
/// attribute: `<p className={cn("...")}>`.
fn helper_owner(file: &SourceFile, call: Node<'_>, tables: &RuleTables) -> Option<String> {
    let container = logical_parent(call)?;
    if NodeKind::of(&container) != NodeKind::JsxExpression {
        return None;
    }
    let attr = container.parent()?;
    if NodeKind::of(&attr) != NodeKind::JsxAttribute {
        return None;
    }
    let (name, _) = file.jsx_attribute(attr);
    if !name.is_some_and(|n| RuleTables::contains(&tables.class_attributes, n)) {
        return None;
    }
    let tag = attr.parent()?;
    file.jsx_tag_name(tag).map(str::to_string)
}

pub struct UtilityClassAnalyzer {
    config: GateConfig,
    tables: RuleTables,
    tokenizer: ClassTokenizer,
}

impl UtilityClassAnalyzer {
    pub fn new(config: GateConfig, tables: RuleTables) -> Self {
        let tokenizer = ClassTokenizer::new(tables.variants.clone());
        Self {
            config,
            tables,
            tokenizer,
        }
    }

    pub fn check_classes(&self, classes: &[ClassString]) -> (Vec<Violation>, UtilityClassMetrics) {
        let tokenized: Vec<(&ClassString, Vec<ClassToken>)> = classes
            .iter()
            .map(|c| (c, self.tokenizer.tokenize_classes(&c.value)))
            .collect();
        let all: Vec<&ClassToken> = tokenized.iter().flat_map(|(_, t)| t.iter()).collect();
        let limits = &self.config.thresholds;

        let mut violations = Vec::new();
        let mut metrics = UtilityClassMetrics::default();

        let max_w: BTreeSet<String> = all
            .iter()
            .filter(|t| t.utility == "max-w" && !t.value.is_empty())
            .map(|t| format!("max-w-{}", t.value))
            .collect();
        metrics.unique_max_w_values = max_w.len();
        if max_w.len() > limits.max_container_variants {
            violations.push(Violation::error(
                "MAX_CONTAINER_VARIANTS",
                format!(
                    "Too many max-w-* variants ({}). Keep to {} or fewer for consistency.",
                    max_w.len(),
                    limits.max_container_variants
                ),
            ));
        }

        let spacing: BTreeSet<String> = all
            .iter()
            .filter(|t| RuleTables::contains(&self.tables.spacing_utilities, &t.utility))
            .filter(|t| !t.value.is_empty() && t.value != "0")
            .map(|t| format!("{}-{}", t.utility, t.value))
            .collect();
        metrics.unique_spacing_values = spacing.len();
        if spacing.len() > limits.max_spacing_variants {
            violations.push(Violation::error(
                "SPACING_VARIANCE",
                format!(
                    "Too many spacing variants ({}). Keep to {} or fewer for consistency.",
                    spacing.len(),
                    limits.max_spacing_variants
                ),
            ));
        }

        for (origin, tokens) in &tokenized {
            for token in tokens {
                if token.arbitrary {
                    metrics.arbitrary_value_count += 1;
                    violations.push(origin.violation(Violation::error(
                        "NO_ARBITRARY_VALUES",
                        format!("Arbitrary value detected: {}. Use design tokens instead.", token.raw),
                    )));
                }
                if token.utility == "grid-cols" && !token.arbitrary {
                    if let Ok(cols) = token.value.parse::<u32>() {
                        metrics.max_grid_cols = metrics.max_grid_cols.max(cols);
                        if cols > limits.max_grid_cols {
                            violations.push(origin.violation(Violation::warning(
                                "MAX_GRID_COLS",
                                format!(
                                    "Grid too dense ({} columns). Consider reducing to {} or fewer columns.",
                                    cols, limits.max_grid_cols
                                ),
                            )));
                        }
                    }
                }
            }
        }

        let font_sizes: BTreeSet<&str> = all
            .iter()
            .filter(|t| t.utility == "text" && TEXT_SIZE_SCALE.contains(&t.value.as_str()))
            .map(|t| t.value.as_str())
            .collect();
        metrics.unique_font_sizes = font_sizes.len();
        if font_sizes.len() > limits.max_font_sizes {
            violations.push(Violation::warning(
                "FONT_VARIANT_LIMIT",
                format!(
                    "Too many font size variants ({}). Limit to {} or fewer for better readability hierarchy.",
                    font_sizes.len(),
                    limits.max_font_sizes
                ),
            ));
        }

        for (origin, tokens) in &tokenized {
            let Some(element) = origin.element.as_deref() else { continue };
            if !RuleTables::contains(&self.tables.body_text_elements, element) {
                continue;
            }
            let sized = tokens
                .iter()
                .filter(|t| t.utility == "text")
                .find_map(|t| text_size_rank(&t.value).map(|rank| (t, rank)));
            if let Some((token, rank)) = sized {
                if rank > limits.body_text_max_rank {
                    violations.push(origin.violation(Violation::error(
                        "TEXT_HIERARCHY_CHECK",
                        format!(
                            "Body text (<{}>) too large (text-{}, scale {}). Use text-xl or smaller for body text.",
                            element, token.value, rank
                        ),
                    )));
                }
            }
        }

        (violations, metrics)
    }
}

impl Default for UtilityClassAnalyzer {
    fn default() -> Self {
        Self::new(GateConfig::default(), RuleTables::default())
    }
}

impl StaticAnalyzer for UtilityClassAnalyzer {
    fn name(&self) -> &'static str {
        "utility-classes"
    }

    fn analyze(&self, file: &SourceFile) -> FileAnalysis {
        let classes = extract_class_strings(file, &self.config, &self.tables);
        let (violations, metrics) = self.check_classes(&classes);
        FileAnalysis {
            violations: violations.into_iter().map(|v| v.in_file(&file.path)).collect(),
            metrics: AnalyzerMetrics::UtilityClasses(metrics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::syntax::parse_snippet;

    fn run(source: &str) -> (Vec<Violation>, UtilityClassMetrics) {
        let file = parse_snippet("Page.tsx", source);
        let analysis = UtilityClassAnalyzer::default().analyze(&file);
        let AnalyzerMetrics::UtilityClasses(metrics) = analysis.metrics else {
            panic!("utility metrics expected");
        };
        (analysis.violations, metrics)
    }

    #[test]
    fn test_container_variance_across_elements() {
        let source = r#"export const P = () => (
  <main>
    <div className="max-w-sm" />
    <div className="max-w-md" />
    <section id="a" className="max-w-lg" />
    <div className="max-w-xl" />
    <div className="max-w-2xl mx-auto" />
  </main>
);
"#;
        let (violations, metrics) = run(source);
        assert_eq!(metrics.unique_max_w_values, 5);
        let rules: Vec<&str> = violations.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["MAX_CONTAINER_VARIANTS"]);
        assert!(violations[0].line.is_none());
        assert_eq!(violations[0].file.as_deref(), Some("Page.tsx"));
    }

    #[test]
    fn test_four_containers_pass() {
        let (violations, _) = run(
            "export const P = () => <div className=\"max-w-sm max-w-md max-w-lg max-w-xl max-w-sm\" />;\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_spacing_variance_ignores_zero() {
        let (violations, metrics) = run(
            "export const P = () => <div className=\"px-1 px-2 py-1 py-2 gap-4 mt-8 mb-0 pt-0\" />;\n",
        );
        assert_eq!(metrics.unique_spacing_values, 6);
        assert!(violations.is_empty());
        let (violations, _) = run(
            "export const P = () => <div className=\"px-1 px-2 py-1 py-2 gap-4 mt-8 mb-2\" />;\n",
        );
        assert_eq!(violations[0].rule, "SPACING_VARIANCE");
    }

    #[test]
    fn test_arbitrary_values_located_at_class_string() {
        let (violations, metrics) = run(
            "export const P = () => (\n  <div\n    className={`w-[123px] ${x} md:h-[2rem]`}\n  />\n);\n",
        );
        assert_eq!(metrics.arbitrary_value_count, 2);
        assert!(violations.iter().all(|v| v.rule == "NO_ARBITRARY_VALUES" && v.line == Some(3)));
        assert!(violations[1].message.contains("md:h-[2rem]"));
    }

    #[test]
    fn test_helper_calls_are_extracted() {
        let (violations, metrics) = run(
            "const c = cn(\"grid grid-cols-6\", active && \"grid-cols-2\");\nexport const P = () => <p className={clsx('text-4xl', cond)} />;\n",
        );
        assert_eq!(metrics.max_grid_cols, 6);
        let rules: Vec<&str> = violations.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["MAX_GRID_COLS", "TEXT_HIERARCHY_CHECK"]);
        assert!(violations[1].message.contains("<p>"));
        assert!(violations[1].message.contains("text-4xl, scale 8"));
    }

    #[test]
    fn test_hierarchy_allows_headings_and_xl() {
        let (violations, _) = run(
            "export const P = () => <>\n<h1 className=\"text-6xl\">T</h1>\n<span className=\"text-xl\">b</span>\n</>;\n",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_font_variant_limit() {
        let (violations, metrics) = run(
            "export const P = () => <h2 className=\"text-xs text-sm text-base text-lg text-xl text-2xl text-3xl text-red-500\" />;\n",
        );
        assert_eq!(metrics.unique_font_sizes, 7);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule, "FONT_VARIANT_LIMIT");
    }
}
