//! Structural rules over JSX/TSX component files: inline styles, literal
//! colors and pixel spacing, layout-thrashing animations, section ids and
//! element nesting.

use crate::config::GateConfig;
use crate::rules::Violation;
use crate::rules::static_analysis::{FileAnalysis, StaticAnalyzer};
use crate::rules::syntax::{NodeKind, SourceFile, location, named_children, unwrap_parens};
use crate::rules::tables::RuleTables;
use crate::rules::visitor::{NodeRule, RuleContext, walk};
use tree_sitter::Node;

static HEX_COLOR_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"(?i)^#(?:[0-9a-f]{3}){1,2}$").unwrap());
static PX_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"^(\d+)px$").unwrap());
static TRANSITION_ALL_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"(?i)transition\s*:\s*all").unwrap());
static ALL_PREFIX_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"(?i)^\s*all\b").unwrap());

const TRANSITION_ALL_MESSAGE: &str =
    "Avoid \"transition: all\". Specify exact properties to transition instead.";

pub fn is_color_value(value: &str, tables: &RuleTables) -> bool {
    if HEX_COLOR_RE.is_match(value) {
        return true;
    }
    if value.starts_with("rgb(") || value.starts_with("rgba(") {
        return true;
    }
    if value.starts_with("hsl(") || value.starts_with("hsla(") {
        return true;
    }
    let lower = value.to_lowercase();
    RuleTables::contains(&tables.named_colors, &lower)
}

/// Literal text of a JSX attribute value: `"x"`, `{"x"}` or `` {`x`} ``.
pub fn attribute_literal(file: &SourceFile, value: Node<'_>) -> Option<String> {
    match NodeKind::of(&value) {
        NodeKind::String => file.string_value(value),
        NodeKind::JsxExpression => {
            let inner = unwrap_parens(named_children(value).into_iter().next()?);
            file.literal_value(inner)
        }
        _ => None,
    }
}

/// Object literal inside a JSX expression value (`style={{...}}`).
fn attribute_object(value: Node<'_>) -> Option<Node<'_>> {
    if NodeKind::of(&value) != NodeKind::JsxExpression {
        return None;
    }
    let inner = unwrap_parens(named_children(value).into_iter().next()?);
    (NodeKind::of(&inner) == NodeKind::Object).then_some(inner)
}

/// `(object, method)` of a call like `gsap.to(...)` when the callee is one of
/// the configured animation objects and a tracked method.
pub fn animation_call<'f>(
    call: Node<'_>,
    file: &'f SourceFile,
    config: &GateConfig,
    tables: &RuleTables,
) -> Option<(&'f str, &'f str)> {
    let callee = call.child_by_field_name("function")?;
    if NodeKind::of(&callee) != NodeKind::MemberExpression {
        return None;
    }
    let object = callee.child_by_field_name("object")?;
    let property = callee.child_by_field_name("property")?;
    if NodeKind::of(&object) != NodeKind::Identifier {
        return None;
    }
    let object_name = file.text(object);
    let method = file.text(property);
    if !config.is_animation_object(object_name)
        || !RuleTables::contains(&tables.animation_methods, method)
    {
        return None;
    }
    Some((object_name, method))
}

/// The tween vars object: third argument of `fromTo`, second otherwise.
pub fn animation_vars<'t>(call: Node<'t>, method: &str) -> Option<Node<'t>> {
    let args = call.child_by_field_name("arguments")?;
    let index = if method == "fromTo" { 2 } else { 1 };
    let vars = unwrap_parens(*named_children(args).get(index)?);
    (NodeKind::of(&vars) == NodeKind::Object).then_some(vars)
}

struct InlineStyles;

impl NodeRule for InlineStyles {
    fn id(&self) -> &'static str {
        "NO_INLINE_STYLES"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind == NodeKind::JsxAttribute
    }

    fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let (name, value) = ctx.file.jsx_attribute(node);
        if name != Some("style") {
            return Vec::new();
        }
        let Some(object) = value.and_then(attribute_object) else {
            return Vec::new();
        };

        let members = named_children(object);
        if let [only] = members.as_slice() {
            if NodeKind::of(only) == NodeKind::Pair
                && ctx.file.property_key(*only).as_deref() == Some("display")
            {
                let display = only.child_by_field_name("value").and_then(|v| ctx.file.string_value(v));
                if display.as_deref() == Some("none") {
                    return Vec::new();
                }
            }
        }

        vec![
            Violation::error(
                self.id(),
                "Inline style objects should not be used. Use CSS classes instead.",
            )
            .at(location(node)),
        ]
    }
}

struct HardcodedColors;

impl NodeRule for HardcodedColors {
    fn id(&self) -> &'static str {
        "NO_HARDCODED_COLORS"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        matches!(kind, NodeKind::JsxAttribute | NodeKind::Pair)
    }

    fn check(&self, node: Node<'_>, kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let (prop, origin, value) = if kind == NodeKind::JsxAttribute {
            let (name, value) = ctx.file.jsx_attribute(node);
            let Some(name) = name else { return Vec::new() };
            let value = value.and_then(|v| attribute_literal(ctx.file, v));
            (name.to_string(), name.to_string(), value)
        } else {
            let Some(key) = ctx.file.property_key(node) else { return Vec::new() };
            let value = node
                .child_by_field_name("value")
                .and_then(|v| ctx.file.literal_value(v));
            (key.clone(), format!("style.{}", key), value)
        };

        if !RuleTables::contains(&ctx.tables.color_props, &prop) {
            return Vec::new();
        }
        match value {
            Some(v) if !v.contains("var(--") && is_color_value(&v, ctx.tables) => vec![
                Violation::error(
                    self.id(),
                    format!(
                        "Hardcoded color value \"{}\" found in {}. Use CSS custom properties instead.",
                        v, origin
                    ),
                )
                .at(location(node)),
            ],
            _ => Vec::new(),
        }
    }
}

struct HardcodedPx;

impl NodeRule for HardcodedPx {
    fn id(&self) -> &'static str {
        "NO_HARDCODED_PX"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind == NodeKind::Pair
    }

    fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let Some(key) = ctx.file.property_key(node) else { return Vec::new() };
        if !RuleTables::contains(&ctx.tables.spacing_style_props, &key) {
            return Vec::new();
        }
        let Some(value) = node
            .child_by_field_name("value")
            .and_then(|v| ctx.file.literal_value(v))
        else {
            return Vec::new();
        };
        let Some(caps) = PX_RE.captures(&value) else { return Vec::new() };
        let amount: u64 = caps[1].parse().unwrap_or(u64::MAX);
        if amount <= 1 {
            return Vec::new();
        }
        vec![
            Violation::warning(
                self.id(),
                format!(
                    "Hardcoded pixel value \"{}\" in {}. Consider using design tokens or CSS variables.",
                    value, key
                ),
            )
            .at(location(node)),
        ]
    }
}

struct LayoutAnimation;

impl NodeRule for LayoutAnimation {
    fn id(&self) -> &'static str {
        "NO_LAYOUT_ANIMATION"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind == NodeKind::CallExpression
    }

    fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let Some((object, method)) = animation_call(node, ctx.file, ctx.config, ctx.tables) else {
            return Vec::new();
        };
        let Some(vars) = animation_vars(node, method) else { return Vec::new() };
        let layout: Vec<String> = ctx
            .file
            .object_entries(vars)
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| RuleTables::contains(&ctx.tables.layout_animation_props, key))
            .collect();
        if layout.is_empty() {
            return Vec::new();
        }
        vec![
            Violation::error(
                self.id(),
                format!(
                    "{}.{}() animates layout properties [{}]. Use transform instead to avoid layout thrashing.",
                    object,
                    method,
                    layout.join(", ")
                ),
            )
            .at(location(node)),
        ]
    }
}

struct AnimationFrom;

impl NodeRule for AnimationFrom {
    fn id(&self) -> &'static str {
        "NO_GSAP_FROM"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind == NodeKind::CallExpression
    }

    fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        match animation_call(node, ctx.file, ctx.config, ctx.tables) {
            Some((object, "from")) => vec![
                Violation::error(
                    self.id(),
                    format!(
                        "{0}.from() should not be used. Use {0}.set() + {0}.to() instead for better control and clarity.",
                        object
                    ),
                )
                .at(location(node)),
            ],
            _ => Vec::new(),
        }
    }
}

struct TransitionAll;

impl NodeRule for TransitionAll {
    fn id(&self) -> &'static str {
        "NO_TRANSITION_ALL"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        matches!(kind, NodeKind::String | NodeKind::TemplateString | NodeKind::Pair)
    }

    fn check(&self, node: Node<'_>, kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let hit = match kind {
            NodeKind::Pair => {
                ctx.file.property_key(node).as_deref() == Some("transition")
                    && node
                        .child_by_field_name("value")
                        .and_then(|v| ctx.file.literal_value(v))
                        .is_some_and(|v| ALL_PREFIX_RE.is_match(&v))
            }
            _ => ctx
                .file
                .literal_value(node)
                .is_some_and(|v| TRANSITION_ALL_RE.is_match(&v)),
        };
        if hit {
            vec![Violation::error(self.id(), TRANSITION_ALL_MESSAGE).at(location(node))]
        } else {
            Vec::new()
        }
    }
}

struct SectionNeedsId;

impl NodeRule for SectionNeedsId {
    fn id(&self) -> &'static str {
        "SECTION_NEEDS_ID"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind.is_jsx_tag()
    }

    fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let Some(name) = ctx.file.jsx_tag_name(node) else { return Vec::new() };
        if !RuleTables::contains(&ctx.tables.section_elements, name)
            || ctx.file.has_jsx_attribute(node, "id")
        {
            return Vec::new();
        }
        vec![
            Violation::error(
                self.id(),
                format!(
                    "<{}> element must have an id attribute for accessibility and tracking.",
                    name
                ),
            )
            .at(location(node)),
        ]
    }
}

struct MaxSectionChildren;

impl NodeRule for MaxSectionChildren {
    fn id(&self) -> &'static str {
        "MAX_CHILDREN_PER_SECTION"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind == NodeKind::JsxElement
    }

    fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let Some(open) = node.child_by_field_name("open_tag") else { return Vec::new() };
        let Some(name) = ctx.file.jsx_tag_name(open) else { return Vec::new() };
        if !RuleTables::contains(&ctx.tables.section_elements, name) {
            return Vec::new();
        }
        let count = named_children(node)
            .iter()
            .filter(|c| {
                let kind = NodeKind::of(c);
                kind.is_jsx_element() || kind == NodeKind::JsxExpression
            })
            .count();
        let max = ctx.config.thresholds.max_section_children;
        if count <= max {
            return Vec::new();
        }
        vec![
            Violation::warning(
                self.id(),
                format!(
                    "<{}> has {} direct children, exceeds max of {}. Consider breaking into sub-components.",
                    name, count, max
                ),
            )
            .at(location(open)),
        ]
    }
}

struct ComponentDepth;

impl NodeRule for ComponentDepth {
    fn id(&self) -> &'static str {
        "COMPONENT_DEPTH_CHECK"
    }

    fn interested_in(&self, kind: NodeKind) -> bool {
        kind.is_jsx_element()
    }

    fn check(&self, node: Node<'_>, kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
        let max = ctx.config.thresholds.max_component_depth;
        if ctx.jsx_depth <= max {
            return Vec::new();
        }
        let anchor = if kind == NodeKind::JsxElement {
            node.child_by_field_name("open_tag").unwrap_or(node)
        } else {
            node
        };
        vec![
            Violation::warning(
                self.id(),
                format!(
                    "JSX nesting depth is {}, exceeds max of {}. Consider extracting components to reduce nesting.",
                    ctx.jsx_depth, max
                ),
            )
            .at(location(anchor)),
        ]
    }
}

pub struct StructuralAnalyzer {
    config: GateConfig,
    tables: RuleTables,
    rules: Vec<Box<dyn NodeRule>>,
}

impl StructuralAnalyzer {
    pub fn new(config: GateConfig, tables: RuleTables) -> Self {
        Self {
            config,
            tables,
            rules: vec![
                Box::new(InlineStyles),
                Box::new(HardcodedColors),
                Box::new(HardcodedPx),
                Box::new(LayoutAnimation),
                Box::new(AnimationFrom),
                Box::new(TransitionAll),
                Box::new(SectionNeedsId),
                Box::new(MaxSectionChildren),
                Box::new(ComponentDepth),
            ],
        }
    }
}

impl Default for StructuralAnalyzer {
    fn default() -> Self {
        Self::new(GateConfig::default(), RuleTables::default())
    }
}

impl StaticAnalyzer for StructuralAnalyzer {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn analyze(&self, file: &SourceFile) -> FileAnalysis {
        FileAnalysis::violations(walk(file, &self.rules, &self.config, &self.tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::syntax::parse_snippet;

    fn run(source: &str) -> Vec<Violation> {
        let file = parse_snippet("Component.tsx", source);
        StructuralAnalyzer::default().analyze(&file).violations
    }

    fn rules_of(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.rule.as_str()).collect()
    }

    #[test]
    fn test_inline_color_style_flags_color_once() {
        let found = run("export const A = () => <div style={{color: \"#ff0000\"}}>x</div>;\n");
        let colors: Vec<&Violation> = found.iter().filter(|v| v.rule == "NO_HARDCODED_COLORS").collect();
        assert_eq!(colors.len(), 1);
        assert!(colors[0].message.contains("\"#ff0000\""));
        assert!(colors[0].message.contains("style.color"));
        assert!(rules_of(&found).contains(&"NO_INLINE_STYLES"));
    }

    #[test]
    fn test_display_none_is_allowed() {
        let found = run("export const A = () => <div style={{ display: 'none' }} />;\n");
        assert!(found.is_empty(), "{:?}", found);
        let found = run("export const A = () => <div style={{ display: 'block' }} />;\n");
        assert_eq!(rules_of(&found), vec!["NO_INLINE_STYLES"]);
    }

    #[test]
    fn test_color_attribute_and_var_exception() {
        let found = run(
            "export const A = () => <>\n  <Icon color=\"red\" />\n  <Icon color=\"var(--brand)\" />\n  <Icon fill=\"#fff\" />\n</>;\n",
        );
        assert_eq!(rules_of(&found), vec!["NO_HARDCODED_COLORS"]);
        assert_eq!(found[0].line, Some(2));
        assert!(found[0].message.contains("found in color."));
    }

    #[test]
    fn test_px_boundaries() {
        let source = |v: &str| format!("const s = {{ padding: \"{}\" }};\n", v);
        assert!(run(&source("0px")).is_empty());
        assert!(run(&source("1px")).is_empty());
        let found = run(&source("2px"));
        assert_eq!(rules_of(&found), vec!["NO_HARDCODED_PX"]);
        assert_eq!(found[0].severity, crate::rules::Severity::Warning);
        assert!(run("const s = { fontSize: \"14px\" };\n").is_empty());
    }

    #[test]
    fn test_layout_animation_names_width() {
        let found = run("gsap.to(el, { width: 300, duration: 0.5 });\n");
        assert_eq!(rules_of(&found), vec!["NO_LAYOUT_ANIMATION"]);
        assert!(found[0].message.contains("[width]"));
        assert!(run("gsap.to(el, { x: 300, duration: 0.5 });\n").is_empty());
    }

    #[test]
    fn test_from_to_uses_third_argument() {
        let found = run("gsap.fromTo(el, { height: 0 }, { opacity: 1 });\n");
        assert!(found.is_empty(), "{:?}", found);
        let found = run("gsap.fromTo(el, { opacity: 0 }, { top: 10, left: 4 });\n");
        assert!(found[0].message.contains("[top, left]"));
    }

    #[test]
    fn test_from_is_always_flagged() {
        let found = run("gsap.from(el, { opacity: 0 });\n");
        assert_eq!(rules_of(&found), vec!["NO_GSAP_FROM"]);
        assert!(run("anime.from(el, { opacity: 0 });\n").is_empty());
    }

    #[test]
    fn test_transition_all_forms() {
        assert_eq!(rules_of(&run("const a = \"transition: all 0.2s\";\n")), vec!["NO_TRANSITION_ALL"]);
        assert_eq!(rules_of(&run("const a = `TRANSITION:all ${d}`;\n")), vec!["NO_TRANSITION_ALL"]);
        assert_eq!(rules_of(&run("const s = { transition: \"all 0.3s ease\" };\n")), vec!["NO_TRANSITION_ALL"]);
        assert!(run("const s = { transition: \"opacity 0.3s\" };\n").is_empty());
    }

    #[test]
    fn test_section_needs_id() {
        let found = run("export const A = () => <section><p>x</p></section>;\n");
        assert_eq!(rules_of(&found), vec!["SECTION_NEEDS_ID"]);
        assert!(found[0].message.starts_with("<section>"));
        assert!(run("export const A = () => <Section id=\"hero\" />;\n").is_empty());
        assert_eq!(rules_of(&run("export const A = () => <Section />;\n")), vec!["SECTION_NEEDS_ID"]);
    }

    #[test]
    fn test_section_children_boundary() {
        let section = |n: usize| {
            let children: String = (0..n).map(|i| format!("<p>{}</p>", i)).collect();
            format!("export const A = () => <section id=\"s\">{}</section>;\n", children)
        };
        assert!(run(&section(8)).is_empty());
        let found = run(&section(9));
        assert_eq!(rules_of(&found), vec!["MAX_CHILDREN_PER_SECTION"]);
        assert!(found[0].message.contains("has 9 direct children"));
    }

    #[test]
    fn test_component_depth() {
        let nest = |n: usize| {
            let open: String = (0..n).map(|_| "<div>").collect();
            let close: String = (0..n).map(|_| "</div>").collect();
            format!("export const A = () => {}{};\n", open, close)
        };
        assert!(run(&nest(6)).is_empty());
        let found = run(&nest(7));
        assert_eq!(rules_of(&found), vec!["COMPONENT_DEPTH_CHECK"]);
        assert!(found[0].message.contains("depth is 7"));
    }

    #[test]
    fn test_rerun_is_identical() {
        let source = "export const A = () => <section style={{ margin: \"12px\", color: \"blue\" }}>\n  {gsap.from(el, {})}\n</section>;\n";
        let first = run(source);
        let second = run(source);
        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
