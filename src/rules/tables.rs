//! Static matching tables shared by the analyzers.
//!
//! Nothing here is mutated at runtime; analyzers take a `&RuleTables` so a
//! caller can swap in its own lists without touching global state.

use crate::rules::Severity;

pub const RESPONSIVE_VARIANTS: &[&str] = &["sm", "md", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "6xl"];

pub const STATE_VARIANTS: &[&str] = &[
    "hover",
    "focus",
    "active",
    "disabled",
    "group-hover",
    "group-focus",
    "focus-visible",
    "focus-within",
    "visited",
    "target",
    "first",
    "last",
    "odd",
    "even",
    "only-child",
    "only-of-type",
    "empty",
    "checked",
    "indeterminate",
    "invalid",
    "required",
    "valid",
    "read-only",
    "read-write",
    "placeholder-shown",
    "autofill",
    "enabled",
    "dark",
    "light",
];

pub const COLOR_PROPS: &[&str] = &[
    "color",
    "backgroundColor",
    "borderColor",
    "borderTopColor",
    "borderBottomColor",
    "borderLeftColor",
    "borderRightColor",
    "outlineColor",
    "textShadow",
    "boxShadow",
];

pub const NAMED_COLORS: &[&str] = &[
    "red", "blue", "green", "black", "white", "gray", "yellow", "orange", "purple", "pink", "brown",
    "cyan", "magenta", "lime", "navy", "teal", "olive", "maroon", "silver", "gold",
];

pub const SPACING_STYLE_PROPS: &[&str] = &[
    "padding",
    "paddingTop",
    "paddingBottom",
    "paddingLeft",
    "paddingRight",
    "margin",
    "marginTop",
    "marginBottom",
    "marginLeft",
    "marginRight",
    "width",
    "height",
    "gap",
    "rowGap",
    "columnGap",
];

pub const LAYOUT_ANIMATION_PROPS: &[&str] = &[
    "width",
    "height",
    "margin",
    "marginTop",
    "marginBottom",
    "marginLeft",
    "marginRight",
    "padding",
    "paddingTop",
    "paddingBottom",
    "paddingLeft",
    "paddingRight",
    "top",
    "left",
    "right",
    "bottom",
];

pub const ANIMATION_METHODS: &[&str] = &["to", "from", "fromTo"];

pub const SPACING_UTILITIES: &[&str] = &[
    "py", "px", "gap", "space-y", "space-x", "mt", "mb", "ml", "mr", "pt", "pb", "pl", "pr",
];

/// Named text sizes in ascending order; rank = index + 1.
pub const TEXT_SIZE_SCALE: &[&str] = &[
    "xs", "sm", "base", "lg", "xl", "2xl", "3xl", "4xl", "5xl", "6xl", "7xl", "8xl", "9xl",
];

pub const BODY_TEXT_ELEMENTS: &[&str] = &["p", "span", "div", "label", "li", "td", "th"];

pub const SECTION_ELEMENTS: &[&str] = &["Section", "section"];

pub const CLASS_ATTRIBUTES: &[&str] = &["className", "class"];

/// Diagnostic codes the semantic layer surfaces as NO_IMPLICIT_ANY.
pub const IMPLICIT_ANY_CODES: &[u32] = &[7005, 7006, 7008, 7009, 7019, 7031];

pub const TOKEN_COLOR_PROPS: &[&str] = &["color", "backgroundColor", "borderColor", "fill", "stroke"];

pub const TOKEN_OBJECTS: &[&str] = &["tokens", "token"];

pub fn text_size_rank(size: &str) -> Option<usize> {
    TEXT_SIZE_SCALE.iter().position(|s| *s == size).map(|i| i + 1)
}

#[derive(Debug, Clone)]
pub struct RuleTables {
    pub variants: Vec<String>,
    pub color_props: Vec<String>,
    pub named_colors: Vec<String>,
    pub spacing_style_props: Vec<String>,
    pub layout_animation_props: Vec<String>,
    pub animation_methods: Vec<String>,
    pub spacing_utilities: Vec<String>,
    pub body_text_elements: Vec<String>,
    pub section_elements: Vec<String>,
    pub class_attributes: Vec<String>,
    pub implicit_any_codes: Vec<u32>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            variants: RESPONSIVE_VARIANTS
                .iter()
                .chain(STATE_VARIANTS.iter())
                .map(|s| s.to_string())
                .collect(),
            color_props: owned(COLOR_PROPS),
            named_colors: owned(NAMED_COLORS),
            spacing_style_props: owned(SPACING_STYLE_PROPS),
            layout_animation_props: owned(LAYOUT_ANIMATION_PROPS),
            animation_methods: owned(ANIMATION_METHODS),
            spacing_utilities: owned(SPACING_UTILITIES),
            body_text_elements: owned(BODY_TEXT_ELEMENTS),
            section_elements: owned(SECTION_ELEMENTS),
            class_attributes: owned(CLASS_ATTRIBUTES),
            implicit_any_codes: IMPLICIT_ANY_CODES.to_vec(),
        }
    }
}

impl RuleTables {
    pub fn contains(list: &[String], value: &str) -> bool {
        list.iter().any(|s| s == value)
    }
}

/// Catalog entry printed by `brudi-gate rules`.
pub struct RuleInfo {
    pub id: &'static str,
    pub severity: Severity,
    pub analyzer: &'static str,
    pub description: &'static str,
}

pub const RULE_CATALOG: &[RuleInfo] = &[
    RuleInfo { id: "NO_INLINE_STYLES", severity: Severity::Error, analyzer: "structural", description: "style={{...}} object literals (display: none excepted)" },
    RuleInfo { id: "NO_HARDCODED_COLORS", severity: Severity::Error, analyzer: "structural", description: "literal hex/rgb/hsl/named colors in color props" },
    RuleInfo { id: "NO_HARDCODED_PX", severity: Severity::Warning, analyzer: "structural", description: "literal px spacing in style objects (0px/1px excepted)" },
    RuleInfo { id: "NO_LAYOUT_ANIMATION", severity: Severity::Error, analyzer: "structural", description: "animation calls tweening layout properties" },
    RuleInfo { id: "NO_GSAP_FROM", severity: Severity::Error, analyzer: "structural", description: "any call to the animation library's from()" },
    RuleInfo { id: "NO_TRANSITION_ALL", severity: Severity::Error, analyzer: "structural", description: "transition: all in strings or style objects" },
    RuleInfo { id: "SECTION_NEEDS_ID", severity: Severity::Error, analyzer: "structural", description: "<section>/<Section> without an id attribute" },
    RuleInfo { id: "MAX_CHILDREN_PER_SECTION", severity: Severity::Warning, analyzer: "structural", description: "too many direct children in a section" },
    RuleInfo { id: "COMPONENT_DEPTH_CHECK", severity: Severity::Warning, analyzer: "structural", description: "JSX element nesting too deep" },
    RuleInfo { id: "MAX_CONTAINER_VARIANTS", severity: Severity::Error, analyzer: "utility-classes", description: "too many distinct max-w-* values" },
    RuleInfo { id: "SPACING_VARIANCE", severity: Severity::Error, analyzer: "utility-classes", description: "too many distinct spacing utilities" },
    RuleInfo { id: "NO_ARBITRARY_VALUES", severity: Severity::Error, analyzer: "utility-classes", description: "bracketed arbitrary utility values" },
    RuleInfo { id: "MAX_GRID_COLS", severity: Severity::Warning, analyzer: "utility-classes", description: "grid-cols-N above the density limit" },
    RuleInfo { id: "FONT_VARIANT_LIMIT", severity: Severity::Warning, analyzer: "utility-classes", description: "too many distinct text sizes" },
    RuleInfo { id: "TEXT_HIERARCHY_CHECK", severity: Severity::Error, analyzer: "utility-classes", description: "hero-scale text size on body-text elements" },
    RuleInfo { id: "NO_ANY_TYPE", severity: Severity::Error, analyzer: "semantic", description: "explicit any annotations" },
    RuleInfo { id: "NO_IMPLICIT_ANY", severity: Severity::Error, analyzer: "semantic", description: "implicit any diagnostics" },
    RuleInfo { id: "NO_UNUSED_IMPORTS", severity: Severity::Warning, analyzer: "semantic", description: "imported bindings never referenced" },
    RuleInfo { id: "NO_DEFAULT_EXPORT_ANON", severity: Severity::Warning, analyzer: "semantic", description: "anonymous or aliased default exports" },
    RuleInfo { id: "NO_DEEP_NESTING", severity: Severity::Warning, analyzer: "semantic", description: "functions nested too deep" },
    RuleInfo { id: "NO_PROP_DRILLING", severity: Severity::Warning, analyzer: "semantic", description: "props forwarded through too many levels" },
    RuleInfo { id: "STRICT_MODE_CHECK", severity: Severity::Error, analyzer: "semantic", description: "project config missing or not strict" },
    RuleInfo { id: "NO_DUPLICATED_TYPES", severity: Severity::Warning, analyzer: "semantic", description: "structurally identical type declarations" },
    RuleInfo { id: "NO_CIRCULAR_IMPORTS", severity: Severity::Error, analyzer: "semantic", description: "file sits on an import cycle" },
    RuleInfo { id: "CIRCULAR_DEPENDENCY", severity: Severity::Error, analyzer: "import-graph", description: "distinct import cycles in the project" },
    RuleInfo { id: "DEEP_IMPORT_CHAIN", severity: Severity::Warning, analyzer: "import-graph", description: "longest import chain above the limit" },
    RuleInfo { id: "PRIMITIVES_NOT_USED", severity: Severity::Warning, analyzer: "import-graph", description: "primitives directory never imported" },
    RuleInfo { id: "PRIMITIVES_OVERWRITTEN", severity: Severity::Warning, analyzer: "import-graph", description: "primitives re-exported or wrapped" },
    RuleInfo { id: "DUPLICATE_IMPORT", severity: Severity::Warning, analyzer: "import-graph", description: "module imported by too many files" },
    RuleInfo { id: "HARDCODED_DURATION", severity: Severity::Error, analyzer: "tokens", description: "numeric duration in animation config" },
    RuleInfo { id: "HARDCODED_EASING", severity: Severity::Error, analyzer: "tokens", description: "string easing in animation config" },
    RuleInfo { id: "HARDCODED_COLOR_IN_JSX", severity: Severity::Error, analyzer: "tokens", description: "color literal instead of a design token" },
    RuleInfo { id: "TOKEN_DEFINED_NOT_USED", severity: Severity::Warning, analyzer: "tokens", description: "exported token never referenced" },
    RuleInfo { id: "PARSE_ERROR", severity: Severity::Error, analyzer: "engine", description: "file could not be parsed" },
    RuleInfo { id: "ANALYZER_ERROR", severity: Severity::Warning, analyzer: "engine", description: "an analyzer faulted on a file" },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_size_rank_is_one_based() {
        assert_eq!(text_size_rank("xs"), Some(1));
        assert_eq!(text_size_rank("xl"), Some(5));
        assert_eq!(text_size_rank("9xl"), Some(13));
        assert_eq!(text_size_rank("center"), None);
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let mut ids: Vec<&str> = RULE_CATALOG.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), RULE_CATALOG.len());
    }
}
