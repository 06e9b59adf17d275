//! Single generic traversal that dispatches every node to the rules that
//! registered interest in its kind.

use crate::config::GateConfig;
use crate::rules::Violation;
use crate::rules::syntax::{NodeKind, SourceFile};
use crate::rules::tables::RuleTables;
use tree_sitter::Node;

pub struct RuleContext<'a> {
    pub file: &'a SourceFile,
    pub config: &'a GateConfig,
    pub tables: &'a RuleTables,
    /// Number of JSX elements on the path from the root to the current node,
    /// counting the node itself when it is an element.
    pub jsx_depth: usize,
}

/// One check: a pure function of the node and the traversal context.
pub trait NodeRule: Send + Sync {
    fn id(&self) -> &'static str;
    fn interested_in(&self, kind: NodeKind) -> bool;
    fn check(&self, node: Node<'_>, kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation>;
}

/// Walks `file` once in pre-order, feeding each node to the interested rules.
/// Violations come back in traversal order and carry the file path.
pub fn walk(
    file: &SourceFile,
    rules: &[Box<dyn NodeRule>],
    config: &GateConfig,
    tables: &RuleTables,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut ctx = RuleContext {
        file,
        config,
        tables,
        jsx_depth: 0,
    };

    let mut cursor = file.root().walk();
    let mut path_is_element: Vec<bool> = Vec::new();
    loop {
        let node = cursor.node();
        let kind = NodeKind::of(&node);
        let is_element = kind.is_jsx_element();
        if is_element {
            ctx.jsx_depth += 1;
        }
        for rule in rules.iter().filter(|r| r.interested_in(kind)) {
            violations.extend(rule.check(node, kind, &ctx));
        }
        path_is_element.push(is_element);

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if path_is_element.pop() == Some(true) {
                ctx.jsx_depth -= 1;
            }
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return violations
                    .into_iter()
                    .map(|v| v.in_file(&file.path))
                    .collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::syntax::{location, parse_snippet};

    struct DepthProbe;

    impl NodeRule for DepthProbe {
        fn id(&self) -> &'static str {
            "DEPTH_PROBE"
        }
        fn interested_in(&self, kind: NodeKind) -> bool {
            kind.is_jsx_element()
        }
        fn check(&self, node: Node<'_>, _kind: NodeKind, ctx: &RuleContext<'_>) -> Vec<Violation> {
            vec![Violation::warning(self.id(), ctx.jsx_depth.to_string()).at(location(node))]
        }
    }

    #[test]
    fn test_jsx_depth_counts_element_ancestors() {
        let file = parse_snippet(
            "Probe.tsx",
            "const a = <main><div><span /></div><p /></main>;\n",
        );
        let rules: Vec<Box<dyn NodeRule>> = vec![Box::new(DepthProbe)];
        let found = walk(&file, &rules, &GateConfig::default(), &RuleTables::default());
        let depths: Vec<&str> = found.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(depths, vec!["1", "2", "3", "2"]);
        assert!(found.iter().all(|v| v.file.as_deref() == Some("Probe.tsx")));
    }
}
