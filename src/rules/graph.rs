//! File-level dependency graph shared by the semantic and import-graph
//! analyzers.

use crate::rules::imports::top_level_imports;
use crate::rules::resolve::ModuleResolver;
use crate::rules::syntax::SourceFile;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// One node per file, one edge per top-level import that resolves to a
    /// file on disk.
    pub fn build<'a>(files: impl IntoIterator<Item = &'a SourceFile>, resolver: &ModuleResolver) -> Self {
        let mut graph = Self::new();
        for file in files {
            graph.add_file(&file.path);
            for import in top_level_imports(file) {
                if let Some(target) = resolver.resolve(&import.source, &file.path) {
                    graph.add_edge(&file.path, target);
                }
            }
        }
        graph
    }

    pub fn add_file(&mut self, path: &Path) {
        self.edges.entry(path.to_path_buf()).or_default();
    }

    pub fn add_edge(&mut self, from: &Path, to: PathBuf) {
        self.edges.entry(from.to_path_buf()).or_default().insert(to);
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.edges.keys()
    }

    pub fn file_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|e| e.len()).sum()
    }

    pub fn imports_of(&self, path: &Path) -> impl Iterator<Item = &PathBuf> {
        self.edges.get(path).into_iter().flat_map(|e| e.iter())
    }

    /// Number of distinct files importing each target.
    pub fn fan_in(&self) -> BTreeMap<&PathBuf, usize> {
        let mut counts: BTreeMap<&PathBuf, usize> = BTreeMap::new();
        for targets in self.edges.values() {
            for target in targets {
                *counts.entry(target).or_default() += 1;
            }
        }
        counts
    }

    /// Every distinct cycle reachable by depth-first search, each as
    /// `[a, b, ..., a]`. Cycles that are rotations of one another are
    /// reported once.
    pub fn cycles(&self) -> Vec<Vec<PathBuf>> {
        let mut visited: BTreeSet<&PathBuf> = BTreeSet::new();
        let mut seen: BTreeSet<Vec<&PathBuf>> = BTreeSet::new();
        let mut cycles = Vec::new();

        for start in self.edges.keys() {
            if visited.contains(start) {
                continue;
            }
            // (node, neighbours, next neighbour index)
            let mut stack: Vec<(&PathBuf, Vec<&PathBuf>, usize)> = Vec::new();
            let mut on_stack: BTreeSet<&PathBuf> = BTreeSet::new();
            visited.insert(start);
            on_stack.insert(start);
            stack.push((start, self.imports_of(start).collect(), 0));

            while let Some((node, neighbours, next)) = stack.last_mut() {
                let Some(&neighbour) = neighbours.get(*next) else {
                    on_stack.remove(*node);
                    stack.pop();
                    continue;
                };
                *next += 1;

                if !visited.contains(neighbour) {
                    visited.insert(neighbour);
                    on_stack.insert(neighbour);
                    stack.push((neighbour, self.imports_of(neighbour).collect(), 0));
                } else if on_stack.contains(neighbour) {
                    let path: Vec<&PathBuf> = stack.iter().map(|(n, _, _)| *n).collect();
                    let Some(pos) = path.iter().position(|n| *n == neighbour) else { continue };
                    let ring = &path[pos..];
                    if seen.insert(canonical_rotation(ring)) {
                        let mut cycle: Vec<PathBuf> = ring.iter().map(|p| (*p).clone()).collect();
                        cycle.push(neighbour.clone());
                        cycles.push(cycle);
                    }
                }
            }
        }
        cycles
    }

    /// Shortest import path leading from `file` back to itself, as
    /// `[file, ..., file]`.
    pub fn cycle_through(&self, file: &Path) -> Option<Vec<PathBuf>> {
        let mut parent: BTreeMap<&PathBuf, &PathBuf> = BTreeMap::new();
        let mut queue: VecDeque<&PathBuf> = VecDeque::new();
        let (start, _) = self.edges.get_key_value(file)?;

        for next in self.imports_of(start) {
            if next == start {
                return Some(vec![start.clone(), start.clone()]);
            }
            if !parent.contains_key(next) {
                parent.insert(next, start);
                queue.push_back(next);
            }
        }
        while let Some(current) = queue.pop_front() {
            for next in self.imports_of(current) {
                if next == start {
                    let mut path = vec![start.clone()];
                    let mut cursor = current;
                    let mut back = vec![cursor.clone()];
                    while let Some(&p) = parent.get(cursor) {
                        if p == start {
                            break;
                        }
                        back.push(p.clone());
                        cursor = p;
                    }
                    back.reverse();
                    path.extend(back);
                    path.push(start.clone());
                    return Some(path);
                }
                if !parent.contains_key(next) {
                    parent.insert(next, current);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Longest import chain length over all files. A file seen again on the
    /// current chain ends it with depth 0; a file without imports has depth 1.
    pub fn longest_chain(&self) -> usize {
        let cyclic: BTreeSet<&PathBuf> = self
            .edges
            .keys()
            .filter(|f| self.cycle_through(f).is_some())
            .collect();
        let mut memo: BTreeMap<&PathBuf, usize> = BTreeMap::new();
        let mut on_path: BTreeSet<&PathBuf> = BTreeSet::new();
        self.edges
            .keys()
            .map(|f| self.chain_depth(f, &cyclic, &mut memo, &mut on_path))
            .max()
            .unwrap_or(0)
    }

    fn chain_depth<'g>(
        &'g self,
        node: &'g PathBuf,
        cyclic: &BTreeSet<&'g PathBuf>,
        memo: &mut BTreeMap<&'g PathBuf, usize>,
        on_path: &mut BTreeSet<&'g PathBuf>,
    ) -> usize {
        if on_path.contains(node) {
            return 0;
        }
        if let Some(depth) = memo.get(node) {
            return *depth;
        }
        let neighbours: Vec<&PathBuf> = self.imports_of(node).collect();
        if neighbours.is_empty() {
            return 1;
        }

        on_path.insert(node);
        let deepest = neighbours
            .into_iter()
            .map(|n| self.chain_depth(n, cyclic, memo, on_path))
            .max()
            .unwrap_or(0);
        on_path.remove(node);

        let depth = deepest + 1;
        // Depth of a file outside every cycle does not depend on the chain
        // that reached it.
        if !cyclic.contains(node) {
            memo.insert(node, depth);
        }
        depth
    }
}

fn canonical_rotation<'a>(ring: &[&'a PathBuf]) -> Vec<&'a PathBuf> {
    let Some(min_pos) = ring
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };
    ring[min_pos..].iter().chain(ring[..min_pos].iter()).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)], files: &[&str]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for f in files {
            g.add_file(Path::new(f));
        }
        for (from, to) in edges {
            g.add_edge(Path::new(from), PathBuf::from(to));
        }
        g
    }

    fn names(cycle: &[PathBuf]) -> Vec<String> {
        cycle.iter().map(|p| p.display().to_string()).collect()
    }

    #[test]
    fn test_two_file_cycle_reported_once() {
        let g = graph(&[("/p/a.ts", "/p/b.ts"), ("/p/b.ts", "/p/a.ts")], &[]);
        let cycles = g.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(names(&cycles[0]), vec!["/p/a.ts", "/p/b.ts", "/p/a.ts"]);
    }

    #[test]
    fn test_cycle_through_finds_shortest_loop() {
        let g = graph(
            &[
                ("/p/a.ts", "/p/b.ts"),
                ("/p/b.ts", "/p/c.ts"),
                ("/p/c.ts", "/p/a.ts"),
                ("/p/b.ts", "/p/d.ts"),
            ],
            &["/p/d.ts"],
        );
        let path = g.cycle_through(Path::new("/p/b.ts")).unwrap();
        assert_eq!(names(&path), vec!["/p/b.ts", "/p/c.ts", "/p/a.ts", "/p/b.ts"]);
        assert!(g.cycle_through(Path::new("/p/d.ts")).is_none());
    }

    #[test]
    fn test_longest_chain_linear_and_cyclic() {
        let linear = graph(
            &[
                ("/p/a.ts", "/p/b.ts"),
                ("/p/b.ts", "/p/c.ts"),
                ("/p/c.ts", "/p/d.ts"),
                ("/p/d.ts", "/p/e.ts"),
            ],
            &["/p/e.ts"],
        );
        assert_eq!(linear.longest_chain(), 5);

        // a -> b -> a: b's only import is on the chain, so the chain is a(1 + b(1 + 0)).
        let cyclic = graph(&[("/p/a.ts", "/p/b.ts"), ("/p/b.ts", "/p/a.ts")], &[]);
        assert_eq!(cyclic.longest_chain(), 2);
    }

    #[test]
    fn test_fan_in_counts_importers() {
        let g = graph(&[("/p/a.ts", "/p/x.ts"), ("/p/b.ts", "/p/x.ts")], &["/p/x.ts"]);
        let fan_in = g.fan_in();
        assert_eq!(fan_in[&PathBuf::from("/p/x.ts")], 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.file_count(), 3);
    }
}
