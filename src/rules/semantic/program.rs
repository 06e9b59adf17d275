//! The shared analysis context for one semantic batch: parsed files, the
//! project config each file answers to, module resolution and the import
//! graph over the batch.

use crate::config::{CompilerOptions, ProjectConfig};
use crate::rules::graph::DependencyGraph;
use crate::rules::resolve::ModuleResolver;
use crate::rules::syntax::SourceFile;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Program {
    root: PathBuf,
    files: Vec<Arc<SourceFile>>,
    configs: BTreeMap<PathBuf, ProjectConfig>,
    /// file -> path of its nearest project config
    nearest: BTreeMap<PathBuf, PathBuf>,
    resolver: ModuleResolver,
    graph: DependencyGraph,
}

impl Program {
    /// Builds the context once for the whole batch. Files are shared, not
    /// re-parsed.
    pub fn build(root: &Path, files: Vec<Arc<SourceFile>>) -> Self {
        let mut configs: BTreeMap<PathBuf, ProjectConfig> = BTreeMap::new();
        let mut nearest = BTreeMap::new();

        for file in &files {
            let dir = file.path.parent().unwrap_or(root);
            let Some(config_path) = ProjectConfig::find_nearest(dir, root) else {
                continue;
            };
            configs
                .entry(config_path.clone())
                .or_insert_with(|| load_or_default(&config_path));
            nearest.insert(file.path.clone(), config_path);
        }

        let resolver = project_resolver(root);
        let graph = DependencyGraph::build(files.iter().map(|f| f.as_ref()), &resolver);
        debug!(
            files = files.len(),
            configs = configs.len(),
            edges = graph.edge_count(),
            "semantic program built"
        );

        Self {
            root: root.to_path_buf(),
            files,
            configs,
            nearest,
            resolver,
            graph,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[Arc<SourceFile>] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Nearest project config governing `file`, if any.
    pub fn config_for(&self, file: &Path) -> Option<&ProjectConfig> {
        self.nearest.get(file).and_then(|p| self.configs.get(p))
    }

    pub fn configs(&self) -> impl Iterator<Item = &ProjectConfig> {
        self.configs.values()
    }

    /// True when some batch file has no project config above it.
    pub fn has_unconfigured_files(&self) -> bool {
        self.files.iter().any(|f| !self.nearest.contains_key(&f.path))
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}

/// Module resolver driven by the project config found at the root.
pub fn project_resolver(root: &Path) -> ModuleResolver {
    let config = ProjectConfig::find_nearest(root, root).map(|p| load_or_default(&p));
    ModuleResolver::new(root, config.as_ref().map(|c| &c.options))
}

/// A config that cannot be read is treated as declaring nothing, which makes
/// it fail the strict-mode requirement rather than abort the batch.
fn load_or_default(path: &Path) -> ProjectConfig {
    ProjectConfig::load(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "unreadable project config");
        ProjectConfig {
            path: path.to_path_buf(),
            options: CompilerOptions::default(),
        }
    })
}
