use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Current gate version (read from Cargo.toml at compile time)
pub const GATE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CONFIG_FILE: &str = ".brudirc.toml";

/// Project configuration files looked up for compiler options, in order.
pub const PROJECT_CONFIG_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];

const MAX_EXTENDS_DEPTH: usize = 8;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub max_section_children: usize,
    pub max_component_depth: usize,
    pub max_function_nesting: usize,
    pub max_prop_drilling: usize,
    pub max_container_variants: usize,
    pub max_spacing_variants: usize,
    pub max_grid_cols: u32,
    pub max_font_sizes: usize,
    /// Highest text-size rank allowed on body-text elements (5 = `xl`).
    pub body_text_max_rank: usize,
    pub max_import_depth: usize,
    pub max_import_fan_in: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_section_children: 8,
            max_component_depth: 6,
            max_function_nesting: 3,
            max_prop_drilling: 3,
            max_container_variants: 4,
            max_spacing_variants: 6,
            max_grid_cols: 4,
            max_font_sizes: 6,
            body_text_max_rank: 5,
            max_import_depth: 4,
            max_import_fan_in: 5,
        }
    }
}

/// Gate settings from `.brudirc.toml`. Every field is optional in the file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    pub thresholds: Thresholds,
    pub ignore_dirs: Vec<String>,
    pub animation_objects: Vec<String>,
    pub class_helpers: Vec<String>,
    pub primitives_dir: String,
    pub tokens_file_names: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            ignore_dirs: vec![
                "node_modules".to_string(),
                ".next".to_string(),
                ".brudi".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "out".to_string(),
                "coverage".to_string(),
                "target".to_string(),
            ],
            animation_objects: vec!["gsap".to_string()],
            class_helpers: vec!["cn".to_string(), "clsx".to_string(), "twMerge".to_string()],
            primitives_dir: "src/primitives".to_string(),
            tokens_file_names: vec!["tokens.ts".to_string(), "tokens.js".to_string()],
        }
    }
}

impl GateConfig {
    /// Loads `.brudirc.toml` from the project root. A missing file yields the
    /// defaults; a malformed one is an error.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        if !config_path.is_file() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: GateConfig = toml::from_str(&content)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        debug!(path = %config_path.display(), "loaded gate config");
        Ok(config)
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore_dirs.iter().any(|d| d == name)
    }

    pub fn is_animation_object(&self, name: &str) -> bool {
        self.animation_objects.iter().any(|o| o == name)
    }

    pub fn is_class_helper(&self, name: &str) -> bool {
        self.class_helpers.iter().any(|h| h == name)
    }
}

/// Effective compiler options after following `extends`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    pub strict: Option<bool>,
    pub no_implicit_any: Option<bool>,
    /// Absolute directory `baseUrl` points at.
    pub base_url: Option<PathBuf>,
    pub paths: BTreeMap<String, Vec<String>>,
    /// Directory `paths` targets are relative to: `baseUrl` when set,
    /// otherwise the directory of the config that declared `paths`.
    pub paths_base: Option<PathBuf>,
}

impl CompilerOptions {
    pub fn strict_enabled(&self) -> bool {
        self.strict == Some(true)
    }

    /// `noImplicitAny` defaults to the value of `strict`.
    pub fn no_implicit_any_enabled(&self) -> bool {
        self.no_implicit_any.unwrap_or_else(|| self.strict_enabled())
    }

    fn merge_over(self, base: CompilerOptions) -> CompilerOptions {
        let paths_declared = !self.paths.is_empty();
        CompilerOptions {
            strict: self.strict.or(base.strict),
            no_implicit_any: self.no_implicit_any.or(base.no_implicit_any),
            base_url: self.base_url.clone().or(base.base_url),
            paths: if paths_declared { self.paths } else { base.paths },
            paths_base: match (self.base_url, paths_declared) {
                (Some(url), _) => Some(url),
                (None, true) => self.paths_base,
                (None, false) => base.paths_base,
            },
        }
    }
}

/// A `tsconfig.json`/`jsconfig.json` with its resolved options.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub path: PathBuf,
    pub options: CompilerOptions,
}

#[derive(Deserialize, Default)]
struct RawProjectConfig {
    #[serde(default)]
    extends: Option<serde_json::Value>,
    #[serde(default, rename = "compilerOptions")]
    compiler_options: Option<RawCompilerOptions>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    strict: Option<bool>,
    no_implicit_any: Option<bool>,
    base_url: Option<String>,
    paths: Option<BTreeMap<String, Vec<String>>>,
}

impl ProjectConfig {
    /// Nearest project config walking up from `start` without leaving `root`.
    pub fn find_nearest(start: &Path, root: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            for name in PROJECT_CONFIG_FILES {
                let candidate = current.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
            if current == root {
                break;
            }
            dir = current.parent().filter(|p| p.starts_with(root));
        }
        None
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let options = load_options(path, 0)?;
        Ok(Self {
            path: path.to_path_buf(),
            options,
        })
    }
}

fn load_options(path: &Path, depth: usize) -> anyhow::Result<CompilerOptions> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let raw: RawProjectConfig = serde_json::from_str(&strip_jsonc(&content))
        .with_context(|| format!("parsing {}", path.display()))?;
    let dir = path.parent().unwrap_or(Path::new("."));

    let mut base = CompilerOptions::default();
    if depth < MAX_EXTENDS_DEPTH {
        for parent in extends_targets(raw.extends.as_ref(), dir) {
            match load_options(&parent, depth + 1) {
                Ok(parent_opts) => base = parent_opts.merge_over(base),
                Err(e) => debug!(path = %parent.display(), error = %e, "skipping extended config"),
            }
        }
    }

    let own = raw.compiler_options.unwrap_or_default();
    let declared_paths = own.paths.unwrap_or_default();
    let local = CompilerOptions {
        strict: own.strict,
        no_implicit_any: own.no_implicit_any,
        base_url: own.base_url.map(|b| dir.join(b)),
        paths_base: if declared_paths.is_empty() { None } else { Some(dir.to_path_buf()) },
        paths: declared_paths,
    };
    Ok(local.merge_over(base))
}

/// Relative `extends` entries resolved against the declaring directory.
/// Package specifiers are not followed.
fn extends_targets(extends: Option<&serde_json::Value>, dir: &Path) -> Vec<PathBuf> {
    let specs: Vec<&str> = match extends {
        Some(serde_json::Value::String(s)) => vec![s.as_str()],
        Some(serde_json::Value::Array(items)) => items.iter().filter_map(|v| v.as_str()).collect(),
        _ => Vec::new(),
    };
    specs
        .into_iter()
        .filter(|s| s.starts_with('.') || Path::new(s).is_absolute())
        .map(|s| {
            let candidate = dir.join(s);
            if candidate.is_file() || s.ends_with(".json") {
                candidate
            } else {
                dir.join(format!("{}.json", s))
            }
        })
        .collect()
}

/// Removes `//` and `/* */` comments and trailing commas so JSONC can be
/// handed to serde_json. String contents are left untouched.
pub fn strip_jsonc(input: &str) -> String {
    let mut without_comments = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            without_comments.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    without_comments.push(escaped);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                without_comments.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        without_comments.push('\n');
                        break;
                    }
                }
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
            }
            _ => without_comments.push(c),
        }
    }

    let chars: Vec<char> = without_comments.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut in_string = false;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gate_config_defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = GateConfig::load(dir.path()).unwrap();
        assert_eq!(config, GateConfig::default());
        assert_eq!(config.thresholds.max_section_children, 8);
    }

    #[test]
    fn test_gate_config_partial_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "primitives_dir = \"app/ui\"\n[thresholds]\nmax_component_depth = 10\n",
        )
        .unwrap();
        let config = GateConfig::load(dir.path()).unwrap();
        assert_eq!(config.primitives_dir, "app/ui");
        assert_eq!(config.thresholds.max_component_depth, 10);
        assert_eq!(config.thresholds.max_import_depth, 4);
        assert!(config.is_class_helper("clsx"));
    }

    #[test]
    fn test_gate_config_malformed_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "thresholds = 3\n").unwrap();
        assert!(GateConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_strip_jsonc_keeps_strings() {
        let input = r#"{
            // line comment
            "a": "http://x/*y*/", /* block */
            "b": [1, 2,],
        }"#;
        let value: serde_json::Value = serde_json::from_str(&strip_jsonc(input)).unwrap();
        assert_eq!(value["a"], "http://x/*y*/");
        assert_eq!(value["b"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_extends_chain_is_followed() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("tsconfig.base.json"),
            r#"{ "compilerOptions": { "strict": true, "baseUrl": ".", "paths": { "@/*": ["src/*"] } } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{ "extends": "./tsconfig.base", "compilerOptions": { "noImplicitAny": false } }"#,
        )
        .unwrap();
        let config = ProjectConfig::load(&dir.path().join("tsconfig.json")).unwrap();
        assert!(config.options.strict_enabled());
        assert!(!config.options.no_implicit_any_enabled());
        assert_eq!(config.options.paths["@/*"], vec!["src/*".to_string()]);
        assert_eq!(config.options.paths_base.as_deref(), Some(dir.path().join(".").as_path()));
    }

    #[test]
    fn test_find_nearest_stops_at_root() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src/components");
        fs::create_dir_all(&nested).unwrap();
        assert!(ProjectConfig::find_nearest(&nested, dir.path()).is_none());
        fs::write(dir.path().join("jsconfig.json"), "{}").unwrap();
        assert_eq!(
            ProjectConfig::find_nearest(&nested, dir.path()),
            Some(dir.path().join("jsconfig.json"))
        );
    }
}
