//! Relative path resolution against an explicit config root.
//!
//! Nothing here reads the process working directory or any global: the
//! root is always passed in by the caller.

use crate::value::ConfigValue;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// A filesystem path that appears in configuration.
///
/// Serialized as a plain string. Relative values are resolved against the
/// config root by [`ConfigPath::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigPath(pub PathBuf);

impl ConfigPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Replace the stored path with its resolution against `root`.
    pub fn resolve(&mut self, root: &Path) {
        self.0 = resolve_relative(root, &self.0);
    }
}

impl std::fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Resolve `path` against `root`.
///
/// `~` expands to the home directory, absolute paths are kept, anything
/// else is joined onto `root`. The result is normalized lexically.
pub fn resolve_relative(root: &Path, path: &Path) -> PathBuf {
    let expanded = expand_tilde(path);
    if expanded.is_absolute() {
        normalize(&expanded)
    } else {
        normalize(&root.join(expanded))
    }
}

/// Drop `.` segments and fold `..` into the preceding normal segment.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home_dir().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Get the user's home directory.
pub fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Resolve string leaves at the given dotted keys of an untyped tree.
///
/// When a key path passes through a sequence, every element is visited,
/// so `tools.bundles.path` reaches `path` in each bundle. Returns the number
/// of values rewritten. Missing keys and non-string leaves are skipped.
pub fn resolve_path_keys(tree: &mut ConfigValue, root: &Path, keys: &[&str]) -> usize {
    keys.iter()
        .map(|key| {
            let segments: Vec<&str> = key.split('.').collect();
            resolve_at(tree, root, &segments)
        })
        .sum()
}

fn resolve_at(node: &mut ConfigValue, root: &Path, segments: &[&str]) -> usize {
    match node {
        ConfigValue::Sequence(items) => items
            .iter_mut()
            .map(|item| resolve_at(item, root, segments))
            .sum(),
        ConfigValue::Mapping(map) => {
            let Some((head, rest)) = segments.split_first() else {
                return 0;
            };
            match map.get_mut(*head) {
                Some(child) if rest.is_empty() => resolve_leaf(child, root),
                Some(child) => resolve_at(child, root, rest),
                None => 0,
            }
        }
        _ => 0,
    }
}

fn resolve_leaf(leaf: &mut ConfigValue, root: &Path) -> usize {
    match leaf {
        ConfigValue::String(s) => {
            let resolved = resolve_relative(root, Path::new(s.as_str()));
            *s = resolved.to_string_lossy().into_owned();
            1
        }
        ConfigValue::Sequence(items) => items.iter_mut().map(|i| resolve_leaf(i, root)).sum(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::get_path;

    #[test]
    fn relative_joins_root() {
        assert_eq!(
            resolve_relative(Path::new("/repo"), Path::new("./custom_tools")),
            PathBuf::from("/repo/custom_tools")
        );
        assert_eq!(
            resolve_relative(Path::new("/repo/config"), Path::new("../tools/edit")),
            PathBuf::from("/repo/tools/edit")
        );
    }

    #[test]
    fn absolute_is_kept() {
        assert_eq!(
            resolve_relative(Path::new("/repo"), Path::new("/opt/tools/./bash")),
            PathBuf::from("/opt/tools/bash")
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let resolved = resolve_relative(Path::new("/repo"), Path::new("~/bundles"));
        assert_eq!(resolved, normalize(&home_dir().join("bundles")));
    }

    #[test]
    fn normalize_keeps_leading_parent_of_relative() {
        assert_eq!(normalize(Path::new("../a/./b/..")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn config_path_resolves_in_place() {
        let mut p = ConfigPath::new("trajectories");
        p.resolve(Path::new("/repo"));
        assert_eq!(p.as_path(), Path::new("/repo/trajectories"));
    }

    #[test]
    fn untyped_keys_descend_into_sequences() {
        let mut tree: ConfigValue = serde_yaml::from_str(
            "path: ./tools\nagent:\n  tools:\n    bundles:\n      - path: bundles/a\n      - path: /abs/b\n      - name: no-path\n",
        )
        .unwrap();

        let n = resolve_path_keys(
            &mut tree,
            Path::new("/repo"),
            &["path", "agent.tools.bundles.path", "missing.key"],
        );
        assert_eq!(n, 3);
        assert_eq!(get_path(&tree, "path").and_then(|v| v.as_str()), Some("/repo/tools"));

        let bundles = get_path(&tree, "agent.tools.bundles").unwrap().as_sequence().unwrap();
        assert_eq!(bundles[0]["path"].as_str(), Some("/repo/bundles/a"));
        assert_eq!(bundles[1]["path"].as_str(), Some("/abs/b"));
    }
}
