//! Resource nodes and the ordered entry set.

use crate::utils::path::{absolute, strip_extension, to_posix, with_dot_extension};
use rustc_hash::FxHashSet;
use std::{
    fmt,
    path::{Path, PathBuf},
};

// ============================================================================
// NodePath
// ============================================================================

/// Canonical identity of a resource node.
///
/// Absolute, lexically normalized, extension stripped. Two references that
/// produce the same `NodePath` are the same node, whatever their spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(PathBuf);

impl NodePath {
    /// Canonicalize a manifest reference.
    ///
    /// - `/components/card` is relative to the context root
    /// - anything else is relative to `base` (the referencing node's directory)
    pub fn resolve(context: &Path, base: &Path, reference: &str) -> Self {
        let joined = match reference.strip_prefix('/') {
            Some(rooted) => context.join(rooted),
            None => base.join(reference),
        };
        Self::from_path(&joined)
    }

    /// Canonicalize a filesystem path.
    pub fn from_path(path: &Path) -> Self {
        Self(strip_extension(&absolute(path)))
    }

    #[cfg(test)]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Directory that the node's own references are relative to.
    pub fn dir(&self) -> &Path {
        self.0.parent().unwrap_or(&self.0)
    }

    /// Sibling file with the given extension (`.json`, `.ts`, ...).
    pub fn sibling(&self, ext: &str) -> PathBuf {
        with_dot_extension(&self.0, ext)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_posix(&self.0))
    }
}

// ============================================================================
// ResourceNode
// ============================================================================

/// How a node was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
    /// Root entry from configuration.
    Entry,
    /// Listed under `pages`.
    Page,
    /// Listed under `usingComponents`.
    Component,
    /// Page of a sub-package, with the sub-package root as declared.
    Subpackage { root: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    pub path: NodePath,
    pub role: NodeRole,
}

// ============================================================================
// EntrySet
// ============================================================================

/// Ordered, deduplicated nodes of one discovery pass.
///
/// The vector keeps discovery order; the set answers membership in O(1).
#[derive(Debug, Clone, Default)]
pub struct EntrySet {
    nodes: Vec<ResourceNode>,
    seen: FxHashSet<NodePath>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node unless its path is already present.
    ///
    /// Returns `false` for a repeat, which is the cycle guard.
    pub fn insert(&mut self, path: NodePath, role: NodeRole) -> bool {
        if !self.seen.insert(path.clone()) {
            return false;
        }
        self.nodes.push(ResourceNode { path, role });
        true
    }

    #[cfg(test)]
    pub fn contains(&self, path: &NodePath) -> bool {
        self.seen.contains(path)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.seen.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl PartialEq for EntrySet {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for EntrySet {}

impl<'a> IntoIterator for &'a EntrySet {
    type Item = &'a ResourceNode;
    type IntoIter = std::slice::Iter<'a, ResourceNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_node_path_strips_extension_and_dots() {
        let a = NodePath::resolve(Path::new("/src"), Path::new("/src/pages/index"), "../logs/logs.ts");
        let b = NodePath::from_path(Path::new("/src/pages/logs/logs"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "/src/pages/logs/logs");
    }

    #[cfg(unix)]
    #[test]
    fn test_node_path_rooted_reference() {
        let node = NodePath::resolve(
            Path::new("/src"),
            Path::new("/src/pages/index"),
            "/components/card/card",
        );
        assert_eq!(node.as_path(), Path::new("/src/components/card/card"));
    }

    #[cfg(unix)]
    #[test]
    fn test_node_path_sibling_and_dir() {
        let node = NodePath::from_path(Path::new("/src/pages/index/index"));
        assert_eq!(node.sibling(".json"), PathBuf::from("/src/pages/index/index.json"));
        assert_eq!(node.dir(), Path::new("/src/pages/index"));
    }

    #[test]
    fn test_entry_set_dedup_and_order() {
        let mut set = EntrySet::new();
        let app = NodePath::from_path(Path::new("/src/app"));
        let page = NodePath::from_path(Path::new("/src/pages/index/index"));

        assert!(set.insert(app.clone(), NodeRole::Entry));
        assert!(set.insert(page.clone(), NodeRole::Page));
        assert!(!set.insert(app.clone(), NodeRole::Component));

        assert_eq!(set.len(), 2);
        assert!(set.contains(&page));
        let order: Vec<_> = set.iter().map(|n| (n.path.clone(), n.role.clone())).collect();
        assert_eq!(order, [(app, NodeRole::Entry), (page, NodeRole::Page)]);
    }

    #[test]
    fn test_entry_set_clear() {
        let mut set = EntrySet::new();
        let app = NodePath::from_path(Path::new("/src/app"));
        set.insert(app.clone(), NodeRole::Entry);
        set.clear();

        assert!(set.is_empty());
        assert!(!set.contains(&app));
        assert!(set.insert(app, NodeRole::Entry));
    }
}
