//! Manifest-driven resource discovery.
//!
//! Starting from the configured root entries, every node's sibling `.json`
//! manifest is read and its `pages`, `usingComponents` and `subpackages`
//! references are followed depth-first. The result is an [`EntrySet`] in
//! discovery order, which [`to_build_entries`] turns into bundler entries.
//!
//! ```text
//! app ──► app.json ──┬─► pages/index/index ──► index.json ──► components/card
//!                    ├─► pages/logs/logs
//!                    └─► packageA/pages/cat      (subpackages[].root + page)
//! ```
//!
//! Each pass starts from an empty set ([`ResourceGraph::reset`]); nothing
//! from an earlier pass leaks into the next.

mod entries;
mod exclude;
mod manifest;
mod node;
mod source;

pub use entries::{BuildEntries, EntryItem, to_build_entries};
pub use exclude::ExcludeRules;
pub use node::{EntrySet, NodePath, NodeRole};
pub use source::{Disk, FileSource};

use manifest::Manifest;

use crate::error::BuildError;
use crate::utils::path::absolute;
use std::path::{Path, PathBuf};

/// Inputs shared by discovery and entry probing.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Build context; root entries and `/`-rooted references resolve here.
    pub context: PathBuf,
    /// Script extensions in priority order (first existing file wins).
    pub script_extensions: Vec<String>,
    /// Asset extensions (every existing file is collected).
    pub asset_extensions: Vec<String>,
    pub exclude: ExcludeRules,
}

/// Owner of the entry set for one discovery pass at a time.
pub struct ResourceGraph<S = Disk> {
    options: ResolveOptions,
    source: S,
    entries: EntrySet,
}

impl ResourceGraph<Disk> {
    pub fn new(options: ResolveOptions) -> Self {
        Self::with_source(options, Disk)
    }
}

impl<S: FileSource> ResourceGraph<S> {
    pub fn with_source(mut options: ResolveOptions, source: S) -> Self {
        options.context = absolute(&options.context);
        Self {
            options,
            source,
            entries: EntrySet::new(),
        }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn entries(&self) -> &EntrySet {
        &self.entries
    }

    /// Drop everything discovered by the previous pass.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Start a fresh pass over all `roots`, in order.
    pub fn resolve_all<R: AsRef<str>>(&mut self, roots: &[R]) -> Result<&EntrySet, BuildError> {
        self.reset();
        for root in roots {
            self.resolve(root.as_ref())?;
        }
        Ok(&self.entries)
    }

    /// Add one root entry and everything reachable from it to the current
    /// pass.
    ///
    /// A relative root is resolved against the context; an absolute one is
    /// taken as is.
    pub fn resolve(&mut self, root_entry: &str) -> Result<&EntrySet, BuildError> {
        if self.options.exclude.check(root_entry).is_none() {
            let node = NodePath::from_path(&self.options.context.join(root_entry));
            self.visit_node(node, NodeRole::Entry)?;
        }
        Ok(&self.entries)
    }

    /// Resolve the current entry set into script and asset files.
    pub fn build_entries(&self) -> Result<BuildEntries, BuildError> {
        to_build_entries(&self.entries, &self.options, &self.source)
    }

    fn visit(&mut self, base: &Path, reference: &str, role: NodeRole) -> Result<(), BuildError> {
        if self.options.exclude.check(reference).is_some() {
            return Ok(());
        }

        let node = NodePath::resolve(&self.options.context, base, reference);
        self.visit_node(node, role)
    }

    fn visit_node(&mut self, node: NodePath, role: NodeRole) -> Result<(), BuildError> {
        if !self.entries.insert(node.clone(), role) {
            return Ok(());
        }

        let Some(manifest) = Manifest::read(&self.source, &node.sibling(".json"))? else {
            return Ok(());
        };

        let dir = node.dir().to_path_buf();
        for page in manifest.pages() {
            self.visit(&dir, page, NodeRole::Page)?;
        }
        for (_, component) in manifest.components() {
            self.visit(&dir, component, NodeRole::Component)?;
        }
        for package in manifest.subpackages() {
            // `/packageA` is still below the declaring node's directory
            let package_dir = dir.join(package.root.trim_start_matches(['/', '\\']));
            for page in &package.pages {
                let role = NodeRole::Subpackage {
                    root: package.root.clone(),
                };
                self.visit(&package_dir, page, role)?;
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
