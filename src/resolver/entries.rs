//! Turning discovered nodes into bundler entries.
//!
//! | Kind   | Probe policy | Registered as                                 |
//! |--------|--------------|-----------------------------------------------|
//! | Script | first match  | one entry per node, named by its relative path |
//! | Asset  | all matches  | one synthetic multi-entry for every asset      |
//!
//! A node without any script (a manifest-only node) is dropped from the
//! script list; that is not an error.

use super::node::{EntrySet, NodePath};
use super::source::FileSource;
use super::ResolveOptions;
use crate::error::BuildError;
use crate::utils::path::{relative_posix, required_path, to_posix};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Script chosen for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptItem {
    pub node: NodePath,
    pub file: PathBuf,
}

/// Result of probing every node of an entry set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEntries {
    pub scripts: Vec<ScriptItem>,
    pub assets: Vec<PathBuf>,
}

/// Sources of one registered entry, in the bundler's single/multi form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntryItem {
    Single(String),
    Multi(Vec<String>),
}

/// One call to the bundler's entry registration primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub item: EntryItem,
}

/// Probe script and asset siblings for every node, in entry-set order.
pub fn to_build_entries(
    entries: &EntrySet,
    options: &ResolveOptions,
    source: &impl FileSource,
) -> Result<BuildEntries, BuildError> {
    let mut out = BuildEntries::default();

    for node in entries {
        if let Some(file) = first_existing(&node.path, &options.script_extensions, source)? {
            out.scripts.push(ScriptItem {
                node: node.path.clone(),
                file,
            });
        }
        for ext in &options.asset_extensions {
            let file = node.path.sibling(ext);
            if probe(&file, source)? {
                out.assets.push(file);
            }
        }
    }

    Ok(out)
}

fn first_existing(
    node: &NodePath,
    extensions: &[String],
    source: &impl FileSource,
) -> Result<Option<PathBuf>, BuildError> {
    for ext in extensions {
        let file = node.sibling(ext);
        if probe(&file, source)? {
            return Ok(Some(file));
        }
    }
    Ok(None)
}

fn probe(file: &Path, source: &impl FileSource) -> Result<bool, BuildError> {
    source
        .is_file(file)
        .map_err(|e| BuildError::Io(file.to_path_buf(), e))
}

impl BuildEntries {
    /// Registration calls for the bundler, in order.
    ///
    /// Script entries are named by their context-relative path without
    /// extension (`pages/index/index`) and point at `./<file>`. All assets go
    /// into one multi-entry named `asset_entry`, omitted when there are none.
    pub fn registrations(&self, context: &Path, asset_entry: &str) -> Vec<Registration> {
        let context = to_posix(context);

        let mut out: Vec<Registration> = self
            .scripts
            .iter()
            .map(|script| Registration {
                name: relative_posix(&context, &script.node.to_string()),
                item: EntryItem::Single(request(&context, &script.file)),
            })
            .collect();

        if !self.assets.is_empty() {
            let files = self.assets.iter().map(|f| request(&context, f)).collect();
            out.push(Registration {
                name: asset_entry.to_owned(),
                item: EntryItem::Multi(files),
            });
        }

        out
    }
}

/// Context-relative request for a file: `./pages/index/index.ts`.
fn request(context: &str, file: &Path) -> String {
    required_path(&relative_posix(context, &to_posix(file)))
}
