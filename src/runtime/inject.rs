//! Eager-require bootstrap for entry chunks.
//!
//! The host has no on-demand loader, so every entry chunk must `require` the
//! sibling chunks holding its modules before its own code runs:
//!
//! ```text
//! pages/home/home.js  ──►  ;require('../../common');<original source>
//! ```
//!
//! The dependency order is the group's chunk order, first occurrence wins,
//! so identical chunk graphs always produce identical bootstraps.

use super::chunk::{Chunk, ChunkGraph, ChunkId};
use crate::error::BuildError;
use crate::utils::path::{posix_dirname, relative_posix, required_path};
use rustc_hash::FxHashSet;
use std::fmt;

/// Computes dependencies and renders bootstraps for entry chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Injector {
    /// Also `require` the shared runtime chunk (normally loaded by the host).
    include_runtime: bool,
}

impl Injector {
    pub const fn new(include_runtime: bool) -> Self {
        Self { include_runtime }
    }

    /// Relative paths (from the entry's directory) of every sibling chunk the
    /// entry depends on, in first-seen order.
    pub fn dependencies(&self, graph: &ChunkGraph, entry: &Chunk) -> Result<Vec<String>, BuildError> {
        let entry_path = entry.output_path();
        let from_dir = posix_dirname(&entry_path);

        let mut seen = FxHashSet::default();
        let mut out = Vec::new();

        for group in graph.groups_of(&entry.id) {
            for chunk in graph.group_chunks(group) {
                let chunk = chunk?;
                if chunk.id == entry.id || (chunk.is_runtime() && !self.include_runtime) {
                    continue;
                }
                let path = relative_posix(from_dir, &chunk.output_path());
                if seen.insert(path.clone()) {
                    out.push(path);
                }
            }
        }

        Ok(out)
    }

    /// Render hook: prepend the bootstrap to an entry chunk's source.
    ///
    /// Fails when runtime code has not been extracted into a shared chunk.
    /// Chunks without an entry module come back unchanged.
    pub fn render<'a>(
        &self,
        graph: &ChunkGraph,
        id: &ChunkId,
        source: &'a str,
    ) -> Result<RenderedChunk<'a>, BuildError> {
        if !graph.is_runtime_extracted() {
            return Err(BuildError::RuntimeNotExtracted);
        }

        let entry = graph
            .chunk(id)
            .ok_or_else(|| BuildError::UnknownChunk(id.to_string()))?;

        if !entry.has_entry_module() {
            return Ok(RenderedChunk::unchanged(source));
        }

        let dependencies = self.dependencies(graph, entry)?;
        Ok(RenderedChunk {
            bootstrap: script(&dependencies),
            source,
        })
    }
}

/// Bootstrap text for an ordered dependency list.
///
/// The leading `;` terminates whatever statement precedes the chunk.
pub fn script(dependencies: &[String]) -> String {
    let mut out = String::from(";");
    for dependency in dependencies {
        let path = required_path(dependency).replace('\\', "\\\\").replace('\'', "\\'");
        out.push_str(&format!("require('{path}');"));
    }
    out
}

/// Chunk source with the bootstrap in front.
///
/// The original source is an untouched suffix; the bootstrap contains no
/// newline, so existing source-map positions only shift right on the first
/// line, by the bootstrap's length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChunk<'a> {
    bootstrap: String,
    source: &'a str,
}

impl<'a> RenderedChunk<'a> {
    pub fn unchanged(source: &'a str) -> Self {
        Self {
            bootstrap: String::new(),
            source,
        }
    }

    pub fn bootstrap(&self) -> &str {
        &self.bootstrap
    }

    pub fn is_modified(&self) -> bool {
        !self.bootstrap.is_empty()
    }
}

impl fmt::Display for RenderedChunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bootstrap)?;
        f.write_str(self.source)
    }
}

// ============================================================================
// Tests
// ============================================================================
