//! Chunk graph as seen after the bundler's optimization phase.
//!
//! Only the attributes injection reads are modelled. The graph is read from a
//! JSON description the bundler writes next to its output:
//!
//! ```json
//! {
//!   "chunks": [
//!     { "id": 0, "name": "runtime", "initial": true, "hasRuntime": true },
//!     { "id": 1, "name": "common", "initial": true },
//!     { "id": 2, "name": "pages/home/home", "initial": true,
//!       "entryModule": "./pages/home/home.ts", "files": ["pages/home/home.js"] }
//!   ],
//!   "groups": [ { "name": "pages/home/home", "chunks": [0, 1, 2] } ]
//! }
//! ```

use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

/// Chunk identifier: bundlers use either numbers or names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkId {
    Num(u64),
    Name(String),
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Name(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: ChunkId,
    #[serde(default)]
    pub name: Option<String>,
    /// Loaded at startup rather than on demand.
    #[serde(default)]
    pub initial: bool,
    /// Carries the module-loading bootstrap.
    #[serde(default)]
    pub has_runtime: bool,
    #[serde(default)]
    pub entry_module: Option<String>,
    /// Emitted files, relative to the output directory.
    #[serde(default)]
    pub files: Vec<String>,
}

impl Chunk {
    pub fn has_entry_module(&self) -> bool {
        self.entry_module.is_some()
    }

    /// The shared runtime chunk: initial, with runtime, without entry module.
    pub fn is_runtime(&self) -> bool {
        self.initial && self.has_runtime && !self.has_entry_module()
    }

    /// Output path without extension; the chunk name, or its id if unnamed.
    pub fn output_name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(self.id.to_string()),
        }
    }

    /// Emitted script, relative to the output directory, without `.js`.
    ///
    /// This is the path a `require` from another chunk has to name.
    pub fn output_path(&self) -> Cow<'_, str> {
        match self.script_file() {
            Cow::Borrowed(file) => Cow::Borrowed(file.strip_suffix(".js").unwrap_or(file)),
            Cow::Owned(_) => self.output_name(),
        }
    }

    /// Emitted script file, relative to the output directory.
    pub fn script_file(&self) -> Cow<'_, str> {
        self.files
            .iter()
            .find(|f| f.ends_with(".js"))
            .map_or_else(
                || Cow::Owned(format!("{}.js", self.output_name())),
                |f| Cow::Borrowed(f.as_str()),
            )
    }
}

/// Chunks that are loaded together (an entrypoint and its split chunks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkGroup {
    #[serde(default)]
    pub name: Option<String>,
    pub chunks: Vec<ChunkId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkGraph {
    pub chunks: Vec<Chunk>,
    #[serde(default)]
    pub groups: Vec<ChunkGroup>,
}

impl ChunkGraph {
    pub fn chunk(&self, id: &ChunkId) -> Option<&Chunk> {
        self.chunks.iter().find(|c| &c.id == id)
    }

    /// Whether runtime code was factored out into its own shared chunk.
    pub fn is_runtime_extracted(&self) -> bool {
        self.chunks.iter().any(Chunk::is_runtime)
    }

    /// Groups that contain the given chunk, in graph order.
    pub fn groups_of<'a>(&'a self, id: &'a ChunkId) -> impl Iterator<Item = &'a ChunkGroup> {
        self.groups.iter().filter(move |g| g.chunks.contains(id))
    }

    /// Chunks of a group, in group order.
    pub fn group_chunks<'a>(
        &'a self,
        group: &'a ChunkGroup,
    ) -> impl Iterator<Item = Result<&'a Chunk, BuildError>> {
        group.chunks.iter().map(|id| {
            self.chunk(id)
                .ok_or_else(|| BuildError::UnknownChunk(id.to_string()))
        })
    }

    /// Remove the chunk with the given name from the chunk list and from
    /// every group.
    pub fn remove_chunk(&mut self, name: &str) -> Option<Chunk> {
        let index = self
            .chunks
            .iter()
            .position(|c| c.name.as_deref() == Some(name))?;
        let chunk = self.chunks.remove(index);
        for group in &mut self.groups {
            group.chunks.retain(|id| id != &chunk.id);
        }
        Some(chunk)
    }
}
