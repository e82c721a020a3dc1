//! `[inject]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[inject]` section in mina.toml - runtime bootstrap injection.
///
/// # Example
/// ```toml
/// [inject]
/// chunk_graph = "chunks.json"   # Relative to the output directory
/// include_runtime = false
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct InjectConfig {
    /// Chunk graph written by the bundler.
    #[serde(default = "defaults::inject::chunk_graph")]
    #[educe(Default = defaults::inject::chunk_graph())]
    pub chunk_graph: PathBuf,

    /// Also require the shared runtime chunk from every entry.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub include_runtime: bool,
}
