//! Build error types.
//!
//! Every variant here is fatal for the current pass: discovery and injection
//! never retry, and no partial output is produced.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by entry discovery and runtime injection.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(
        "runtime code is not extracted into a shared chunk.\n\
         Please reuse the runtime chunk to avoid duplicate loading of javascript files.\n\
         Simple solution: set `optimization.runtimeChunk` to `{{ name: 'runtime' }}` in the bundler config."
    )]
    RuntimeNotExtracted,

    #[error("malformed manifest `{path}`: {source}")]
    MalformedManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("unknown chunk `{0}`")]
    UnknownChunk(String),
}
