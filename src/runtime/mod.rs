//! Runtime dependency injection for entry chunks.
//!
//! - **chunk**: the chunk graph model read from the bundler
//! - **inject**: dependency computation and bootstrap rendering

mod chunk;
mod inject;

pub use chunk::{Chunk, ChunkGraph, ChunkId};
pub use inject::{Injector, RenderedChunk};
