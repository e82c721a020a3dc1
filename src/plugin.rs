//! Host bundler adapter.
//!
//! The bundler drives two independent phases:
//!
//! ```text
//! EntryOption / WatchRun ──► register_entries() ──► EntryRegistry::add_entry
//!                                    (fresh discovery pass each time)
//!
//! render(chunk)          ──► render_chunk()     ──► bootstrap + source
//! before emit            ──► before_emit()      ──► drop the asset chunk
//! ```
//!
//! Discovery never sees chunks and injection never reads manifests; the only
//! shared state is the configured asset entry name.

use crate::config::MinaConfig;
use crate::error::BuildError;
use crate::log;
use crate::resolver::{Disk, EntryItem, FileSource, NodeRole, ResourceGraph};
use crate::runtime::{Chunk, ChunkGraph, ChunkId, Injector, RenderedChunk};
use anyhow::{Context, Result};
use std::path::Path;

/// The bundler's entry registration primitive.
pub trait EntryRegistry {
    /// Register `item` under `name`; requests are relative to `context`.
    fn add_entry(&mut self, context: &Path, name: &str, item: &EntryItem) -> Result<()>;
}

/// Lifecycle points at which entries are (re)registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Initial entry configuration.
    EntryOption,
    /// A watch-triggered rebuild is starting.
    WatchRun,
}

pub struct MinaPlugin<S = Disk> {
    graph: ResourceGraph<S>,
    roots: Vec<String>,
    asset_entry: String,
    injector: Injector,
}

impl MinaPlugin<Disk> {
    pub fn from_config(config: &MinaConfig) -> Self {
        Self::new(
            ResourceGraph::new(config.build.resolve_options()),
            config.build.entry.roots().to_vec(),
            config.build.asset_entry.clone(),
            Injector::new(config.inject.include_runtime),
        )
    }
}

impl<S: FileSource> MinaPlugin<S> {
    pub fn new(
        graph: ResourceGraph<S>,
        roots: Vec<String>,
        asset_entry: String,
        injector: Injector,
    ) -> Self {
        Self {
            graph,
            roots,
            asset_entry,
            injector,
        }
    }

    pub fn graph(&self) -> &ResourceGraph<S> {
        &self.graph
    }

    pub fn asset_entry(&self) -> &str {
        &self.asset_entry
    }

    /// Both lifecycle events run the same registration pass.
    pub fn on_event(&mut self, event: HostEvent, registry: &mut impl EntryRegistry) -> Result<usize> {
        let count = self.register_entries(registry)?;
        if event == HostEvent::WatchRun {
            log!("watch"; "re-registered {count} entries");
        }
        Ok(count)
    }

    /// Rediscover from the roots and register every resulting entry.
    ///
    /// Returns the number of registrations. Discovery completes before the
    /// first registration, so a failing pass registers nothing.
    pub fn register_entries(&mut self, registry: &mut impl EntryRegistry) -> Result<usize> {
        let nodes = self
            .graph
            .resolve_all(&self.roots)
            .context("resource discovery failed")?;
        if nodes.is_empty() {
            log!("entries"; "every root entry is excluded, nothing to register");
        } else {
            let components = nodes.iter().filter(|n| n.role == NodeRole::Component).count();
            log!("entries"; "discovered {} nodes, {components} components", nodes.len());
        }
        let entries = self.graph.build_entries()?;

        let context = &self.graph.options().context;
        let registrations = entries.registrations(context, &self.asset_entry);
        for registration in &registrations {
            registry
                .add_entry(context, &registration.name, &registration.item)
                .with_context(|| format!("failed to register entry `{}`", registration.name))?;
            match &registration.item {
                EntryItem::Single(request) => {
                    log!("entries"; "{} -> {request}", registration.name)
                }
                EntryItem::Multi(requests) => {
                    log!("entries"; "{} -> {} files", registration.name, requests.len())
                }
            }
        }

        Ok(registrations.len())
    }

    /// Render hook for one emitted chunk.
    pub fn render_chunk<'a>(
        &self,
        graph: &ChunkGraph,
        id: &ChunkId,
        source: &'a str,
    ) -> Result<RenderedChunk<'a>, BuildError> {
        let rendered = self.injector.render(graph, id, source)?;
        if rendered.is_modified()
            && let Some(chunk) = graph.chunk(id)
        {
            log!("inject"; "{} <- {}", chunk.output_name(), rendered.bootstrap());
        }
        Ok(rendered)
    }

    /// Drop the synthetic asset chunk so it is never emitted.
    pub fn before_emit(&self, graph: &mut ChunkGraph) -> Option<Chunk> {
        graph.remove_chunk(&self.asset_entry)
    }
}

// ============================================================================
// Tests
// ============================================================================
