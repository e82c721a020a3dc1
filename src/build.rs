//! Command orchestration.
//!
//! ```text
//! minapack entries
//!     │
//!     └── MinaPlugin::register_entries() ──► EntryMap ──► <output>/entries.json
//!
//! minapack inject
//!     │
//!     ├── read <output>/<chunk_graph>
//!     ├── before_emit()   drop the asset chunk
//!     ├── render_chunk()  every chunk, all in memory
//!     └── write           only after every chunk rendered,
//!                         then record what was prepended in injected.json
//! ```

use crate::config::MinaConfig;
use crate::log;
use crate::plugin::{EntryRegistry, HostEvent, MinaPlugin};
use crate::resolver::{EntryItem, FileSource};
use crate::runtime::ChunkGraph;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

// ============================================================================
// Entries
// ============================================================================

/// Entry configuration handed to the bundler, in registration order.
///
/// ```json
/// {
///   "context": "/project/src",
///   "entry": {
///     "app": "./app.ts",
///     "pages/home/home": "./pages/home/home.ts",
///     "__assets_chunk__": ["./app.json", "./pages/home/home.wxml"]
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryMap {
    pub context: PathBuf,
    pub entry: IndexMap<String, EntryItem>,
}

impl EntryRegistry for EntryMap {
    fn add_entry(&mut self, context: &Path, name: &str, item: &EntryItem) -> Result<()> {
        context.clone_into(&mut self.context);
        self.entry.insert(name.to_owned(), item.clone());
        Ok(())
    }
}

/// What a write of `entries.json` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Written {
    Changed,
    Unchanged,
}

/// Run one registration pass and write the resulting entry map.
pub fn build_entries<S: FileSource>(
    plugin: &mut MinaPlugin<S>,
    config: &MinaConfig,
    event: HostEvent,
) -> Result<(EntryMap, Written)> {
    let mut map = EntryMap::default();
    plugin.on_event(event, &mut map)?;

    let written = write_entries(&config.entries_path(), &map)?;
    if written == Written::Changed {
        log!("entries"; "wrote {} entries to {}", map.entry.len(), config.entries_path().display());
    }
    Ok((map, written))
}

/// Write the entry map, leaving the file untouched when nothing changed.
fn write_entries(path: &Path, map: &EntryMap) -> Result<Written> {
    let mut content = serde_json::to_string_pretty(map)?;
    content.push('\n');

    if fs::read_to_string(path).is_ok_and(|old| old == content) {
        return Ok(Written::Unchanged);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(Written::Changed)
}

// ============================================================================
// Inject
// ============================================================================

/// What `inject` prepended to one emitted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Injected {
    bootstrap: String,
    /// Fingerprint of the whole file as written.
    hash: String,
}

/// Emitted script (relative to the output directory) → its injection.
type Ledger = IndexMap<String, Injected>;

/// Prepend bootstraps to the emitted entry chunks described by the chunk graph.
///
/// Returns the number of rewritten files. A file still holding the content
/// of an earlier run has that run's bootstrap replaced, so running twice is
/// harmless and a changed chunk graph updates the bootstrap in place. A file
/// the bundler emitted again is injected as new.
pub fn inject_runtime<S: FileSource>(plugin: &MinaPlugin<S>, config: &MinaConfig) -> Result<usize> {
    let graph_path = config.chunk_graph_path();
    let content = fs::read_to_string(&graph_path)
        .with_context(|| format!("failed to read chunk graph {}", graph_path.display()))?;
    let mut graph: ChunkGraph = serde_json::from_str(&content)
        .with_context(|| format!("invalid chunk graph {}", graph_path.display()))?;

    if plugin.before_emit(&mut graph).is_some() {
        log!("inject"; "dropped asset chunk `{}`", plugin.asset_entry());
    }

    let ledger_path = config.injected_path();
    let previous = read_ledger(&ledger_path)?;
    let mut ledger = Ledger::new();

    let output = &config.build.output;
    let mut pending = Vec::new();

    for chunk in graph.chunks.iter().filter(|c| c.has_entry_module()) {
        let file = chunk.script_file().into_owned();
        let path = output.join(&file);
        let current = fs::read_to_string(&path)
            .with_context(|| format!("failed to read chunk file {}", path.display()))?;

        let source = original_source(&current, previous.get(&file));
        let rendered = plugin.render_chunk(&graph, &chunk.id, source)?;
        if !rendered.is_modified() {
            continue;
        }

        let content = rendered.to_string();
        let injected = Injected {
            bootstrap: rendered.bootstrap().to_owned(),
            hash: content_hash(&content),
        };
        if content != current {
            pending.push((path, content));
        }
        ledger.insert(file, injected);
    }

    for (path, content) in &pending {
        fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    }
    if ledger != previous {
        let mut content = serde_json::to_string_pretty(&ledger)?;
        content.push('\n');
        fs::write(&ledger_path, content)
            .with_context(|| format!("failed to write {}", ledger_path.display()))?;
    }

    log!("inject"; "rewrote {} of {} chunks", pending.len(), graph.chunks.len());
    Ok(pending.len())
}

/// Source as the bundler emitted it: `current` minus the bootstrap of an
/// earlier run, when the file is exactly what that run wrote.
fn original_source<'a>(current: &'a str, injected: Option<&Injected>) -> &'a str {
    match injected {
        Some(injected) if content_hash(current) == injected.hash => current
            .strip_prefix(injected.bootstrap.as_str())
            .unwrap_or(current),
        _ => current,
    }
}

fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

fn read_ledger(path: &Path) -> Result<Ledger> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .with_context(|| format!("invalid injection record {}", path.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Ledger::new()),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Project with `src/` sources and a `dist/` output, config already rooted.
    fn project(toml: &str) -> (TempDir, MinaConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "src/app.json", r#"{ "pages": ["pages/home/home"] }"#);
        write(&root, "src/app.ts", "App({})");
        write(&root, "src/pages/home/home.json", "{}");
        write(&root, "src/pages/home/home.ts", "Page({})");

        let mut config = MinaConfig::from_str(toml).unwrap();
        config.build.context = root.join("src");
        config.build.output = root.join("dist");
        config.set_root(&root);
        (dir, config)
    }

    const CHUNKS: &str = r#"{
        "chunks": [
            { "id": 0, "name": "runtime", "initial": true, "hasRuntime": true, "files": ["runtime.js"] },
            { "id": 1, "name": "common", "initial": true, "files": ["common.js"] },
            { "id": 2, "name": "app", "initial": true, "entryModule": "./app.ts", "files": ["app.js"] },
            { "id": 3, "name": "pages/home/home", "initial": true, "entryModule": "./pages/home/home.ts", "files": ["pages/home/home.js"] },
            { "id": 4, "name": "__assets_chunk__", "initial": true, "entryModule": "multi", "files": ["__assets_chunk__.js"] }
        ],
        "groups": [
            { "name": "app", "chunks": [0, 1, 2] },
            { "name": "pages/home/home", "chunks": [0, 1, 3] },
            { "name": "__assets_chunk__", "chunks": [0, 4] }
        ]
    }"#;

    fn emitted(config: &MinaConfig, chunks: &str) {
        let out = &config.build.output;
        write(out, "chunks.json", chunks);
        write(out, "runtime.js", "/* runtime */");
        write(out, "common.js", "/* common */");
        write(out, "app.js", "App({})");
        write(out, "pages/home/home.js", "Page({})");
    }

    // ------------------------------------------------------------------------
    // Entries
    // ------------------------------------------------------------------------

    #[test]
    fn test_build_entries_writes_map() {
        let (_dir, config) = project("");
        let mut plugin = MinaPlugin::from_config(&config);

        let (map, written) = build_entries(&mut plugin, &config, HostEvent::EntryOption).unwrap();
        assert_eq!(written, Written::Changed);

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(config.entries_path()).unwrap()).unwrap();
        assert_eq!(json["entry"]["app"], "./app.ts");
        assert_eq!(json["entry"]["pages/home/home"], "./pages/home/home.ts");
        assert_eq!(
            json["entry"]["__assets_chunk__"],
            serde_json::json!(["./app.json", "./pages/home/home.json"])
        );

        let names: Vec<_> = map.entry.keys().map(String::as_str).collect();
        assert_eq!(names, ["app", "pages/home/home", "__assets_chunk__"]);
        assert_eq!(map.context, config.build.context);
    }

    #[test]
    fn test_build_entries_unchanged_on_second_pass() {
        let (_dir, config) = project("");
        let mut plugin = MinaPlugin::from_config(&config);

        build_entries(&mut plugin, &config, HostEvent::EntryOption).unwrap();
        let (_, written) = build_entries(&mut plugin, &config, HostEvent::WatchRun).unwrap();
        assert_eq!(written, Written::Unchanged);
    }

    #[test]
    fn test_build_entries_malformed_manifest_writes_nothing() {
        let (_dir, config) = project("");
        write(&config.build.context, "pages/home/home.json", "{ nope");
        let mut plugin = MinaPlugin::from_config(&config);

        assert!(build_entries(&mut plugin, &config, HostEvent::EntryOption).is_err());
        assert!(!config.entries_path().exists());
    }

    // ------------------------------------------------------------------------
    // Inject
    // ------------------------------------------------------------------------

    #[test]
    fn test_inject_rewrites_entry_chunks() {
        let (_dir, config) = project("");
        emitted(&config, CHUNKS);
        let plugin = MinaPlugin::from_config(&config);

        let count = inject_runtime(&plugin, &config).unwrap();
        assert_eq!(count, 2);

        let out = &config.build.output;
        assert_eq!(
            fs::read_to_string(out.join("app.js")).unwrap(),
            ";require('./common');App({})"
        );
        assert_eq!(
            fs::read_to_string(out.join("pages/home/home.js")).unwrap(),
            ";require('../../common');Page({})"
        );
        assert_eq!(fs::read_to_string(out.join("common.js")).unwrap(), "/* common */");
    }

    #[test]
    fn test_inject_is_idempotent() {
        let (_dir, config) = project("");
        emitted(&config, CHUNKS);
        let plugin = MinaPlugin::from_config(&config);

        inject_runtime(&plugin, &config).unwrap();
        assert_eq!(inject_runtime(&plugin, &config).unwrap(), 0);
        assert_eq!(
            fs::read_to_string(config.build.output.join("app.js")).unwrap(),
            ";require('./common');App({})"
        );
    }

    #[test]
    fn test_inject_replaces_earlier_bootstrap() {
        let (_dir, config) = project("");
        emitted(&config, CHUNKS);
        let plugin = MinaPlugin::from_config(&config);
        inject_runtime(&plugin, &config).unwrap();

        // `common` is no longer split out of `app`
        let chunks = CHUNKS.replace(r#""chunks": [0, 1, 2]"#, r#""chunks": [0, 2]"#);
        write(&config.build.output, "chunks.json", &chunks);

        assert_eq!(inject_runtime(&plugin, &config).unwrap(), 1);
        assert_eq!(
            fs::read_to_string(config.build.output.join("app.js")).unwrap(),
            ";App({})"
        );
        assert_eq!(inject_runtime(&plugin, &config).unwrap(), 0);
    }

    #[test]
    fn test_inject_source_starting_with_terminator() {
        let (_dir, config) = project("");
        let chunks = CHUNKS.replace(r#""chunks": [0, 1, 2]"#, r#""chunks": [0, 2]"#);
        emitted(&config, &chunks);
        write(&config.build.output, "app.js", ";App({})");
        let plugin = MinaPlugin::from_config(&config);

        inject_runtime(&plugin, &config).unwrap();
        assert_eq!(
            fs::read_to_string(config.build.output.join("app.js")).unwrap(),
            ";;App({})"
        );
    }

    #[test]
    fn test_inject_reemitted_file_is_injected_again() {
        let (_dir, config) = project("");
        emitted(&config, CHUNKS);
        let plugin = MinaPlugin::from_config(&config);
        inject_runtime(&plugin, &config).unwrap();

        // The bundler writes a fresh app.js that happens to start the same way
        write(&config.build.output, "app.js", ";require('./common');App({ v: 2 })");

        assert_eq!(inject_runtime(&plugin, &config).unwrap(), 1);
        assert_eq!(
            fs::read_to_string(config.build.output.join("app.js")).unwrap(),
            ";require('./common');;require('./common');App({ v: 2 })"
        );
    }

    #[test]
    fn test_inject_records_bootstraps() {
        let (_dir, config) = project("");
        emitted(&config, CHUNKS);
        let plugin = MinaPlugin::from_config(&config);
        inject_runtime(&plugin, &config).unwrap();

        let ledger = read_ledger(&config.injected_path()).unwrap();
        let files: Vec<_> = ledger.keys().map(String::as_str).collect();
        assert_eq!(files, ["app.js", "pages/home/home.js"]);
        assert_eq!(ledger["app.js"].bootstrap, ";require('./common');");
    }

    #[test]
    fn test_inject_include_runtime() {
        let (_dir, config) = project("[inject]\ninclude_runtime = true");
        emitted(&config, CHUNKS);
        let plugin = MinaPlugin::from_config(&config);

        inject_runtime(&plugin, &config).unwrap();
        assert_eq!(
            fs::read_to_string(config.build.output.join("app.js")).unwrap(),
            ";require('./runtime');require('./common');App({})"
        );
    }

    #[test]
    fn test_inject_without_runtime_chunk_writes_nothing() {
        let (_dir, config) = project("");
        let chunks = CHUNKS.replace(
            r#""name": "runtime", "initial": true, "hasRuntime": true"#,
            r#""name": "runtime", "initial": false, "hasRuntime": true"#,
        );
        emitted(&config, &chunks);
        let plugin = MinaPlugin::from_config(&config);

        let err = inject_runtime(&plugin, &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::RuntimeNotExtracted)
        ));
        assert_eq!(
            fs::read_to_string(config.build.output.join("app.js")).unwrap(),
            "App({})"
        );
        assert!(!config.injected_path().exists());
    }

    #[test]
    fn test_inject_missing_chunk_graph() {
        let (_dir, config) = project("");
        let plugin = MinaPlugin::from_config(&config);

        let err = inject_runtime(&plugin, &config).unwrap_err();
        assert!(err.to_string().contains("failed to read chunk graph"));
    }
}
