//! File system watcher for entry rediscovery.
//!
//! Watches the build context and the config file. Every debounced batch of
//! relevant changes runs a fresh registration pass through the same plugin
//! (the `WatchRun` event) and rewrites `entries.json` when it changed.
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────────────────────────┐
//! │ notify   │───▶│ Debouncer │───▶│ handle_changes()             │
//! │ events   │    │ (300ms)   │    │   config?  reload + rewatch  │
//! └──────────┘    └───────────┘    │   build_entries(WatchRun)    │
//!                                  └──────────────────────────────┘
//! ```

use crate::{
    build::{Written, build_entries},
    config::MinaConfig,
    log,
    logger::{WatchStatus, format_error},
    plugin::{HostEvent, MinaPlugin},
    utils::category::{FileCategory, categorize_path},
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

const REBUILD_COOLDOWN_MS: u64 = 800;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Path relative to the project root for display.
///
/// `/proj/src/pages/home/home.json` → `src/pages/home/home.json`
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
    delay: Duration,
}

impl Debouncer {
    fn new(delay_ms: u64) -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
            delay: Duration::from_millis(delay_ms),
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.delay)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            self.delay
        }
    }
}

// =============================================================================
// Watch Session
// =============================================================================

/// Config and plugin owned by one watch session; replaced on config reload.
struct Session<R> {
    config: MinaConfig,
    plugin: MinaPlugin,
    reload: R,
    status: WatchStatus,
}

/// Outcome of one batch, for cooldown tracking and rewatching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ignored,
    Rebuilt { reloaded: bool },
    Failed,
}

impl<R: Fn() -> Result<MinaConfig>> Session<R> {
    fn new(config: MinaConfig, reload: R) -> Self {
        Self {
            plugin: MinaPlugin::from_config(&config),
            config,
            reload,
            status: WatchStatus::new(),
        }
    }

    fn handle_changes(&mut self, paths: &[PathBuf]) -> Outcome {
        let mut config_changed = false;
        let mut triggers = Vec::new();

        for path in paths {
            match categorize_path(path, &self.config) {
                FileCategory::Config => config_changed = true,
                category if category.triggers_discovery() => triggers.push(path),
                _ => {}
            }
        }

        if !config_changed && triggers.is_empty() {
            return Outcome::Ignored;
        }

        let root = self.config.get_root().to_path_buf();
        let trigger = if config_changed {
            rel_path(&self.config.config_path, &root)
        } else {
            triggers.iter().map(|p| rel_path(p, &root)).collect::<Vec<_>>().join(", ")
        };

        if config_changed {
            match (self.reload)() {
                Ok(config) => {
                    self.plugin = MinaPlugin::from_config(&config);
                    self.config = config;
                }
                Err(e) => {
                    self.status.error(&format!("config reload failed ({trigger})"), &format_error(&e));
                    return Outcome::Failed;
                }
            }
        }

        match build_entries(&mut self.plugin, &self.config, HostEvent::WatchRun) {
            Ok((map, Written::Changed)) => {
                self.status.success(&format!("{} entries ({trigger})", map.entry.len()));
            }
            Ok((_, Written::Unchanged)) => self.status.unchanged(&trigger),
            Err(e) => {
                self.status.error(&format!("discovery failed ({trigger})"), &format_error(&e));
                return Outcome::Failed;
            }
        }

        Outcome::Rebuilt {
            reloaded: config_changed,
        }
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// Paths to watch with their recursion mode.
fn watch_targets(config: &MinaConfig) -> Vec<(PathBuf, RecursiveMode)> {
    [
        (config.build.context.clone(), RecursiveMode::Recursive),
        (config.config_path.clone(), RecursiveMode::NonRecursive),
    ]
    .into_iter()
    .filter(|(p, _)| p.exists())
    .collect()
}

fn setup_watchers(watcher: &mut impl Watcher, config: &MinaConfig) -> Result<Vec<PathBuf>> {
    let root = config.get_root();
    let mut watched = Vec::new();

    for (path, mode) in watch_targets(config) {
        watcher
            .watch(&path, mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        log!("watch"; "watching {}", rel_path(&path, root));
        watched.push(path);
    }

    Ok(watched)
}

fn teardown_watchers(watcher: &mut impl Watcher, watched: &[PathBuf]) {
    for path in watched {
        if let Err(e) = watcher.unwatch(path) {
            log!("watch"; "failed to unwatch {}: {e}", path.display());
        }
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the context and config file, rediscovering entries on change.
///
/// `reload` re-reads and validates the configuration after `mina.toml`
/// changes. Blocks until the watcher channel disconnects.
pub fn watch_for_changes_blocking(
    config: MinaConfig,
    reload: impl Fn() -> Result<MinaConfig>,
) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

    let mut debouncer = Debouncer::new(config.watch.debounce_ms);
    let mut watched = setup_watchers(&mut watcher, &config)?;
    let mut session = Session::new(config, reload);

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                match session.handle_changes(&debouncer.take()) {
                    Outcome::Rebuilt { reloaded } => {
                        debouncer.mark_rebuild();
                        if reloaded {
                            teardown_watchers(&mut watcher, &watched);
                            watched = setup_watchers(&mut watcher, &session.config)?;
                            debouncer.delay = Duration::from_millis(session.config.watch.debounce_ms);
                        }
                    }
                    Outcome::Ignored | Outcome::Failed => {}
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use notify::event::{CreateKind, ModifyKind};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> (TempDir, MinaConfig) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "mina.toml", "");
        write(&root, "src/app.json", r#"{ "pages": ["pages/a/a"] }"#);
        write(&root, "src/app.ts", "App({})");
        write(&root, "src/pages/a/a.ts", "Page({})");

        let mut config = MinaConfig::default();
        config.set_root(&root);
        config.config_path = root.join("mina.toml");
        config.build.context = root.join("src");
        config.build.output = root.join("dist");
        (dir, config)
    }

    fn unused() -> Result<MinaConfig> {
        bail!("unused")
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        event.paths = paths.iter().map(PathBuf::from).collect();
        event
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("src/app.json~")));
        assert!(is_temp_file(Path::new("src/.app.json.swp")));
        assert!(is_temp_file(Path::new("src/app.tmp")));
        assert!(!is_temp_file(Path::new("src/app.json")));
    }

    #[test]
    fn test_rel_path() {
        let root = Path::new("/proj");
        assert_eq!(rel_path(Path::new("/proj/src/app.json"), root), "src/app.json");
        assert_eq!(rel_path(Path::new("/other/app.json"), root), "/other/app.json");
    }

    #[test]
    fn test_is_relevant() {
        assert!(is_relevant(&Event::new(EventKind::Create(CreateKind::File))));
        assert!(is_relevant(&Event::new(EventKind::Modify(ModifyKind::Any))));
        assert!(!is_relevant(&Event::new(EventKind::Access(
            notify::event::AccessKind::Any
        ))));
    }

    #[test]
    fn test_debouncer_batches_and_filters() {
        let mut debouncer = Debouncer::new(0);
        assert!(!debouncer.ready());

        debouncer.add(event(
            EventKind::Modify(ModifyKind::Any),
            &["/p/src/b.json", "/p/src/a.json", "/p/src/a.json~"],
        ));
        debouncer.add(event(EventKind::Create(CreateKind::File), &["/p/src/a.json"]));

        assert!(debouncer.ready());
        assert_eq!(
            debouncer.take(),
            [PathBuf::from("/p/src/a.json"), PathBuf::from("/p/src/b.json")]
        );
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_debouncer_cooldown() {
        let mut debouncer = Debouncer::new(300);
        assert!(!debouncer.in_cooldown());
        debouncer.mark_rebuild();
        assert!(debouncer.in_cooldown());
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    #[test]
    fn test_manifest_change_rediscovers() {
        let (_dir, config) = project();
        let context = config.build.context.clone();
        let entries_path = config.entries_path();
        let mut session = Session::new(config, unused);

        write(&context, "pages/b/b.ts", "Page({})");
        write(&context, "app.json", r#"{ "pages": ["pages/a/a", "pages/b/b"] }"#);
        let outcome = session.handle_changes(&[context.join("app.json")]);

        assert_eq!(outcome, Outcome::Rebuilt { reloaded: false });
        let content = fs::read_to_string(entries_path).unwrap();
        assert!(content.contains("\"pages/b/b\""));
    }

    #[test]
    fn test_unrelated_change_ignored() {
        let (_dir, config) = project();
        let output = config.build.output.clone();
        let mut session = Session::new(config, unused);

        let outcome = session.handle_changes(&[output.join("entries.json")]);
        assert_eq!(outcome, Outcome::Ignored);
    }

    #[test]
    fn test_config_change_reloads() {
        let (_dir, config) = project();
        let mut reloaded = config.clone();
        reloaded.build.asset_entry = "assets".into();
        let config_path = config.config_path.clone();
        let mut session = Session::new(config, move || -> Result<MinaConfig> { Ok(reloaded.clone()) });

        let outcome = session.handle_changes(&[config_path]);
        assert_eq!(outcome, Outcome::Rebuilt { reloaded: true });
        assert_eq!(session.plugin.asset_entry(), "assets");
    }

    #[test]
    fn test_failed_reload_keeps_previous_config() {
        let (_dir, config) = project();
        let config_path = config.config_path.clone();
        let mut session = Session::new(config, || -> Result<MinaConfig> { bail!("bad toml") });

        let outcome = session.handle_changes(&[config_path]);
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(session.plugin.asset_entry(), "__assets_chunk__");
    }

    #[test]
    fn test_discovery_error_reported() {
        let (_dir, config) = project();
        let context = config.build.context.clone();
        let mut session = Session::new(config, unused);

        write(&context, "app.json", "{ nope");
        let outcome = session.handle_changes(&[context.join("app.json")]);
        assert_eq!(outcome, Outcome::Failed);
    }
}
