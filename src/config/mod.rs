//! Project configuration management for `mina.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                        |
//! |--------------------|------------------------------------------------|
//! | `[build]`          | Context, root entries, extensions, output      |
//! | `[build.exclude]`  | Plugin schemes and vendor directories          |
//! | `[inject]`         | Chunk graph location, runtime inclusion        |
//! | `[watch]`          | Debounce for rediscovery                       |
//!
//! # Example
//!
//! ```toml
//! [build]
//! context = "src"
//! entry = "app"
//! output = "dist"
//!
//! [build.exclude]
//! schemes = ["plugin://", "plugin-private://"]
//!
//! [inject]
//! include_runtime = false
//! ```
//!
//! A missing `mina.toml` is not an error: every field has a default.

mod build;
pub mod defaults;
mod error;
mod inject;
mod watch;

pub use error::ConfigError;

use build::BuildConfig;
use inject::InjectConfig;
use watch::WatchConfig;

use crate::cli::{Cli, Commands};
use crate::utils::path::normalize_path;
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Name of the entry map written by `minapack entries`.
pub const ENTRIES_FILE: &str = "entries.json";

/// Name of the record of files rewritten by `minapack inject`.
pub const INJECTED_FILE: &str = "injected.json";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing mina.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct MinaConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Discovery settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Runtime injection settings
    #[serde(default)]
    pub inject: InjectConfig,

    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl MinaConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: MinaConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Chunk graph location, resolved against the output directory
    pub fn chunk_graph_path(&self) -> PathBuf {
        self.build.output.join(&self.inject.chunk_graph)
    }

    /// Entry map location inside the output directory
    pub fn entries_path(&self) -> PathBuf {
        self.build.output.join(ENTRIES_FILE)
    }

    /// Injection record location inside the output directory
    pub fn injected_path(&self) -> PathBuf {
        self.build.output.join(INJECTED_FILE)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.context, cli.context.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.update_path_with_root(&root, &cli.config);

        if let Commands::Inject {
            graph,
            include_runtime,
        } = &cli.command
        {
            Self::update_option(&mut self.inject.chunk_graph, graph.as_ref());
            Self::update_option(&mut self.inject.include_runtime, include_runtime.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = normalize_path(&Self::expand_tilde(root));
        self.set_root(&root);

        self.config_path = normalize_path(&root.join(config));
        self.build.context = normalize_path(&root.join(Self::expand_tilde(&self.build.context)));
        self.build.output = normalize_path(&root.join(Self::expand_tilde(&self.build.output)));
    }

    /// Expand a leading `~` to the home directory
    fn expand_tilde(path: &Path) -> PathBuf {
        let path = path.to_string_lossy();
        PathBuf::from(shellexpand::tilde(&path).into_owned())
    }

    /// Validate configuration for the current command
    pub fn validate(&self) -> Result<()> {
        let roots = self.build.entry.roots();
        if roots.is_empty() {
            bail!(ConfigError::Validation(
                "[build.entry] must name at least one root entry".into()
            ));
        }
        if roots.iter().any(|r| r.trim().is_empty()) {
            bail!(ConfigError::Validation(
                "[build.entry] must not contain empty names".into()
            ));
        }

        if self.build.script_extensions.is_empty() {
            bail!(ConfigError::Validation(
                "[build.script_extensions] must have at least one element".into()
            ));
        }
        Self::check_extensions("[build.script_extensions]", &self.build.script_extensions)?;
        Self::check_extensions("[build.asset_extensions]", &self.build.asset_extensions)?;

        if self.build.asset_entry.trim().is_empty() {
            bail!(ConfigError::Validation(
                "[build.asset_entry] must not be empty".into()
            ));
        }

        if !self.build.context.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.context] `{}` is not a directory",
                self.build.context.display()
            )));
        }

        Ok(())
    }

    /// Every extension must carry its leading dot
    fn check_extensions(field: &str, extensions: &[String]) -> Result<()> {
        if let Some(ext) = extensions.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
            bail!(ConfigError::Validation(format!(
                "{field} entry `{ext}` must start with `.`"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("minapack").chain(args.iter().copied()))
    }

    /// Config rooted at a temp dir that has a `src/` context.
    fn rooted(content: &str, args: &[&str]) -> (TempDir, MinaConfig) {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let root = dir.path().to_str().unwrap();

        let mut full = vec!["--root", root];
        full.extend_from_slice(args);

        let mut config = MinaConfig::from_str(content).unwrap();
        config.update_with_cli(&cli(&full));
        (dir, config)
    }

    #[test]
    fn test_from_str() {
        let config = MinaConfig::from_str(
            r#"
            [build]
            context = "miniprogram"
            entry = ["app"]
        "#,
        )
        .unwrap();
        assert_eq!(config.build.context, PathBuf::from("miniprogram"));
        assert_eq!(config.build.entry.roots(), ["app"]);
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = MinaConfig::from_str("[build\ncontext = 1");
        assert!(result.is_err());
        assert!(result.unwrap_err().downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn test_from_path_missing() {
        let dir = TempDir::new().unwrap();
        let err = MinaConfig::from_path(&dir.path().join("mina.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Io(..))
        ));
    }

    #[test]
    fn test_get_root_default() {
        let config = MinaConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_paths_resolved_against_root() {
        let (dir, config) = rooted("", &["entries"]);
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.context, root.join("src"));
        assert_eq!(config.build.output, root.join("dist"));
        assert_eq!(config.config_path, root.join("mina.toml"));
        assert_eq!(config.entries_path(), root.join("dist").join("entries.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_paths() {
        let (dir, config) = rooted("", &["--context", "app", "-o", "out", "entries"]);
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.build.context, root.join("app"));
        assert_eq!(config.build.output, root.join("out"));
    }

    #[test]
    fn test_cli_overrides_inject() {
        let (_dir, config) = rooted(
            "[inject]\nchunk_graph = \"a.json\"",
            &["inject", "--graph", "b.json", "--include-runtime"],
        );
        assert!(config.chunk_graph_path().ends_with("dist/b.json"));
        assert!(config.inject.include_runtime);
    }

    #[test]
    fn test_inject_flags_ignored_for_other_commands() {
        let (_dir, config) = rooted("[inject]\nchunk_graph = \"a.json\"", &["entries"]);
        assert!(config.chunk_graph_path().ends_with("dist/a.json"));
    }

    #[test]
    fn test_validate_rejects_missing_context() {
        let (_dir, config) = rooted("", &["--context", "nope", "entries"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[build.context]"));
    }

    #[test]
    fn test_validate_rejects_empty_entry_list() {
        let (_dir, config) = rooted("[build]\nentry = []", &["entries"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("[build.entry]"));
    }

    #[test]
    fn test_validate_rejects_empty_script_extensions() {
        let (_dir, config) = rooted("[build]\nscript_extensions = []", &["entries"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_extension_without_dot() {
        let (_dir, config) = rooted("[build]\nasset_extensions = [\"wxml\"]", &["entries"]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("`wxml`"));
    }

    #[test]
    fn test_validate_rejects_empty_asset_entry() {
        let (_dir, config) = rooted("[build]\nasset_entry = \"\"", &["entries"]);
        assert!(config.validate().is_err());
    }
}
