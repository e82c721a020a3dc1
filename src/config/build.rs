//! `[build]` section configuration.
//!
//! Where discovery starts, which files back a node, and which references
//! are never followed.

use super::defaults;
use crate::resolver::{ExcludeRules, ResolveOptions};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Entry Roots
// ============================================================================

/// `entry = "app"` or `entry = ["app", "widget/index"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryConfig {
    One(String),
    Many(Vec<String>),
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self::Many(defaults::build::entry())
    }
}

impl EntryConfig {
    /// Root entries in declaration order.
    pub fn roots(&self) -> &[String] {
        match self {
            Self::One(root) => std::slice::from_ref(root),
            Self::Many(roots) => roots,
        }
    }
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in mina.toml.
///
/// # Example
/// ```toml
/// [build]
/// context = "src"                  # Discovery root
/// entry = "app"                    # One root or a list of roots
/// output = "dist"                  # Where entries.json is written
/// script_extensions = [".ts", ".js"]
///
/// [build.exclude]
/// vendor_markers = ["miniprogram_npm"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Build context: root entries and `/`-rooted references resolve here.
    #[serde(default = "defaults::build::context")]
    #[educe(Default = defaults::build::context())]
    pub context: PathBuf,

    /// Root entries, relative to the context, without extension.
    #[serde(default)]
    pub entry: EntryConfig,

    /// Output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Script extensions in priority order; the first existing file wins.
    #[serde(default = "defaults::build::script_extensions")]
    #[educe(Default = defaults::build::script_extensions())]
    pub script_extensions: Vec<String>,

    /// Asset extensions; every existing file is bundled.
    #[serde(default = "defaults::build::asset_extensions")]
    #[educe(Default = defaults::build::asset_extensions())]
    pub asset_extensions: Vec<String>,

    /// Name of the synthetic entry holding every asset file.
    #[serde(default = "defaults::build::asset_entry")]
    #[educe(Default = defaults::build::asset_entry())]
    pub asset_entry: String,

    /// References that are never resolved.
    #[serde(default)]
    pub exclude: ExcludeConfig,
}

impl BuildConfig {
    /// Options for one resource graph over this section.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            context: self.context.clone(),
            script_extensions: self.script_extensions.clone(),
            asset_extensions: self.asset_extensions.clone(),
            exclude: self.exclude.rules(),
        }
    }
}

// ============================================================================
// Exclusions
// ============================================================================

/// `[build.exclude]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ExcludeConfig {
    /// URI scheme prefixes of host-provided plugin components.
    #[serde(default = "defaults::build::exclude::schemes")]
    #[educe(Default = defaults::build::exclude::schemes())]
    pub schemes: Vec<String>,

    /// Path segments marking prebuilt vendor packages.
    #[serde(default = "defaults::build::exclude::vendor_markers")]
    #[educe(Default = defaults::build::exclude::vendor_markers())]
    pub vendor_markers: Vec<String>,
}

impl ExcludeConfig {
    pub fn rules(&self) -> ExcludeRules {
        ExcludeRules::new(self.schemes.clone(), self.vendor_markers.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
