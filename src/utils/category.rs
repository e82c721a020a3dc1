//! File category classification for watch mode.
//!
//! | Category  | Effect                              | Example Files                  |
//! |-----------|-------------------------------------|--------------------------------|
//! | Config    | Reload config, then rediscover      | `mina.toml`                    |
//! | Manifest  | Rediscover                          | `src/pages/home/home.json`     |
//! | Script    | Rediscover (first match may change) | `src/pages/home/home.ts`       |
//! | Asset     | Rediscover (asset set may change)   | `src/pages/home/home.wxml`     |
//! | Unknown   | Ignored                             | output files, other extensions |
//!
//! Files under the output directory are always `Unknown`, so writing
//! `entries.json` never triggers another pass.

use super::path::normalize_path;
use crate::config::MinaConfig;
use std::path::Path;

const MANIFEST_EXTENSION: &str = ".json";

/// Category of a changed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Config,
    Manifest,
    Script,
    Asset,
    Unknown,
}

impl FileCategory {
    /// Whether a change of this category affects the entry set.
    pub const fn triggers_discovery(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Categorize a changed path against the loaded configuration.
pub fn categorize_path(path: &Path, config: &MinaConfig) -> FileCategory {
    let path = normalize_path(path);

    if path == config.config_path {
        return FileCategory::Config;
    }
    if path.starts_with(&config.build.output) || !path.starts_with(&config.build.context) {
        return FileCategory::Unknown;
    }

    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return FileCategory::Unknown;
    };
    let has_ext = |exts: &[String]| exts.iter().any(|e| name.ends_with(e.as_str()));

    if name.ends_with(MANIFEST_EXTENSION) {
        FileCategory::Manifest
    } else if has_ext(&config.build.script_extensions) {
        FileCategory::Script
    } else if has_ext(&config.build.asset_extensions) {
        FileCategory::Asset
    } else {
        FileCategory::Unknown
    }
}
