//! JSON manifest schema.
//!
//! Only the fields that drive discovery are modelled; every other key
//! (`window`, `tabBar`, `component`, ...) is ignored. A field that is present
//! with the wrong type is a malformed manifest.

use super::source::FileSource;
use crate::error::BuildError;
use indexmap::IndexMap;
use serde::Deserialize;
use std::{io, path::Path};

/// Sidecar manifest of a page, component or app entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pages: Option<Vec<String>>,

    /// Component name → reference, kept in declaration order.
    #[serde(default, rename = "usingComponents")]
    using_components: Option<IndexMap<String, String>>,

    #[serde(default, alias = "subPackages")]
    subpackages: Option<Vec<Subpackage>>,
}

/// One `subpackages` item. Its pages are relative to `root`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Subpackage {
    pub root: String,
    #[serde(default)]
    pub pages: Vec<String>,
}

impl Manifest {
    /// Parse manifest text; `path` is only used for the error.
    pub fn parse(content: &str, path: &Path) -> Result<Self, BuildError> {
        serde_json::from_str(content).map_err(|source| BuildError::MalformedManifest {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse the manifest at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist (the node is a leaf).
    pub fn read(source: &impl FileSource, path: &Path) -> Result<Option<Self>, BuildError> {
        match source.read(path) {
            Ok(content) => Self::parse(&content, path).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BuildError::Io(path.to_path_buf(), e)),
        }
    }

    pub fn pages(&self) -> &[String] {
        self.pages.as_deref().unwrap_or_default()
    }

    pub fn components(&self) -> impl Iterator<Item = (&str, &str)> {
        self.using_components
            .iter()
            .flatten()
            .map(|(name, path)| (name.as_str(), path.as_str()))
    }

    pub fn subpackages(&self) -> &[Subpackage] {
        self.subpackages.as_deref().unwrap_or_default()
    }
}
