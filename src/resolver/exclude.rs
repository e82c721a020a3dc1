//! References that are never treated as local build entries.
//!
//! Both kinds are supplied by the host environment at runtime:
//!
//! | Kind   | Example                          | Matched by                 |
//! |--------|----------------------------------|----------------------------|
//! | Plugin | `plugin://vendor/widget`         | scheme prefix              |
//! | Vendor | `miniprogram_npm/weui/dialog`    | whole path segment         |
//!
//! The lists are configuration (`[build.exclude]`), not constants: which
//! schemes and vendor directories exist depends on the host ecosystem.

/// Why a reference was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// Foreign plugin scheme, resolved by the host.
    Plugin,
    /// Vendored library directory, supplied by the host.
    Vendor,
}

/// Configured exclusion rules, checked against raw references before any
/// path resolution happens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeRules {
    schemes: Vec<String>,
    vendor_markers: Vec<String>,
}

impl ExcludeRules {
    pub fn new(schemes: Vec<String>, vendor_markers: Vec<String>) -> Self {
        Self {
            schemes,
            vendor_markers,
        }
    }

    /// Classify a raw manifest reference. `None` means it is a local entry.
    pub fn check(&self, reference: &str) -> Option<Exclusion> {
        if self.schemes.iter().any(|s| reference.starts_with(s.as_str())) {
            return Some(Exclusion::Plugin);
        }

        let vendored = reference
            .split(['/', '\\'])
            .any(|segment| self.vendor_markers.iter().any(|m| m == segment));
        vendored.then_some(Exclusion::Vendor)
    }
}
