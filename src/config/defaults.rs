//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn context() -> PathBuf {
        "src".into()
    }

    pub fn output() -> PathBuf {
        "dist".into()
    }

    pub fn entry() -> Vec<String> {
        vec!["app".into()]
    }

    pub fn script_extensions() -> Vec<String> {
        vec![".ts".into(), ".js".into()]
    }

    pub fn asset_extensions() -> Vec<String> {
        vec![".json".into(), ".wxml".into(), ".wxss".into()]
    }

    pub fn asset_entry() -> String {
        "__assets_chunk__".into()
    }

    pub mod exclude {
        pub fn schemes() -> Vec<String> {
            vec!["plugin://".into(), "plugin-private://".into()]
        }

        pub fn vendor_markers() -> Vec<String> {
            vec!["miniprogram_npm".into()]
        }
    }
}

// ============================================================================
// [inject] Section Defaults
// ============================================================================

pub mod inject {
    use std::path::PathBuf;

    pub fn chunk_graph() -> PathBuf {
        "chunks.json".into()
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    pub fn debounce_ms() -> u64 {
        300
    }
}
