//! Path normalization and POSIX-style relative paths.
//!
//! Identity of every resource node and every generated `require` path goes
//! through these helpers, so raw path strings are never compared directly.

use std::{
    env,
    path::{Component, Path, PathBuf},
};

// ============================================================================
// Normalization
// ============================================================================

/// Make a path absolute (against the current directory) and fold `.`/`..`
/// lexically. Works for paths that do not exist yet.
pub fn absolute(path: &Path) -> PathBuf {
    let joined;
    let path = if path.is_absolute() {
        path
    } else {
        joined = env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf());
        &joined
    };
    normalize_lexical(path)
}

/// Normalize a path to absolute form for reliable comparison.
///
/// Existing paths are canonicalized, so symlinked roots compare equal to
/// watcher paths. Missing ones (deleted files, an output directory not
/// created yet) fall back to [`absolute`].
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| absolute(path))
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root: `/a/../../b` → `/b`.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::ParentDir) | None => out.push(".."),
                Some(_) => {}
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Drop the extension of the last component: `pages/index.ts` → `pages/index`.
pub fn strip_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}

/// Append an extension given with its leading dot (`.json`) to a path that
/// has none.
///
/// Unlike `Path::with_extension`, a dotted file stem is kept intact.
pub fn with_dot_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(ext);
    PathBuf::from(s)
}

// ============================================================================
// POSIX rendering
// ============================================================================

/// Render a path with forward slashes regardless of host OS.
pub fn to_posix(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => out.push('/'),
            Component::CurDir => {}
            Component::ParentDir => push_segment(&mut out, ".."),
            Component::Normal(name) => push_segment(&mut out, &name.to_string_lossy()),
        }
    }
    out
}

fn push_segment(out: &mut String, segment: &str) {
    if !out.is_empty() && !out.ends_with('/') {
        out.push('/');
    }
    out.push_str(segment);
}

/// Directory part of a POSIX path: `pages/index/index` → `pages/index`.
pub fn posix_dirname(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

/// Relative POSIX path from `from_dir` to `to`.
///
/// Both inputs are `/`-separated and already normalized.
///
/// ```ignore
/// relative_posix("pages/home", "common")        // → "../../common"
/// relative_posix("", "common")                  // → "common"
/// relative_posix("pages/home", "pages/shared")  // → "../shared"
/// ```
pub fn relative_posix(from_dir: &str, to: &str) -> String {
    let from: Vec<&str> = segments(from_dir).collect();
    let to: Vec<&str> = segments(to).collect();

    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend(&to[common..]);
    parts.join("/")
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Make a relative path explicitly relative so a `require` call resolves it
/// against the calling file instead of a module search path.
///
/// `common` → `./common`, `../common` and `./common` are kept as-is.
pub fn required_path(path: &str) -> String {
    if path.starts_with("./") || path.starts_with("../") {
        path.to_owned()
    } else {
        format!("./{path}")
    }
}
