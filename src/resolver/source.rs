//! Filesystem access used by discovery.
//!
//! Discovery only ever reads manifests and probes for sibling files, so the
//! seam is two calls wide. `Disk` is the real implementation.

use std::{fs, io, path::Path};

/// Read-only view of the files discovery looks at.
pub trait FileSource {
    /// Read a file as UTF-8 text.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Whether `path` exists and is a regular file.
    ///
    /// A missing file is `Ok(false)`; any other failure is an error.
    fn is_file(&self, path: &Path) -> io::Result<bool>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct Disk;

impl FileSource for Disk {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn is_file(&self, path: &Path) -> io::Result<bool> {
        match fs::metadata(path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl<S: FileSource + ?Sized> FileSource for &S {
    fn read(&self, path: &Path) -> io::Result<String> {
        (**self).read(path)
    }

    fn is_file(&self, path: &Path) -> io::Result<bool> {
        (**self).is_file(path)
    }
}
