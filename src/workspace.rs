//! Fixed-path scratch area for one fetch/package cycle.
//!
//! The workspace is an exclusive, disposable directory. It is cleared at the
//! start of every fetch, hidden entries included, and the boot marker is
//! restored each time so the directory is never servable as a listing. There
//! is no teardown after a successful run; the next run's clear is the actual
//! cleanup. Concurrent runs must use distinct workspace paths.

use crate::config::Settings;
use std::path::{Path, PathBuf};

/// Name of the archive produced inside the workspace root.
pub const ARCHIVE_NAME: &str = "bundle.zip";

/// Placeholder written when no marker source is configured.
const MARKER_FALLBACK: &str = "index.html";

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    marker_source: Option<PathBuf>,
}

impl Workspace {
    pub fn new(settings: &Settings) -> Self {
        Self {
            root: settings.workspace_dir.clone(),
            marker_source: settings.marker_source.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subfolder the fetchers materialize the tree into.
    pub fn download_dir(&self) -> PathBuf {
        self.root.join("download")
    }

    /// Canonical location the packager relocates the tree to.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join("source")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.root.join(ARCHIVE_NAME)
    }

    pub fn ensure_root(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Removes every entry under the root, hidden files included, then
    /// restores the boot marker. Idempotent.
    pub fn clear(&self) -> std::io::Result<()> {
        self.ensure_root()?;

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            // file_type does not follow symlinks, so a link to a directory
            // is removed as a file rather than traversed.
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(entry.path())?;
            } else {
                std::fs::remove_file(entry.path())?;
            }
        }

        self.restore_marker()
    }

    fn restore_marker(&self) -> std::io::Result<()> {
        match &self.marker_source {
            Some(source) => {
                let name = source
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(MARKER_FALLBACK));
                std::fs::copy(source, self.root.join(name)).map(|_| ())
            }
            None => std::fs::write(self.root.join(MARKER_FALLBACK), b""),
        }
    }
}
