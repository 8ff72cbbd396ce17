//! Archive packaging: relocate the fetched tree, compress it to a single
//! zip file inside the workspace.

use crate::config::BundleConfig;
use crate::exec::{CommandError, CommandRunner};
use crate::workspace::{Workspace, ARCHIVE_NAME};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("failed to relocate '{}' to '{}': {source}", .from.display(), .to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Moves `download/<source_folder>` (or `download` itself) to the canonical
/// `source` location and compresses it into the workspace archive.
///
/// With `zip_folder` set the archive carries that folder as its single
/// top-level entry; otherwise the source contents sit at the archive root.
pub fn package(
    runner: &CommandRunner,
    workspace: &Workspace,
    config: &BundleConfig,
) -> Result<PathBuf, PackageError> {
    let download = workspace.download_dir();
    let source = workspace.source_dir();

    let staged = match &config.source_folder {
        Some(folder) => download.join(folder),
        None => download,
    };
    relocate(staged, source.clone())?;

    match &config.zip_folder {
        Some(folder) => {
            let rooted = workspace.root().join(folder);
            relocate(source, rooted)?;
            runner.run(
                workspace.root(),
                "zip",
                &["-qr", ARCHIVE_NAME, folder],
                &[],
                None,
            )?;
        }
        None => {
            // Compress the contents, not the folder; hidden entries are
            // picked up by the `.` walk.
            let parent_archive = format!("../{ARCHIVE_NAME}");
            runner.run(&source, "zip", &["-qr", &parent_archive, "."], &[], None)?;
        }
    }

    let archive = workspace.archive_path();
    info!(archive = %archive.display(), "archive written");
    Ok(archive)
}

fn relocate(from: PathBuf, to: PathBuf) -> Result<(), PackageError> {
    std::fs::rename(&from, &to).map_err(|source| PackageError::Relocate { from, to, source })
}
