//! Environment checks run before a pipeline touches anything.

use crate::config::Settings;
use crate::exec::CommandRunner;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolCheckError {
    /// One or more required executables did not resolve on the search path.
    #[error(
        "\"{}\" command line tool(s) not installed or not reachable through the current PATH; \
         install them or correct the environment",
        .0.join("\", \"")
    )]
    MissingTools(Vec<String>),

    #[error("the directory '{}' must be writable by the current user", .0.display())]
    NotWritable(PathBuf),

    #[error("failed to prepare directory '{}': {source}", .path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Probes every name on the executable search path and reports the complete
/// set of misses at once, so the operator fixes their environment in one pass.
pub fn check_available(
    runner: &CommandRunner,
    cwd: &Path,
    tools: &[&str],
) -> Result<(), ToolCheckError> {
    let mut missing = Vec::new();
    for &tool in tools {
        let resolved = runner
            .run_unchecked(cwd, "which", &[tool], &[], None)
            .map(|output| output.success())
            .unwrap_or(false);
        if !resolved {
            missing.push(tool.to_string());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ToolCheckError::MissingTools(missing))
    }
}

/// Checks the archiver tool plus write access to the workspace and the
/// persistent asset store. The workspace is created when absent; the asset
/// store belongs to the host and must already exist.
pub fn check_prerequisites(
    runner: &CommandRunner,
    settings: &Settings,
) -> Result<(), ToolCheckError> {
    std::fs::create_dir_all(&settings.workspace_dir).map_err(|source| ToolCheckError::Prepare {
        path: settings.workspace_dir.clone(),
        source,
    })?;

    ensure_writable(&settings.workspace_dir)?;
    ensure_writable(&settings.asset_store_dir)?;

    check_available(runner, &settings.workspace_dir, &["zip"])
}

fn ensure_writable(dir: &Path) -> Result<(), ToolCheckError> {
    let probe = dir.join(".write-probe");
    match std::fs::write(&probe, b"") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            Ok(())
        }
        Err(_) => Err(ToolCheckError::NotWritable(dir.to_path_buf())),
    }
}
