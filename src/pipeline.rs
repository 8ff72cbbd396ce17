//! Sequential bundle pipeline executor.
//!
//! This module provides the [`BundlePipeline`] coordinator that executes the
//! run stages (prerequisites → fetch → package → publish → tag) with:
//! - Async coordination via `tokio`, blocking tool work on the blocking pool
//! - A configurable timeout for the subprocess-heavy stages
//! - Structured logging via `tracing`
//! - Fail-fast propagation: the first error aborts the run, no partial
//!   publish states are attempted

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::info;

use crate::catalog::Catalog;
use crate::config::{BundleConfig, ConfigError, Settings};
use crate::exec::CommandRunner;
use crate::fetch::{self, FetchError};
use crate::package::{self, PackageError};
use crate::publish::{self, PublishError};
use crate::tag::{self, TagError};
use crate::tools::{check_prerequisites, ToolCheckError};
use crate::workspace::Workspace;

// ============================================================================
// Pipeline Types
// ============================================================================

/// Complete result of one pipeline run.
#[derive(Debug)]
pub struct BundleOutcome {
    /// Version label detected by the fetcher, trimmed, if any.
    pub version: Option<String>,

    /// Final resting place of the produced archive: inside the asset store
    /// when a publish target was configured, inside the workspace otherwise.
    pub archive: PathBuf,

    /// Performance statistics per stage.
    pub stats: BundleStats,
}

/// Timing collected across one run.
#[derive(Debug, Default, Clone)]
pub struct BundleStats {
    pub total_duration_ms: u64,
    pub fetch_duration_ms: u64,
    pub package_duration_ms: u64,
    pub publish_duration_ms: u64,
}

// ============================================================================
// Pipeline Errors
// ============================================================================

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// A subprocess-heavy stage exceeded the configured timeout.
    #[error("stage '{stage}' timed out after {timeout_secs}s")]
    StageTimeout { stage: &'static str, timeout_secs: u64 },

    /// A blocking stage task died before producing a result.
    #[error("stage '{stage}' aborted: {reason}")]
    StageAborted { stage: &'static str, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Tooling(#[from] ToolCheckError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Tag(#[from] TagError),
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Default ceiling per stage; clones and recursive mirrors are slow.
const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(1800);

/// Sequential fetch → package → publish → tag pipeline.
///
/// One pipeline instance drives one workspace path; runs against the same
/// workspace must not overlap because every run clears it at fetch start.
/// Independent configurations may run concurrently when each pipeline is
/// given its own workspace through [`Settings`].
///
/// # Example
///
/// ```ignore
/// use source_bundler::{BundleConfig, BundlePipeline, Settings, SourceKind};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pipeline = BundlePipeline::new(settings, catalog)
///         .with_timeout(std::time::Duration::from_secs(600));
///
///     let outcome = pipeline.execute(config).await?;
///     println!("published {}", outcome.archive.display());
///     Ok(())
/// }
/// ```
pub struct BundlePipeline<C: Catalog> {
    settings: Settings,
    catalog: C,
    stage_timeout: Duration,
}

impl<C: Catalog> BundlePipeline<C> {
    pub fn new(settings: Settings, catalog: C) -> Self {
        Self {
            settings,
            catalog,
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }

    /// Sets the ceiling applied to each subprocess-heavy stage.
    pub fn with_timeout(mut self, stage_timeout: Duration) -> Self {
        self.stage_timeout = stage_timeout;
        self
    }

    /// Executes one complete run for `config`.
    ///
    /// Stages run strictly in sequence; the first failure aborts the run.
    /// Packaging without publishing (no target configured) is a valid
    /// terminal state, as is publishing without tagging (no version label).
    pub async fn execute(&self, config: BundleConfig) -> Result<BundleOutcome, PipelineError> {
        let start = Instant::now();
        let mut stats = BundleStats::default();

        // Surface a broken association before any tool runs.
        let target = config.publish_target()?;

        let runner = CommandRunner::new(self.settings.verbose);
        let workspace = Workspace::new(&self.settings);

        // ====================================================================
        // Stage 0: Prerequisites
        // ====================================================================

        {
            let runner = runner.clone();
            let settings = self.settings.clone();
            self.blocking("prerequisites", move || {
                check_prerequisites(&runner, &settings).map_err(PipelineError::from)
            })
            .await?;
        }

        // ====================================================================
        // Stage 1: Fetch
        // ====================================================================

        info!("starting fetch stage");
        let fetch_start = Instant::now();

        let version = {
            let runner = runner.clone();
            let workspace = workspace.clone();
            let config = config.clone();
            self.blocking("fetch", move || {
                fetch::run_fetch(&runner, &workspace, &config).map_err(PipelineError::from)
            })
            .await?
        };
        let version = version.filter(|label| !label.is_empty());

        stats.fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;
        info!(
            duration_ms = stats.fetch_duration_ms,
            version = version.as_deref().unwrap_or("-"),
            "fetch completed"
        );

        // ====================================================================
        // Stage 2: Package
        // ====================================================================

        info!("starting package stage");
        let package_start = Instant::now();

        let archive = {
            let runner = runner.clone();
            let workspace = workspace.clone();
            let config = config.clone();
            self.blocking("package", move || {
                package::package(&runner, &workspace, &config).map_err(PipelineError::from)
            })
            .await?
        };

        stats.package_duration_ms = package_start.elapsed().as_millis() as u64;
        info!(
            duration_ms = stats.package_duration_ms,
            archive = %archive.display(),
            "package completed"
        );

        // ====================================================================
        // Stage 3: Publish
        // ====================================================================

        let archive = match target {
            Some(target) => {
                let publish_start = Instant::now();
                let destination = publish::publish(
                    &self.catalog,
                    &self.settings,
                    &config,
                    target,
                    &archive,
                    version.as_deref(),
                )
                .await?;
                stats.publish_duration_ms = publish_start.elapsed().as_millis() as u64;
                info!(
                    duration_ms = stats.publish_duration_ms,
                    "publish completed"
                );
                destination
            }
            None => {
                info!("no publish target configured; archive stays in the workspace");
                archive
            }
        };

        // ====================================================================
        // Stage 4: Version tagging
        // ====================================================================

        if let Some(version) = &version {
            tag::tag_version(&self.catalog, &config, version).await?;
        }

        stats.total_duration_ms = start.elapsed().as_millis() as u64;
        info!(duration_ms = stats.total_duration_ms, "run completed");

        Ok(BundleOutcome {
            version,
            archive,
            stats,
        })
    }

    /// Runs a blocking stage on the blocking pool under the stage timeout.
    async fn blocking<T, F>(&self, stage: &'static str, work: F) -> Result<T, PipelineError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
    {
        match timeout(self.stage_timeout, tokio::task::spawn_blocking(work)).await {
            Err(_) => Err(PipelineError::StageTimeout {
                stage,
                timeout_secs: self.stage_timeout.as_secs(),
            }),
            Ok(Err(join)) => Err(PipelineError::StageAborted {
                stage,
                reason: join.to_string(),
            }),
            Ok(Ok(result)) => result,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
