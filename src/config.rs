use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Backend used to materialize the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Git,
    Subversion,
    HttpMirror,
}

/// Immutable input for a single fetch/package/publish run.
///
/// Credentials are optional; when set they are routed through the safest
/// channel the chosen backend supports and never appear in process listings
/// unless the backend offers nothing better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleConfig {
    pub kind: SourceKind,

    /// Repository URL, or base URL for a recursive mirror.
    pub source_url: String,

    #[serde(default)]
    pub source_login: Option<String>,

    #[serde(default)]
    pub source_password: Option<String>,

    /// Subpath inside the fetched tree to treat as the real source root.
    #[serde(default)]
    pub source_folder: Option<String>,

    /// When set, the archive carries a single top-level folder of this name.
    #[serde(default)]
    pub zip_folder: Option<String>,

    /// Display name stem for the published asset; the detected version is
    /// appended as a suffix.
    #[serde(default)]
    pub zip_basename: Option<String>,

    #[serde(default)]
    pub id_attachment: Option<u32>,

    #[serde(default)]
    pub id_product_download: Option<u32>,
}

/// Catalog record that receives the produced archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTarget {
    Attachment(u32),
    ProductDownload(u32),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration may feed an attachment or a product download, not both.
    #[error("configuration references both an attachment and a product download; pick one")]
    ConflictingTargets,
}

impl BundleConfig {
    /// Resolves which catalog record the archive is published to.
    ///
    /// `Ok(None)` means package only, do not publish; a valid terminal state.
    pub fn publish_target(&self) -> Result<Option<PublishTarget>, ConfigError> {
        match (self.id_attachment, self.id_product_download) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingTargets),
            (Some(id), None) => Ok(Some(PublishTarget::Attachment(id))),
            (None, Some(id)) => Ok(Some(PublishTarget::ProductDownload(id))),
            (None, None) => Ok(None),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.source_login.is_some() || self.source_password.is_some()
    }
}

/// Per-installation settings, passed explicitly into the pipeline so runs
/// stay independently testable and parallelizable across workspaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Exclusive scratch directory for fetch/package cycles.
    pub workspace_dir: PathBuf,

    /// Persistent asset store the published archive is moved into.
    pub asset_store_dir: PathBuf,

    /// File copied into the workspace root after every clear so the
    /// directory is never servable as a listing. An empty placeholder is
    /// written when unset.
    #[serde(default)]
    pub marker_source: Option<PathBuf>,

    /// Full diagnostics on command failures instead of stderr only.
    #[serde(default)]
    pub verbose: bool,
}
