//! Catalog collaborator boundary.
//!
//! The catalog (configuration storage, attachment and product-download
//! records, feature values, languages) lives outside this crate. [`Catalog`]
//! is the seam the host implements; the pipeline only reads and writes
//! through it and surfaces its failures unchanged.

use crate::config::BundleConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type stamped on every published archive.
pub const ZIP_MIME: &str = "application/zip";

/// The catalog's own convention for "no expiration". Normalized to `None`
/// on publish, never written back in this form.
pub const EMPTY_DATE_SENTINEL: &str = "0000-00-00 00:00:00";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog backend error: {0}")]
    Backend(String),
}

/// Downloadable asset attached to catalog content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: u32,

    /// Physical file name inside the asset store; the catalog owns it, this
    /// crate never invents one. Empty means the association is stale.
    pub file: String,

    /// Name shown to downloaders.
    pub file_name: String,

    pub mime: String,
}

/// Virtual-product download record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDownloadRecord {
    pub id: u32,

    /// Owning product; absent means the association is stale.
    pub id_product: Option<u32>,

    /// Physical file name inside the asset store; owned by the catalog.
    pub filename: String,

    pub display_filename: String,

    /// Seconds since the epoch.
    pub date_add: i64,

    pub date_expiration: Option<String>,
}

/// Read/write access to the external catalog. Implementations bring their
/// own transaction discipline; writes here assume last-writer-wins.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn attachment(&self, id: u32) -> Result<Option<AttachmentRecord>, CatalogError>;

    async fn update_attachment(&self, record: &AttachmentRecord) -> Result<(), CatalogError>;

    async fn product_download(
        &self,
        id: u32,
    ) -> Result<Option<ProductDownloadRecord>, CatalogError>;

    async fn update_product_download(
        &self,
        record: &ProductDownloadRecord,
    ) -> Result<(), CatalogError>;

    /// Feature the installation uses to carry version labels, if configured.
    async fn version_feature(&self) -> Result<Option<u32>, CatalogError>;

    /// Products that receive the version tag for this configuration.
    async fn related_product_ids(&self, config: &BundleConfig) -> Result<Vec<u32>, CatalogError>;

    /// Active languages; a created feature value is replicated across all.
    async fn language_ids(&self) -> Result<Vec<u32>, CatalogError>;

    /// Exact-match lookup among custom (non-predefined) values of a feature.
    async fn find_custom_feature_value(
        &self,
        id_feature: u32,
        value: &str,
    ) -> Result<Option<u32>, CatalogError>;

    async fn create_custom_feature_value(
        &self,
        id_feature: u32,
        value: &str,
        id_langs: &[u32],
    ) -> Result<u32, CatalogError>;

    async fn delete_feature_product_link(
        &self,
        id_feature: u32,
        id_product: u32,
    ) -> Result<(), CatalogError>;

    async fn insert_feature_product_link(
        &self,
        id_feature: u32,
        id_product: u32,
        id_feature_value: u32,
    ) -> Result<(), CatalogError>;
}
