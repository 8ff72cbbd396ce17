//! Moves the produced archive into the asset store and updates the owning
//! catalog record's filename, mime, and date metadata.

use crate::catalog::{Catalog, CatalogError, EMPTY_DATE_SENTINEL, ZIP_MIME};
use crate::config::{BundleConfig, PublishTarget, Settings};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PublishError {
    /// The configured association points at a record that no longer exists
    /// or was never completed.
    #[error("the configured {target} record is missing or stale; update the bundle association")]
    RecordNotFound { target: &'static str },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to move archive '{}' into '{}': {source}", .from.display(), .to.display())]
    Store {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Publishes the archive to the record selected by `target` and returns its
/// final path inside the asset store.
///
/// The catalog record owns the physical filename; this function never
/// invents one.
pub async fn publish<C>(
    catalog: &C,
    settings: &Settings,
    config: &BundleConfig,
    target: PublishTarget,
    archive: &Path,
    version: Option<&str>,
) -> Result<PathBuf, PublishError>
where
    C: Catalog + ?Sized,
{
    match target {
        PublishTarget::Attachment(id) => {
            let mut record = catalog
                .attachment(id)
                .await?
                .filter(|record| !record.file.is_empty())
                .ok_or(PublishError::RecordNotFound {
                    target: "attachment",
                })?;

            let destination = settings.asset_store_dir.join(&record.file);
            move_into_store(archive, &destination)?;

            if let Some(basename) = &config.zip_basename {
                record.file_name = display_filename(basename, version);
            }
            record.mime = ZIP_MIME.to_string();
            catalog.update_attachment(&record).await?;

            info!(id, destination = %destination.display(), "attachment published");
            Ok(destination)
        }
        PublishTarget::ProductDownload(id) => {
            let mut record = catalog
                .product_download(id)
                .await?
                .filter(|record| record.id_product.is_some())
                .ok_or(PublishError::RecordNotFound {
                    target: "product download",
                })?;

            let destination = settings.asset_store_dir.join(&record.filename);
            move_into_store(archive, &destination)?;

            if let Some(basename) = &config.zip_basename {
                record.display_filename = display_filename(basename, version);
            }
            record.date_add = epoch_seconds();
            // The catalog stores "no expiration" as an all-zero date; carry
            // the absent form instead of writing the sentinel back.
            if record.date_expiration.as_deref() == Some(EMPTY_DATE_SENTINEL) {
                record.date_expiration = None;
            }
            catalog.update_product_download(&record).await?;

            info!(id, destination = %destination.display(), "product download published");
            Ok(destination)
        }
    }
}

/// `<basename>[-<version>].zip`
pub(crate) fn display_filename(basename: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{basename}-{version}.zip"),
        None => format!("{basename}.zip"),
    }
}

fn move_into_store(from: &Path, to: &Path) -> Result<(), PublishError> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // The store may sit on another filesystem.
    std::fs::copy(from, to)
        .and_then(|_| std::fs::remove_file(from))
        .map_err(|source| PublishError::Store {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
}

fn epoch_seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::MemoryCatalog;
    use crate::catalog::{AttachmentRecord, ProductDownloadRecord};
    use crate::config::SourceKind;

    fn settings(label: &str) -> Settings {
        let root = std::env::temp_dir().join(format!(
            "bundler_pub_{}_{}_{}",
            label,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos()
        ));
        std::fs::create_dir_all(root.join("store")).unwrap();
        Settings {
            workspace_dir: root.clone(),
            asset_store_dir: root.join("store"),
            marker_source: None,
            verbose: false,
        }
    }

    fn config() -> BundleConfig {
        BundleConfig {
            kind: SourceKind::Git,
            source_url: "https://example.com/repo.git".to_string(),
            source_login: None,
            source_password: None,
            source_folder: None,
            zip_folder: None,
            zip_basename: Some("myapp".to_string()),
            id_attachment: None,
            id_product_download: None,
        }
    }

    fn write_archive(settings: &Settings) -> PathBuf {
        let archive = settings.workspace_dir.join("bundle.zip");
        std::fs::write(&archive, b"PK\x03\x04fake").unwrap();
        archive
    }

    #[tokio::test]
    async fn test_attachment_gets_display_name_and_mime() {
        let settings = settings("attachment");
        let archive = write_archive(&settings);
        let catalog = MemoryCatalog::default();
        catalog.state.lock().unwrap().attachments.insert(
            4,
            AttachmentRecord {
                id: 4,
                file: "deadbeef".to_string(),
                file_name: "old-name.zip".to_string(),
                mime: "application/octet-stream".to_string(),
            },
        );

        let destination = publish(
            &catalog,
            &settings,
            &config(),
            PublishTarget::Attachment(4),
            &archive,
            Some("1.10.0"),
        )
        .await
        .unwrap();

        assert_eq!(destination, settings.asset_store_dir.join("deadbeef"));
        assert!(destination.is_file());
        assert!(!archive.exists());

        let record = catalog.state.lock().unwrap().attachments[&4].clone();
        assert_eq!(record.file_name, "myapp-1.10.0.zip");
        assert_eq!(record.mime, ZIP_MIME);

        std::fs::remove_dir_all(settings.workspace_dir).ok();
    }

    #[tokio::test]
    async fn test_stale_attachment_is_record_not_found() {
        let settings = settings("stale");
        let archive = write_archive(&settings);
        let catalog = MemoryCatalog::default();
        catalog.state.lock().unwrap().attachments.insert(
            4,
            AttachmentRecord {
                id: 4,
                file: String::new(),
                file_name: String::new(),
                mime: String::new(),
            },
        );

        let err = publish(
            &catalog,
            &settings,
            &config(),
            PublishTarget::Attachment(4),
            &archive,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PublishError::RecordNotFound { .. }));
        // Nothing was moved.
        assert!(archive.exists());

        std::fs::remove_dir_all(settings.workspace_dir).ok();
    }

    #[tokio::test]
    async fn test_product_download_normalizes_empty_expiration() {
        let settings = settings("download");
        let archive = write_archive(&settings);
        let catalog = MemoryCatalog::default();
        catalog.state.lock().unwrap().downloads.insert(
            9,
            ProductDownloadRecord {
                id: 9,
                id_product: Some(31),
                filename: "cafebabe".to_string(),
                display_filename: "old.zip".to_string(),
                date_add: 0,
                date_expiration: Some(EMPTY_DATE_SENTINEL.to_string()),
            },
        );

        publish(
            &catalog,
            &settings,
            &config(),
            PublishTarget::ProductDownload(9),
            &archive,
            None,
        )
        .await
        .unwrap();

        let record = catalog.state.lock().unwrap().downloads[&9].clone();
        assert_eq!(record.display_filename, "myapp.zip");
        assert!(record.date_add > 0);
        assert_eq!(record.date_expiration, None);

        std::fs::remove_dir_all(settings.workspace_dir).ok();
    }

    #[tokio::test]
    async fn test_real_expiration_survives_publish() {
        let settings = settings("expiry");
        let archive = write_archive(&settings);
        let catalog = MemoryCatalog::default();
        catalog.state.lock().unwrap().downloads.insert(
            9,
            ProductDownloadRecord {
                id: 9,
                id_product: Some(31),
                filename: "cafebabe".to_string(),
                display_filename: "old.zip".to_string(),
                date_add: 0,
                date_expiration: Some("2030-01-01 00:00:00".to_string()),
            },
        );

        publish(
            &catalog,
            &settings,
            &config(),
            PublishTarget::ProductDownload(9),
            &archive,
            None,
        )
        .await
        .unwrap();

        let record = catalog.state.lock().unwrap().downloads[&9].clone();
        assert_eq!(
            record.date_expiration.as_deref(),
            Some("2030-01-01 00:00:00")
        );

        std::fs::remove_dir_all(settings.workspace_dir).ok();
    }

    #[tokio::test]
    async fn test_download_without_product_is_record_not_found() {
        let settings = settings("orphan");
        let archive = write_archive(&settings);
        let catalog = MemoryCatalog::default();
        catalog.state.lock().unwrap().downloads.insert(
            9,
            ProductDownloadRecord {
                id: 9,
                id_product: None,
                filename: "cafebabe".to_string(),
                display_filename: String::new(),
                date_add: 0,
                date_expiration: None,
            },
        );

        let err = publish(
            &catalog,
            &settings,
            &config(),
            PublishTarget::ProductDownload(9),
            &archive,
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PublishError::RecordNotFound { .. }));

        std::fs::remove_dir_all(settings.workspace_dir).ok();
    }

    #[test]
    fn test_display_filename_composition() {
        assert_eq!(display_filename("myapp", Some("1.10.0")), "myapp-1.10.0.zip");
        assert_eq!(display_filename("myapp", None), "myapp.zip");
    }
}
