//! Tags the related catalog products with the detected version string.

use crate::catalog::{Catalog, CatalogError};
use crate::config::BundleConfig;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TagError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Upserts a custom feature value equal to `version` and relinks it to every
/// product related to this configuration.
///
/// The existing feature/product link is deleted before the fresh one is
/// inserted, so a product carries exactly one value for the version feature
/// at all times, whatever it pointed at before. No-op when the installation
/// has no version feature configured or the scope has no related products.
pub async fn tag_version<C>(
    catalog: &C,
    config: &BundleConfig,
    version: &str,
) -> Result<(), TagError>
where
    C: Catalog + ?Sized,
{
    let Some(id_feature) = catalog.version_feature().await? else {
        debug!("no version feature configured; skipping tagging");
        return Ok(());
    };

    let products = catalog.related_product_ids(config).await?;
    if products.is_empty() {
        return Ok(());
    }

    let languages = catalog.language_ids().await?;

    for id_product in products {
        let id_value = match catalog.find_custom_feature_value(id_feature, version).await? {
            Some(id) => id,
            // The value text is replicated across every active language.
            None => {
                catalog
                    .create_custom_feature_value(id_feature, version, &languages)
                    .await?
            }
        };

        catalog
            .delete_feature_product_link(id_feature, id_product)
            .await?;
        catalog
            .insert_feature_product_link(id_feature, id_product, id_value)
            .await?;

        debug!(id_product, id_feature_value = id_value, "version link refreshed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::MemoryCatalog;
    use crate::config::{BundleConfig, SourceKind};

    fn config() -> BundleConfig {
        BundleConfig {
            kind: SourceKind::Git,
            source_url: "https://example.com/repo.git".to_string(),
            source_login: None,
            source_password: None,
            source_folder: None,
            zip_folder: None,
            zip_basename: None,
            id_attachment: Some(1),
            id_product_download: None,
        }
    }

    fn catalog_with_feature() -> MemoryCatalog {
        let catalog = MemoryCatalog::default();
        {
            let mut state = catalog.state.lock().unwrap();
            state.version_feature = Some(5);
            state.related_products = vec![31];
            state.languages = vec![1, 2];
        }
        catalog
    }

    #[tokio::test]
    async fn test_noop_without_version_feature() {
        let catalog = MemoryCatalog::default();
        tag_version(&catalog, &config(), "1.0").await.unwrap();
        assert!(catalog.state.lock().unwrap().feature_values.is_empty());
    }

    #[tokio::test]
    async fn test_value_created_across_all_languages() {
        let catalog = catalog_with_feature();
        tag_version(&catalog, &config(), "1.0").await.unwrap();

        let state = catalog.state.lock().unwrap();
        assert_eq!(state.feature_values.len(), 1);
        assert_eq!(state.feature_values[0].value, "1.0");
        assert_eq!(state.feature_values[0].id_langs, vec![1, 2]);
        assert_eq!(state.feature_links.len(), 1);
    }

    #[tokio::test]
    async fn test_retag_replaces_the_link() {
        let catalog = catalog_with_feature();
        tag_version(&catalog, &config(), "1.0").await.unwrap();
        tag_version(&catalog, &config(), "2.0").await.unwrap();

        let state = catalog.state.lock().unwrap();
        // Both values exist, but the product holds exactly one link and it
        // points at the newer value.
        assert_eq!(state.feature_values.len(), 2);
        assert_eq!(state.feature_links.len(), 1);
        let newer = state
            .feature_values
            .iter()
            .find(|row| row.value == "2.0")
            .unwrap();
        assert_eq!(state.feature_links[0].id_feature_value, newer.id);
        assert_eq!(state.feature_links[0].id_product, 31);
    }

    #[tokio::test]
    async fn test_retag_same_version_reuses_the_value() {
        let catalog = catalog_with_feature();
        tag_version(&catalog, &config(), "1.0").await.unwrap();
        tag_version(&catalog, &config(), "1.0").await.unwrap();

        let state = catalog.state.lock().unwrap();
        assert_eq!(state.feature_values.len(), 1);
        assert_eq!(state.feature_links.len(), 1);
    }

    #[tokio::test]
    async fn test_every_related_product_is_linked() {
        let catalog = catalog_with_feature();
        catalog.state.lock().unwrap().related_products = vec![31, 32, 33];

        tag_version(&catalog, &config(), "3.1").await.unwrap();

        let state = catalog.state.lock().unwrap();
        assert_eq!(state.feature_values.len(), 1);
        assert_eq!(state.feature_links.len(), 3);
    }
}
