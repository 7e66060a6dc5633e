//! Read path for the gallery

use cartoonist_common::Pagination;
use cartoonist_storage::PublicUrlResolver;
use serde::Serialize;

use super::error::PipelineError;
use crate::repository::cartoons::{count_tx, list_recent_tx};
use crate::repository::CartoonRepository;

/// One gallery entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryItem {
    pub id: i64,
    pub key: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryPage {
    pub items: Vec<GalleryItem>,
    pub total: i64,
}

/// Lists catalogued cartoons, newest first
#[derive(Clone)]
pub struct GalleryReader {
    catalog: CartoonRepository,
    urls: PublicUrlResolver,
}

impl GalleryReader {
    pub fn new(catalog: CartoonRepository, urls: PublicUrlResolver) -> Self {
        Self { catalog, urls }
    }

    /// Items and `total` come from one read transaction, so a concurrent
    /// insert shows up in both or neither.
    pub async fn list_recent(&self, page: Pagination) -> Result<GalleryPage, PipelineError> {
        let read_error = |e: sqlx::Error| PipelineError::MetadataRead(e.to_string());

        let mut tx = self.catalog.begin().await.map_err(read_error)?;
        let records = list_recent_tx(&mut tx, page.limit(), page.offset())
            .await
            .map_err(read_error)?;
        let total = count_tx(&mut tx).await.map_err(read_error)?;
        tx.commit().await.map_err(read_error)?;

        let items = records
            .into_iter()
            .map(|record| GalleryItem {
                url: self.urls.resolve(&record.key),
                id: record.id,
                key: record.key,
            })
            .collect();

        Ok(GalleryPage { items, total })
    }
}
