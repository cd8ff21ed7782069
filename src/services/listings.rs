//! Listing lifecycle: posting, viewing and marking as sold

use crate::{
    error::{AppError, AppResult},
    models::{
        catalog::PostFormOptions,
        item::{Item, ItemDetail, ItemForm, ItemShort},
    },
    repository::Repository,
    services::images::{ImageProcessor, ImageUpload, MediaStorage, ProcessOutcome},
};

/// Maximum number of related and same-seller listings on a detail page
pub const DETAIL_SIDEBAR_ITEMS: i64 = 3;

#[derive(Clone)]
pub struct ListingsService {
    repository: Repository,
    media: MediaStorage,
    images: ImageProcessor,
}

impl ListingsService {
    pub fn new(repository: Repository, media: MediaStorage) -> Self {
        Self {
            repository,
            media,
            images: ImageProcessor::default(),
        }
    }

    pub fn form_options(&self) -> PostFormOptions {
        PostFormOptions::default()
    }

    /// Validate and store a new listing.
    ///
    /// The photo is written before the record and removed again if the insert
    /// fails. Post-processing runs once the listing exists; a failure there is
    /// logged and the listing is kept with the original file.
    pub async fn create(&self, form: ItemForm, upload: Option<ImageUpload>) -> AppResult<Item> {
        let mut new_item = form.into_new_item(None)?;

        if let Some(ref upload) = upload {
            new_item.image = Some(self.media.save(upload).await?);
        }

        let item = match self.repository.items.create(&new_item).await {
            Ok(item) => item,
            Err(e) => {
                if let Some(ref image) = new_item.image {
                    self.media.remove(image).await;
                }
                return Err(e);
            }
        };

        tracing::info!("Listing {} posted by {}", item.id, item.seller_name);

        if let Some(ref image) = item.image {
            match self.images.process(self.media.path_of(image)).await {
                Ok(ProcessOutcome::Resized { width, height }) => {
                    tracing::debug!("Resized {} to {}x{}", image, width, height);
                }
                Ok(ProcessOutcome::Unchanged { .. }) => {}
                Err(e) => {
                    tracing::warn!("Could not post-process image {}: {}", image, e);
                }
            }
        }

        Ok(item)
    }

    /// Count one view and return the updated listing
    pub async fn visit(&self, id: i64) -> AppResult<Item> {
        self.repository
            .items
            .increment_views(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    /// Detail page: counts a view, then gathers related and same-seller listings
    pub async fn detail(&self, id: i64) -> AppResult<ItemDetail> {
        let item = self.visit(id).await?;

        let related = self
            .repository
            .items
            .related(&item, DETAIL_SIDEBAR_ITEMS)
            .await?;
        let others = self
            .repository
            .items
            .by_seller(&item.seller_name, item.id, DETAIL_SIDEBAR_ITEMS)
            .await?;

        Ok(ItemDetail {
            contact_type: item.contact_type(),
            url: item.url(),
            related_items: related.iter().map(ItemShort::from).collect(),
            other_items: others.iter().map(ItemShort::from).collect(),
            item,
        })
    }

    /// Mark a listing sold; it disappears from every catalog view
    pub async fn mark_sold(&self, id: i64) -> AppResult<Item> {
        let item = self
            .repository
            .items
            .mark_sold(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))?;

        tracing::info!("Listing {} marked as sold", item.id);
        Ok(item)
    }
}
