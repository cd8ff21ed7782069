//! Business logic services

pub mod catalog;
pub mod images;
pub mod listings;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub listings: listings::ListingsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), config.catalog.page_size),
            listings: listings::ListingsService::new(
                repository.clone(),
                images::MediaStorage::new(config.media.root.clone()),
            ),
            repository,
        }
    }

    /// Readiness probe: the listing store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.items.ping().await
    }
}
