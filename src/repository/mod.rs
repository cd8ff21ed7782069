//! Repository layer: the listing store behind a trait, with PostgreSQL and
//! in-memory implementations.

pub mod items;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;

use crate::{
    config::DatabaseConfig,
    error::AppResult,
    models::{
        catalog::{CatalogFilter, CourseCount, MarketStats, SortKey},
        item::{Item, NewItem},
    },
};

/// URL scheme selecting the in-memory store
pub const MEMORY_URL_SCHEME: &str = "memory:";

/// Persistent record store for listings. Listings are never deleted.
///
/// Every catalog read (`count`, `list`, `courses`, `suggest`, `stats`,
/// `popular_courses`, `related`, `by_seller`) only sees unsold listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Check the backing store is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Insert a listing; `date_posted` is now, `is_sold` false, `view_count` 0
    async fn create(&self, item: &NewItem) -> AppResult<Item>;

    async fn get(&self, id: i64) -> AppResult<Option<Item>>;

    /// Atomically add one view and return the updated listing
    async fn increment_views(&self, id: i64) -> AppResult<Option<Item>>;

    /// Set `is_sold` and return the updated listing
    async fn mark_sold(&self, id: i64) -> AppResult<Option<Item>>;

    async fn count(&self, filter: &CatalogFilter) -> AppResult<i64>;

    async fn list(
        &self,
        filter: &CatalogFilter,
        sort: SortKey,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Item>>;

    /// Distinct non-empty course values, sorted ascending
    async fn courses(&self) -> AppResult<Vec<String>>;

    /// Name, course or author contains `term` (case-insensitive), newest first
    async fn suggest(&self, term: &str, limit: i64) -> AppResult<Vec<Item>>;

    async fn stats(&self) -> AppResult<MarketStats>;

    /// Courses by number of listings, descending
    async fn popular_courses(&self, limit: i64) -> AppResult<Vec<CourseCount>>;

    /// Listings sharing the item's course (when set) or type, excluding the item
    async fn related(&self, item: &Item, limit: i64) -> AppResult<Vec<Item>>;

    /// Other listings by the same seller name
    async fn by_seller(&self, seller_name: &str, exclude_id: i64, limit: i64) -> AppResult<Vec<Item>>;
}

/// Main repository struct holding the listing store
#[derive(Clone)]
pub struct Repository {
    pub items: Arc<dyn ItemStore>,
}

impl Repository {
    pub fn new(items: Arc<dyn ItemStore>) -> Self {
        Self { items }
    }

    /// Repository backed by PostgreSQL
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::new(Arc::new(items::PgItemStore::new(pool)))
    }

    /// Repository backed by process memory; contents are lost on restart
    pub fn in_memory() -> Self {
        Self::new(Arc::new(memory::MemoryItemStore::new()))
    }

    /// Connect according to configuration, running migrations for PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        if config.url.starts_with(MEMORY_URL_SCHEME) {
            tracing::warn!("Using in-memory item store, listings will not survive a restart");
            return Ok(Self::in_memory());
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("Database migrations completed");

        Ok(Self::postgres(pool))
    }
}
