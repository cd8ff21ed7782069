//! Catalog browsing: filtered listing pages, autocomplete and the home overview

use crate::{
    error::AppResult,
    models::{
        catalog::{
            AppliedFilters, CatalogFilter, CatalogPage, CatalogQuery, HomeOverview, Pagination,
            SortKey,
        },
        enums::{Choice, Condition},
        item::{ItemShort, SearchSuggestion},
    },
    repository::Repository,
};

/// Minimum autocomplete term length, after trimming
pub const MIN_SUGGEST_CHARS: usize = 2;
pub const MAX_SUGGESTIONS: i64 = 10;
pub const HOME_LATEST_ITEMS: i64 = 6;
pub const HOME_POPULAR_COURSES: i64 = 5;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    page_size: i64,
}

impl CatalogService {
    pub fn new(repository: Repository, page_size: i64) -> Self {
        Self {
            repository,
            page_size: page_size.max(1),
        }
    }

    /// One page of unsold listings matching the query
    pub async fn browse(&self, query: &CatalogQuery) -> AppResult<CatalogPage> {
        let filter = CatalogFilter::from(query);
        let sort = SortKey::from_param(query.sort.as_deref());

        let total = self.repository.items.count(&filter).await?;
        let pagination = Pagination::resolve(query.page.as_deref(), total, self.page_size);

        let items = self
            .repository
            .items
            .list(&filter, sort, pagination.per_page, pagination.offset())
            .await?;
        let all_courses = self.repository.items.courses().await?;

        tracing::debug!(
            "Catalog page {}/{} with {} of {} listings",
            pagination.page,
            pagination.num_pages,
            items.len(),
            total
        );

        Ok(CatalogPage {
            items: items.iter().map(ItemShort::from).collect(),
            total_results: total,
            page: pagination.page,
            num_pages: pagination.num_pages,
            per_page: pagination.per_page,
            has_next: pagination.has_next(),
            has_previous: pagination.has_previous(),
            filters: AppliedFilters::new(query, sort),
            all_courses,
            conditions: Condition::ALL.into_iter().map(Choice::from).collect(),
        })
    }

    /// Autocomplete suggestions; terms shorter than two characters yield nothing
    pub async fn suggest(&self, term: Option<&str>) -> AppResult<Vec<SearchSuggestion>> {
        let term = term.map(str::trim).unwrap_or_default();
        if term.chars().count() < MIN_SUGGEST_CHARS {
            return Ok(Vec::new());
        }

        let items = self.repository.items.suggest(term, MAX_SUGGESTIONS).await?;
        Ok(items.iter().map(SearchSuggestion::from).collect())
    }

    /// Latest listings, market counters and most listed courses
    pub async fn home(&self) -> AppResult<HomeOverview> {
        let latest = self
            .repository
            .items
            .list(&CatalogFilter::default(), SortKey::Newest, HOME_LATEST_ITEMS, 0)
            .await?;
        let stats = self.repository.items.stats().await?;
        let popular_courses = self
            .repository
            .items
            .popular_courses(HOME_POPULAR_COURSES)
            .await?;

        Ok(HomeOverview {
            latest_items: latest.iter().map(ItemShort::from).collect(),
            stats,
            popular_courses,
        })
    }
}
