//! Catalog query parameters, their normalized filter form, sorting and pagination.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::enums::{Choice, Condition, ItemType};
use super::item::{Item, ItemShort};

/// Number of listings per catalog page
pub const DEFAULT_PAGE_SIZE: i64 = 12;

/// Raw query parameters of `GET /items/`. Everything arrives as text and is
/// normalized by [`CatalogFilter::from`], [`SortKey::from_param`] and [`Pagination::resolve`].
#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Free text matched against name, author, course, description and seller
    pub search: Option<String>,
    /// `book` or `notes`; other values are ignored
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    /// Course code substring
    pub course: Option<String>,
    /// `excellent`, `good`, `fair` or `poor`
    pub condition: Option<String>,
    /// `-date_posted` (default), `price`, `-price`, `item_name`, `-view_count`
    pub sort: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Normalized catalog filter. Sold listings are always excluded by the stores.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub item_type: Option<ItemType>,
    pub course: Option<String>,
    pub condition: Option<ConditionFilter>,
}

/// Requested condition. A value that is not a known condition still filters,
/// and matches no listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionFilter {
    Is(Condition),
    Unknown,
}

impl ConditionFilter {
    pub fn parse(code: &str) -> Self {
        Condition::from_code(code).map_or(ConditionFilter::Unknown, ConditionFilter::Is)
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl From<&CatalogQuery> for CatalogFilter {
    fn from(query: &CatalogQuery) -> Self {
        Self {
            search: trimmed(&query.search),
            item_type: trimmed(&query.item_type).and_then(|t| ItemType::from_code(&t)),
            course: trimmed(&query.course),
            condition: trimmed(&query.condition).map(|c| ConditionFilter::parse(&c)),
        }
    }
}

/// Case-insensitive substring test
pub fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl CatalogFilter {
    /// Whether an item belongs to the filtered catalog (in-process evaluation)
    pub fn matches(&self, item: &Item) -> bool {
        if item.is_sold {
            return false;
        }

        if let Some(ref search) = self.search {
            let term = search.to_lowercase();
            let optional = |v: &Option<String>| v.as_deref().is_some_and(|s| contains_ci(s, &term));
            let hit = contains_ci(&item.item_name, &term)
                || optional(&item.author)
                || optional(&item.course)
                || contains_ci(&item.description, &term)
                || contains_ci(&item.seller_name, &term);
            if !hit {
                return false;
            }
        }

        if let Some(item_type) = self.item_type {
            if item.item_type != item_type {
                return false;
            }
        }

        if let Some(ref course) = self.course {
            let term = course.to_lowercase();
            if !item.course.as_deref().is_some_and(|c| contains_ci(c, &term)) {
                return false;
            }
        }

        match self.condition {
            Some(ConditionFilter::Is(condition)) if item.condition != condition => return false,
            Some(ConditionFilter::Unknown) => return false,
            _ => {}
        }

        true
    }
}

/// Escape `%`, `_` and `\` and wrap in `%` for an ILIKE substring match
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Catalog sort order. Ties always break on id, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum SortKey {
    #[default]
    #[serde(rename = "-date_posted")]
    Newest,
    #[serde(rename = "price")]
    PriceAsc,
    #[serde(rename = "-price")]
    PriceDesc,
    #[serde(rename = "item_name")]
    Name,
    #[serde(rename = "-view_count")]
    MostViewed,
}

impl SortKey {
    /// Unknown or missing keys fall back to newest first
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("price") => SortKey::PriceAsc,
            Some("-price") => SortKey::PriceDesc,
            Some("item_name") => SortKey::Name,
            Some("-view_count") => SortKey::MostViewed,
            _ => SortKey::Newest,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortKey::Newest => "-date_posted",
            SortKey::PriceAsc => "price",
            SortKey::PriceDesc => "-price",
            SortKey::Name => "item_name",
            SortKey::MostViewed => "-view_count",
        }
    }

    /// ORDER BY clause body for the items table
    pub fn order_by_sql(&self) -> &'static str {
        match self {
            SortKey::Newest => "date_posted DESC, id DESC",
            SortKey::PriceAsc => "price ASC, id DESC",
            SortKey::PriceDesc => "price DESC, id DESC",
            SortKey::Name => "LOWER(item_name) ASC, id DESC",
            SortKey::MostViewed => "view_count DESC, id DESC",
        }
    }

    /// Comparator equivalent to [`SortKey::order_by_sql`]. Names compare
    /// lowercased on both sides so the order does not depend on collation.
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        let primary = match self {
            SortKey::Newest => b.date_posted.cmp(&a.date_posted),
            SortKey::PriceAsc => a.price.cmp(&b.price),
            SortKey::PriceDesc => b.price.cmp(&a.price),
            SortKey::Name => a.item_name.to_lowercase().cmp(&b.item_name.to_lowercase()),
            SortKey::MostViewed => b.view_count.cmp(&a.view_count),
        };
        primary.then_with(|| b.id.cmp(&a.id))
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Resolved page window over a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
}

impl Pagination {
    /// Resolve a requested page like a forgiving paginator: a missing or non-numeric
    /// page gives page 1, a page outside `1..=num_pages` gives the last page.
    pub fn resolve(requested: Option<&str>, total: i64, per_page: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let num_pages = ((total + per_page - 1) / per_page).max(1);

        let page = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if (1..=num_pages).contains(&n) => n,
            Some(Ok(_)) => num_pages,
            _ => 1,
        };

        Self {
            page,
            num_pages,
            per_page,
            total,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Echo of the filters actually applied, for re-populating the filter form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AppliedFilters {
    pub search: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub course: String,
    pub condition: String,
    pub sort: SortKey,
}

impl AppliedFilters {
    pub fn new(query: &CatalogQuery, sort: SortKey) -> Self {
        Self {
            search: trimmed(&query.search).unwrap_or_default(),
            item_type: trimmed(&query.item_type).unwrap_or_default(),
            course: trimmed(&query.course).unwrap_or_default(),
            condition: trimmed(&query.condition).unwrap_or_default(),
            sort,
        }
    }
}

/// One page of the catalog plus what the filter UI needs
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogPage {
    pub items: Vec<ItemShort>,
    /// Number of listings matching the filters, across all pages
    pub total_results: i64,
    pub page: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub filters: AppliedFilters,
    /// Distinct non-empty courses of unsold listings, sorted
    pub all_courses: Vec<String>,
    pub conditions: Vec<Choice>,
}

/// Counters shown on the home page, over unsold listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MarketStats {
    pub total_items: i64,
    pub total_books: i64,
    pub total_notes: i64,
    pub total_sellers: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseCount {
    pub course: String,
    pub count: i64,
}

/// Home page payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HomeOverview {
    pub latest_items: Vec<ItemShort>,
    pub stats: MarketStats,
    pub popular_courses: Vec<CourseCount>,
}

/// Choices for the post form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostFormOptions {
    pub item_types: Vec<Choice>,
    pub conditions: Vec<Choice>,
}

impl Default for PostFormOptions {
    fn default() -> Self {
        Self {
            item_types: ItemType::ALL.into_iter().map(Choice::from).collect(),
            conditions: Condition::ALL.into_iter().map(Choice::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    fn item(id: i64, name: &str, price: i64) -> Item {
        Item {
            id,
            item_name: name.to_string(),
            description: "Clean copy".to_string(),
            price: Decimal::new(price, 2),
            seller_name: "Ada".to_string(),
            contact_info: "ada@uni.edu".to_string(),
            image: None,
            item_type: ItemType::Book,
            author: Some("James Stewart".to_string()),
            course: Some("MATH 101".to_string()),
            condition: Condition::Good,
            date_posted: Utc::now() - Duration::minutes(id),
            is_sold: false,
            view_count: 0,
        }
    }

    fn query(pairs: &[(&str, &str)]) -> CatalogQuery {
        let mut q = CatalogQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "search" => q.search = v,
                "type" => q.item_type = v,
                "course" => q.course = v,
                "condition" => q.condition = v,
                "sort" => q.sort = v,
                "page" => q.page = v,
                _ => {}
            }
        }
        q
    }

    #[test]
    fn test_filter_normalization() {
        let filter = CatalogFilter::from(&query(&[
            ("search", "  calc "),
            ("type", "video"),
            ("course", ""),
            ("condition", "fair"),
        ]));
        assert_eq!(filter.search.as_deref(), Some("calc"));
        assert_eq!(filter.item_type, None);
        assert_eq!(filter.course, None);
        assert_eq!(filter.condition, Some(ConditionFilter::Is(Condition::Fair)));
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let it = item(1, "Linear Algebra", 100);
        for term in ["linear", "STEWART", "math 1", "clean", "ada"] {
            let filter = CatalogFilter {
                search: Some(term.to_string()),
                ..Default::default()
            };
            assert!(filter.matches(&it), "{} should match", term);
        }
        let filter = CatalogFilter {
            search: Some("physics".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&it));
    }

    #[test]
    fn test_sold_items_never_match() {
        let mut it = item(1, "Linear Algebra", 100);
        it.is_sold = true;
        assert!(!CatalogFilter::default().matches(&it));
    }

    #[test]
    fn test_course_and_condition_filters() {
        let it = item(1, "Linear Algebra", 100);
        let course = CatalogFilter {
            course: Some("math".to_string()),
            ..Default::default()
        };
        assert!(course.matches(&it));

        let condition = CatalogFilter {
            condition: Some(ConditionFilter::Is(Condition::Poor)),
            ..Default::default()
        };
        assert!(!condition.matches(&it));

        let unknown = CatalogFilter {
            condition: Some(ConditionFilter::parse("mint")),
            ..Default::default()
        };
        assert_eq!(unknown.condition, Some(ConditionFilter::Unknown));
        assert!(!unknown.matches(&it));

        let mut no_course = item(2, "Notes", 100);
        no_course.course = None;
        assert!(!course.matches(&no_course));
    }

    #[test]
    fn test_sort_key_fallback() {
        assert_eq!(SortKey::from_param(None), SortKey::Newest);
        assert_eq!(SortKey::from_param(Some("price")), SortKey::PriceAsc);
        assert_eq!(SortKey::from_param(Some("-price")), SortKey::PriceDesc);
        assert_eq!(SortKey::from_param(Some("item_name")), SortKey::Name);
        assert_eq!(SortKey::from_param(Some("-view_count")), SortKey::MostViewed);
        assert_eq!(SortKey::from_param(Some("drop table")), SortKey::Newest);
        assert_eq!(SortKey::PriceDesc.as_param(), "-price");
    }

    #[test]
    fn test_sort_compare_price_ascending() {
        let mut items = vec![item(1, "a", 300), item(2, "b", 100), item(3, "c", 200)];
        items.sort_by(|a, b| SortKey::PriceAsc.compare(a, b));
        let prices: Vec<_> = items.iter().map(|i| i.price).collect();
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_sort_compare_newest_first() {
        let mut items = vec![item(3, "a", 1), item(1, "b", 1), item(2, "c", 1)];
        items.sort_by(|a, b| SortKey::Newest.compare(a, b));
        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let mut items = vec![item(1, "banana", 1), item(2, "Cherry", 1), item(3, "apple", 1), item(4, "Apple", 1)];
        items.sort_by(|a, b| SortKey::Name.compare(a, b));
        let names: Vec<_> = items.iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "apple", "banana", "Cherry"]);
        assert!(SortKey::Name.order_by_sql().starts_with("LOWER(item_name)"));
    }

    #[test]
    fn test_pagination_resolve() {
        let p = Pagination::resolve(None, 30, 12);
        assert_eq!((p.page, p.num_pages, p.offset()), (1, 3, 0));
        assert!(p.has_next());
        assert!(!p.has_previous());

        let p = Pagination::resolve(Some("abc"), 30, 12);
        assert_eq!(p.page, 1);

        let p = Pagination::resolve(Some("9"), 30, 12);
        assert_eq!((p.page, p.offset()), (3, 24));

        let p = Pagination::resolve(Some("0"), 30, 12);
        assert_eq!(p.page, 3);

        let p = Pagination::resolve(Some("2"), 0, 12);
        assert_eq!((p.page, p.num_pages), (1, 1));
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_applied_filters_echo() {
        let q = query(&[("search", " calc "), ("sort", "bogus")]);
        let applied = AppliedFilters::new(&q, SortKey::from_param(q.sort.as_deref()));
        assert_eq!(applied.search, "calc");
        assert_eq!(applied.sort, SortKey::Newest);
    }
}
