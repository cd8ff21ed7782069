//! Items repository for PostgreSQL.
//!
//! Catalog filters are appended with `QueryBuilder` and bound parameters; sort
//! order comes from the fixed set of [`SortKey`] clauses.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::{
        catalog::{like_pattern, CatalogFilter, ConditionFilter, CourseCount, MarketStats, SortKey},
        item::{Item, NewItem},
    },
};

use super::ItemStore;

const ITEM_COLUMNS: &str = "id, item_name, description, price, seller_name, contact_info, image, \
                            item_type, author, course, condition, date_posted, is_sold, view_count";

/// Append the WHERE clause for unsold listings matching `filter`
pub(crate) fn push_catalog_where(builder: &mut QueryBuilder<'_, Postgres>, filter: &CatalogFilter) {
    builder.push(" WHERE is_sold = FALSE");

    if let Some(ref search) = filter.search {
        let pattern = like_pattern(search);
        builder.push(" AND (item_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR author ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR course ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR seller_name ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    if let Some(item_type) = filter.item_type {
        builder.push(" AND item_type = ");
        builder.push_bind(item_type);
    }

    if let Some(ref course) = filter.course {
        builder.push(" AND course ILIKE ");
        builder.push_bind(like_pattern(course));
    }

    match filter.condition {
        Some(ConditionFilter::Is(condition)) => {
            builder.push(" AND condition = ");
            builder.push_bind(condition);
        }
        Some(ConditionFilter::Unknown) => {
            builder.push(" AND FALSE");
        }
        None => {}
    }
}

#[derive(Clone)]
pub struct PgItemStore {
    pool: Pool<Postgres>,
}

impl PgItemStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemStore for PgItemStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    async fn create(&self, item: &NewItem) -> AppResult<Item> {
        let query = format!(
            r#"
            INSERT INTO items (
                item_name, description, price, seller_name, contact_info, image,
                item_type, author, course, condition
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );

        let created = sqlx::query_as::<_, Item>(&query)
            .bind(&item.item_name)
            .bind(&item.description)
            .bind(item.price)
            .bind(&item.seller_name)
            .bind(&item.contact_info)
            .bind(&item.image)
            .bind(item.item_type)
            .bind(&item.author)
            .bind(&item.course)
            .bind(item.condition)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn increment_views(&self, id: i64) -> AppResult<Option<Item>> {
        let query = format!(
            "UPDATE items SET view_count = view_count + 1 WHERE id = $1 RETURNING {}",
            ITEM_COLUMNS
        );
        let item = sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn mark_sold(&self, id: i64) -> AppResult<Option<Item>> {
        let query = format!(
            "UPDATE items SET is_sold = TRUE WHERE id = $1 RETURNING {}",
            ITEM_COLUMNS
        );
        let item = sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    // =========================================================================
    // READ
    // =========================================================================

    async fn get(&self, id: i64) -> AppResult<Option<Item>> {
        let query = format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS);
        let item = sqlx::query_as::<_, Item>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn count(&self, filter: &CatalogFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_catalog_where(&mut builder, filter);

        let total: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn list(
        &self,
        filter: &CatalogFilter,
        sort: SortKey,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Item>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM items", ITEM_COLUMNS));
        push_catalog_where(&mut builder, filter);
        builder.push(" ORDER BY ");
        builder.push(sort.order_by_sql());
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let items = builder
            .build_query_as::<Item>()
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn courses(&self) -> AppResult<Vec<String>> {
        let courses = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT course FROM items
            WHERE is_sold = FALSE AND course IS NOT NULL AND course <> ''
            ORDER BY course
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn suggest(&self, term: &str, limit: i64) -> AppResult<Vec<Item>> {
        let query = format!(
            r#"
            SELECT {} FROM items
            WHERE is_sold = FALSE
              AND (item_name ILIKE $1 OR course ILIKE $1 OR author ILIKE $1)
            ORDER BY {}
            LIMIT $2
            "#,
            ITEM_COLUMNS,
            SortKey::Newest.order_by_sql()
        );
        let items = sqlx::query_as::<_, Item>(&query)
            .bind(like_pattern(term))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn stats(&self) -> AppResult<MarketStats> {
        let stats = sqlx::query_as::<_, MarketStats>(
            r#"
            SELECT COUNT(*) AS total_items,
                   COUNT(*) FILTER (WHERE item_type = 'book') AS total_books,
                   COUNT(*) FILTER (WHERE item_type = 'notes') AS total_notes,
                   COUNT(DISTINCT seller_name) AS total_sellers
            FROM items
            WHERE is_sold = FALSE
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn popular_courses(&self, limit: i64) -> AppResult<Vec<CourseCount>> {
        let courses = sqlx::query_as::<_, CourseCount>(
            r#"
            SELECT course, COUNT(*) AS count
            FROM items
            WHERE is_sold = FALSE AND course IS NOT NULL AND course <> ''
            GROUP BY course
            ORDER BY count DESC, course ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    async fn related(&self, item: &Item, limit: i64) -> AppResult<Vec<Item>> {
        // course = NULL never matches, so listings without a course relate by type only
        let query = format!(
            r#"
            SELECT {} FROM items
            WHERE is_sold = FALSE AND id <> $1
              AND (course = $2 OR item_type = $3)
            ORDER BY {}
            LIMIT $4
            "#,
            ITEM_COLUMNS,
            SortKey::Newest.order_by_sql()
        );
        let items = sqlx::query_as::<_, Item>(&query)
            .bind(item.id)
            .bind(&item.course)
            .bind(item.item_type)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn by_seller(&self, seller_name: &str, exclude_id: i64, limit: i64) -> AppResult<Vec<Item>> {
        let query = format!(
            r#"
            SELECT {} FROM items
            WHERE is_sold = FALSE AND seller_name = $1 AND id <> $2
            ORDER BY {}
            LIMIT $3
            "#,
            ITEM_COLUMNS,
            SortKey::Newest.order_by_sql()
        );
        let items = sqlx::query_as::<_, Item>(&query)
            .bind(seller_name)
            .bind(exclude_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{Condition, ItemType};

    #[test]
    fn test_where_without_filters_only_excludes_sold() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_catalog_where(&mut builder, &CatalogFilter::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM items WHERE is_sold = FALSE");
    }

    #[test]
    fn test_where_with_all_filters_binds_parameters() {
        let filter = CatalogFilter {
            search: Some("calc".into()),
            item_type: Some(ItemType::Book),
            course: Some("MATH".into()),
            condition: Some(ConditionFilter::Is(Condition::Good)),
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_catalog_where(&mut builder, &filter);
        let sql = builder.sql();

        assert!(sql.contains("(item_name ILIKE $1 OR author ILIKE $2 OR course ILIKE $3 OR description ILIKE $4 OR seller_name ILIKE $5)"));
        assert!(sql.contains("item_type = $6"));
        assert!(sql.contains("course ILIKE $7"));
        assert!(sql.contains("condition = $8"));
        assert!(!sql.contains("calc"));
    }

    #[test]
    fn test_where_with_unknown_condition_matches_nothing() {
        let filter = CatalogFilter {
            condition: Some(ConditionFilter::parse("mint")),
            ..Default::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM items");
        push_catalog_where(&mut builder, &filter);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM items WHERE is_sold = FALSE AND FALSE"
        );
    }
}
