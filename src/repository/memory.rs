//! In-memory item store, used for local runs without PostgreSQL and in tests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{
        catalog::{contains_ci, CatalogFilter, CourseCount, MarketStats, SortKey},
        enums::ItemType,
        item::{Item, NewItem},
    },
};

use super::ItemStore;

#[derive(Default)]
struct State {
    next_id: i64,
    items: BTreeMap<i64, Item>,
}

#[derive(Default)]
pub struct MemoryItemStore {
    state: RwLock<State>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unsold listings passing `keep`, in `sort` order, windowed by `offset`/`limit`
    async fn select<F>(&self, keep: F, sort: SortKey, limit: i64, offset: i64) -> Vec<Item>
    where
        F: Fn(&Item) -> bool,
    {
        let state = self.state.read().await;
        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| !item.is_sold && keep(*item))
            .cloned()
            .collect();
        items.sort_by(|a, b| sort.compare(a, b));
        items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect()
    }

    async fn update<F>(&self, id: i64, change: F) -> Option<Item>
    where
        F: FnOnce(&mut Item),
    {
        let mut state = self.state.write().await;
        state.items.get_mut(&id).map(|item| {
            change(item);
            item.clone()
        })
    }
}

fn non_empty_course(item: &Item) -> Option<&str> {
    item.course.as_deref().filter(|c| !c.is_empty())
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn create(&self, new: &NewItem) -> AppResult<Item> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let item = Item {
            id: state.next_id,
            item_name: new.item_name.clone(),
            description: new.description.clone(),
            price: new.price,
            seller_name: new.seller_name.clone(),
            contact_info: new.contact_info.clone(),
            image: new.image.clone(),
            item_type: new.item_type,
            author: new.author.clone(),
            course: new.course.clone(),
            condition: new.condition,
            date_posted: Utc::now(),
            is_sold: false,
            view_count: 0,
        };
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Item>> {
        Ok(self.state.read().await.items.get(&id).cloned())
    }

    async fn increment_views(&self, id: i64) -> AppResult<Option<Item>> {
        Ok(self.update(id, |item| item.view_count += 1).await)
    }

    async fn mark_sold(&self, id: i64) -> AppResult<Option<Item>> {
        Ok(self.update(id, |item| item.is_sold = true).await)
    }

    async fn count(&self, filter: &CatalogFilter) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.items.values().filter(|item| filter.matches(item)).count() as i64)
    }

    async fn list(
        &self,
        filter: &CatalogFilter,
        sort: SortKey,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Item>> {
        Ok(self.select(|item| filter.matches(item), sort, limit, offset).await)
    }

    async fn courses(&self) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        let courses: BTreeSet<String> = state
            .items
            .values()
            .filter(|item| !item.is_sold)
            .filter_map(non_empty_course)
            .map(str::to_string)
            .collect();
        Ok(courses.into_iter().collect())
    }

    async fn suggest(&self, term: &str, limit: i64) -> AppResult<Vec<Item>> {
        let term = term.to_lowercase();
        let hit = |v: &Option<String>| v.as_deref().is_some_and(|s| contains_ci(s, &term));
        Ok(self
            .select(
                |item| contains_ci(&item.item_name, &term) || hit(&item.course) || hit(&item.author),
                SortKey::Newest,
                limit,
                0,
            )
            .await)
    }

    async fn stats(&self) -> AppResult<MarketStats> {
        let state = self.state.read().await;
        let mut stats = MarketStats::default();
        let mut sellers = HashSet::new();
        for item in state.items.values().filter(|item| !item.is_sold) {
            stats.total_items += 1;
            match item.item_type {
                ItemType::Book => stats.total_books += 1,
                ItemType::Notes => stats.total_notes += 1,
            }
            sellers.insert(item.seller_name.as_str());
        }
        stats.total_sellers = sellers.len() as i64;
        Ok(stats)
    }

    async fn popular_courses(&self, limit: i64) -> AppResult<Vec<CourseCount>> {
        let state = self.state.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for course in state
            .items
            .values()
            .filter(|item| !item.is_sold)
            .filter_map(non_empty_course)
        {
            *counts.entry(course).or_default() += 1;
        }

        let mut courses: Vec<CourseCount> = counts
            .into_iter()
            .map(|(course, count)| CourseCount {
                course: course.to_string(),
                count,
            })
            .collect();
        courses.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.course.cmp(&b.course)));
        courses.truncate(limit.max(0) as usize);
        Ok(courses)
    }

    async fn related(&self, item: &Item, limit: i64) -> AppResult<Vec<Item>> {
        let id = item.id;
        let course = item.course.clone();
        let item_type = item.item_type;
        Ok(self
            .select(
                |other| {
                    other.id != id
                        && ((course.is_some() && other.course == course) || other.item_type == item_type)
                },
                SortKey::Newest,
                limit,
                0,
            )
            .await)
    }

    async fn by_seller(&self, seller_name: &str, exclude_id: i64, limit: i64) -> AppResult<Vec<Item>> {
        Ok(self
            .select(
                |other| other.id != exclude_id && other.seller_name == seller_name,
                SortKey::Newest,
                limit,
                0,
            )
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Condition;
    use rust_decimal::Decimal;

    fn new_item(name: &str, price: i64, course: Option<&str>, item_type: ItemType, seller: &str) -> NewItem {
        NewItem {
            item_name: name.to_string(),
            description: "Good copy".to_string(),
            price: Decimal::new(price, 2),
            seller_name: seller.to_string(),
            contact_info: "0700 000".to_string(),
            image: None,
            item_type,
            author: None,
            course: course.map(str::to_string),
            condition: Condition::Good,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_defaults() {
        let store = MemoryItemStore::new();
        let a = store.create(&new_item("A", 100, None, ItemType::Book, "Ada")).await.unwrap();
        let b = store.create(&new_item("B", 100, None, ItemType::Book, "Ada")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert!(!a.is_sold);
        assert_eq!(a.view_count, 0);
        assert_eq!(store.get(2).await.unwrap(), Some(b));
        assert_eq!(store.get(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_and_mark_sold() {
        let store = MemoryItemStore::new();
        let a = store.create(&new_item("A", 100, None, ItemType::Book, "Ada")).await.unwrap();

        store.increment_views(a.id).await.unwrap();
        let viewed = store.increment_views(a.id).await.unwrap().unwrap();
        assert_eq!(viewed.view_count, 2);

        let sold = store.mark_sold(a.id).await.unwrap().unwrap();
        assert!(sold.is_sold);
        assert_eq!(store.count(&CatalogFilter::default()).await.unwrap(), 0);
        assert!(store.mark_sold(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_paginates_sorted() {
        let store = MemoryItemStore::new();
        for (i, price) in [500, 100, 300, 200, 400].into_iter().enumerate() {
            store
                .create(&new_item(&format!("Item {}", i), price, None, ItemType::Book, "Ada"))
                .await
                .unwrap();
        }
        let first = store.list(&CatalogFilter::default(), SortKey::PriceAsc, 2, 0).await.unwrap();
        let second = store.list(&CatalogFilter::default(), SortKey::PriceAsc, 2, 2).await.unwrap();
        let prices: Vec<_> = first.iter().chain(second.iter()).map(|i| i.price).collect();
        assert_eq!(
            prices,
            vec![Decimal::new(100, 2), Decimal::new(200, 2), Decimal::new(300, 2), Decimal::new(400, 2)]
        );
    }

    #[tokio::test]
    async fn test_courses_stats_and_popularity() {
        let store = MemoryItemStore::new();
        store.create(&new_item("A", 100, Some("MATH 101"), ItemType::Book, "Ada")).await.unwrap();
        store.create(&new_item("B", 100, Some("CS 201"), ItemType::Notes, "Bo")).await.unwrap();
        store.create(&new_item("C", 100, Some("MATH 101"), ItemType::Notes, "Ada")).await.unwrap();
        store.create(&new_item("D", 100, Some(""), ItemType::Book, "Cy")).await.unwrap();
        let sold = store.create(&new_item("E", 100, Some("PHYS 1"), ItemType::Book, "Di")).await.unwrap();
        store.mark_sold(sold.id).await.unwrap();

        assert_eq!(store.courses().await.unwrap(), vec!["CS 201", "MATH 101"]);

        let stats = store.stats().await.unwrap();
        assert_eq!(
            stats,
            MarketStats {
                total_items: 4,
                total_books: 2,
                total_notes: 2,
                total_sellers: 3,
            }
        );

        let popular = store.popular_courses(5).await.unwrap();
        assert_eq!(popular[0], CourseCount { course: "MATH 101".into(), count: 2 });
        assert_eq!(popular.len(), 2);
    }

    #[tokio::test]
    async fn test_related_and_by_seller() {
        let store = MemoryItemStore::new();
        let base = store.create(&new_item("Base", 100, Some("MATH 101"), ItemType::Notes, "Ada")).await.unwrap();
        let same_course = store.create(&new_item("Course", 100, Some("MATH 101"), ItemType::Book, "Bo")).await.unwrap();
        let same_type = store.create(&new_item("Type", 100, Some("CS 1"), ItemType::Notes, "Ada")).await.unwrap();
        store.create(&new_item("Other", 100, Some("CS 1"), ItemType::Book, "Cy")).await.unwrap();

        let related: Vec<_> = store.related(&base, 3).await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(related, vec![same_type.id, same_course.id]);

        let by_seller: Vec<_> = store
            .by_seller("Ada", base.id, 3)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(by_seller, vec![same_type.id]);
    }

    #[tokio::test]
    async fn test_suggest_matches_name_course_author_only() {
        let store = MemoryItemStore::new();
        let mut with_author = new_item("Physics", 100, None, ItemType::Book, "Ada");
        with_author.author = Some("Halliday".into());
        store.create(&with_author).await.unwrap();
        store.create(&new_item("Calculus", 100, Some("MATH 101"), ItemType::Book, "Halley")).await.unwrap();

        let names: Vec<_> = store.suggest("HALL", 10).await.unwrap().into_iter().map(|i| i.item_name).collect();
        assert_eq!(names, vec!["Physics"]);
        assert_eq!(store.suggest("math", 10).await.unwrap().len(), 1);
    }
}
