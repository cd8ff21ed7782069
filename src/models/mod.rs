//! Data models for Campus Market

pub mod catalog;
pub mod enums;
pub mod item;

// Re-export commonly used types
pub use catalog::{CatalogFilter, CatalogPage, ConditionFilter, CatalogQuery, Pagination, SortKey};
pub use enums::{Choice, Condition, ContactType, ItemType};
pub use item::{Item, ItemDetail, ItemForm, ItemShort, NewItem, SearchSuggestion};
