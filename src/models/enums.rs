//! Shared domain enums for listings

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// ItemType
// ---------------------------------------------------------------------------

/// Kind of listing. Stored as the PostgreSQL enum `item_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "item_type", rename_all = "lowercase")]
pub enum ItemType {
    #[default]
    Book,
    Notes,
}

impl ItemType {
    pub const ALL: [ItemType; 2] = [ItemType::Book, ItemType::Notes];

    /// Form/query code for this type
    pub fn as_code(&self) -> &'static str {
        match self {
            ItemType::Book => "book",
            ItemType::Notes => "notes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Book => "Textbook",
            ItemType::Notes => "Study Notes",
        }
    }

    /// Parse a form/query code; anything else is `None`
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "book" => Some(ItemType::Book),
            "notes" => Some(ItemType::Notes),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Physical condition of the listed item. Stored as the PostgreSQL enum `item_condition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "item_condition", rename_all = "lowercase")]
pub enum Condition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Excellent,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            Condition::Excellent => "excellent",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Condition::Excellent => "Excellent - Like New",
            Condition::Good => "Good - Minor Wear",
            Condition::Fair => "Fair - Some Wear",
            Condition::Poor => "Poor - Heavy Wear",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "excellent" => Some(Condition::Excellent),
            "good" => Some(Condition::Good),
            "fair" => Some(Condition::Fair),
            "poor" => Some(Condition::Poor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

// ---------------------------------------------------------------------------
// ContactType
// ---------------------------------------------------------------------------

/// How a seller can be reached, derived from `contact_info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Email,
    Phone,
}

impl ContactType {
    pub fn of(contact_info: &str) -> Self {
        if contact_info.contains('@') {
            ContactType::Email
        } else {
            ContactType::Phone
        }
    }
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// A `(value, label)` pair for populating select inputs
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl From<ItemType> for Choice {
    fn from(t: ItemType) -> Self {
        Self {
            value: t.as_code().to_string(),
            label: t.label().to_string(),
        }
    }
}

impl From<Condition> for Choice {
    fn from(c: Condition) -> Self {
        Self {
            value: c.as_code().to_string(),
            label: c.label().to_string(),
        }
    }
}
