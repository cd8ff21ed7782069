//! Listing (item) model, the post form and list/detail projections.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use super::enums::{Condition, ContactType, ItemType};

/// Price column is NUMERIC(10, 2)
pub const PRICE_MAX_DIGITS: u32 = 10;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Full listing record as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i64,
    pub item_name: String,
    pub description: String,
    #[schema(value_type = String, example = "24.50")]
    pub price: Decimal,
    pub seller_name: String,
    /// WhatsApp number or email
    pub contact_info: String,
    /// Path of the photo, relative to the media root
    pub image: Option<String>,
    pub item_type: ItemType,
    pub author: Option<String>,
    /// Course code, e.g. "MATH 101"
    pub course: Option<String>,
    pub condition: Condition,
    pub date_posted: DateTime<Utc>,
    pub is_sold: bool,
    pub view_count: i32,
}

impl Item {
    pub fn url(&self) -> String {
        item_url(self.id)
    }

    pub fn contact_type(&self) -> ContactType {
        ContactType::of(&self.contact_info)
    }
}

pub fn item_url(id: i64) -> String {
    format!("/item/{}/", id)
}

/// Validated listing ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub item_name: String,
    pub description: String,
    pub price: Decimal,
    pub seller_name: String,
    pub contact_info: String,
    pub image: Option<String>,
    pub item_type: ItemType,
    pub author: Option<String>,
    pub course: Option<String>,
    pub condition: Condition,
}

/// Short item representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemShort {
    pub id: i64,
    pub item_name: String,
    pub item_type: ItemType,
    pub author: Option<String>,
    pub course: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub condition: Condition,
    pub image: Option<String>,
    pub seller_name: String,
    pub date_posted: DateTime<Utc>,
    pub view_count: i32,
    pub url: String,
}

impl From<&Item> for ItemShort {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            item_name: item.item_name.clone(),
            item_type: item.item_type,
            author: item.author.clone(),
            course: item.course.clone(),
            price: item.price,
            condition: item.condition,
            image: item.image.clone(),
            seller_name: item.seller_name.clone(),
            date_posted: item.date_posted,
            view_count: item.view_count,
            url: item.url(),
        }
    }
}

/// Detail page payload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub contact_type: ContactType,
    pub url: String,
    /// Same course or same type, unsold, at most 3
    pub related_items: Vec<ItemShort>,
    /// Seller's other unsold listings, at most 3
    pub other_items: Vec<ItemShort>,
}

/// Autocomplete entry returned by the AJAX search
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchSuggestion {
    pub id: i64,
    pub name: String,
    pub course: String,
    pub price: String,
    pub url: String,
}

impl From<&Item> for SearchSuggestion {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.item_name.clone(),
            course: item.course.clone().unwrap_or_default(),
            price: item.price.to_string(),
            url: item.url(),
        }
    }
}

// ---------------------------------------------------------------------------
// Post form
// ---------------------------------------------------------------------------

/// Fields submitted on the post form. Text values are trimmed on construction.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ItemForm {
    #[validate(length(min = 1, max = 200, message = "Item name is required (200 characters max)."))]
    pub item_name: String,
    #[validate(custom(function = "validate_item_type"))]
    pub item_type: String,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub author: Option<String>,
    #[validate(length(max = 50, message = "Ensure this value has at most 50 characters."))]
    pub course: Option<String>,
    #[validate(custom(function = "validate_price"))]
    pub price: String,
    #[validate(custom(function = "validate_condition"))]
    pub condition: String,
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
    #[validate(length(min = 1, max = 100, message = "Your name is required (100 characters max)."))]
    pub seller_name: String,
    #[validate(
        length(min = 1, max = 200, message = "Contact info is required (200 characters max)."),
        custom(function = "validate_contact_info")
    )]
    pub contact_info: String,
}

impl ItemForm {
    /// Build a form from submitted `(name, value)` pairs. Unknown names are ignored,
    /// blank optional fields become `None`, and type/condition default to book/good.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut form = ItemForm {
            item_type: ItemType::default().as_code().to_string(),
            condition: Condition::default().as_code().to_string(),
            ..Default::default()
        };

        for (name, value) in pairs {
            let value = value.as_ref().trim().to_string();
            match name.as_ref() {
                "item_name" => form.item_name = value,
                "item_type" if !value.is_empty() => form.item_type = value,
                "author" => form.author = non_blank(value),
                "course" => form.course = non_blank(value),
                "price" => form.price = value,
                "condition" if !value.is_empty() => form.condition = value,
                "description" => form.description = value,
                "seller_name" => form.seller_name = value,
                "contact_info" => form.contact_info = value,
                _ => {}
            }
        }
        form
    }

    /// Validate every field and convert into a typed listing
    pub fn into_new_item(self, image: Option<String>) -> Result<NewItem, ValidationErrors> {
        self.validate()?;

        let price = parse_price(&self.price).map_err(|e| single_error("price", e))?;
        let item_type = ItemType::from_code(&self.item_type)
            .ok_or_else(|| single_error("item_type", invalid_choice(&self.item_type)))?;
        let condition = Condition::from_code(&self.condition)
            .ok_or_else(|| single_error("condition", invalid_choice(&self.condition)))?;

        Ok(NewItem {
            item_name: self.item_name,
            description: self.description,
            price,
            seller_name: self.seller_name,
            contact_info: self.contact_info,
            image,
            item_type,
            author: self.author,
            course: self.course,
            condition,
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn error_with_message(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn single_error(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

fn invalid_choice(value: &str) -> ValidationError {
    error_with_message(
        "invalid_choice",
        format!("Select a valid choice. {} is not one of the available choices.", value),
    )
}

/// Parse a submitted price: a positive decimal with at most 10 digits, 2 of them decimals
pub fn parse_price(value: &str) -> Result<Decimal, ValidationError> {
    if value.is_empty() {
        return Err(error_with_message("required", "Price is required.".to_string()));
    }

    let not_a_number = || error_with_message("invalid", "Enter a number.".to_string());
    // Decimal::from_str also takes digit separators such as `1_000`
    if !value.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+')) {
        return Err(not_a_number());
    }
    let price = Decimal::from_str(value).map_err(|_| not_a_number())?;

    if price <= Decimal::ZERO {
        return Err(error_with_message(
            "price_not_positive",
            "Price must be greater than zero.".to_string(),
        ));
    }

    // Places are counted as written, so trailing zeros count too
    let decimals = price.scale();
    let mantissa_digits = price.mantissa().unsigned_abs().to_string().len() as u32;
    let digits = mantissa_digits.max(decimals);

    if digits > PRICE_MAX_DIGITS {
        return Err(error_with_message(
            "max_digits",
            format!("Ensure that there are no more than {} digits in total.", PRICE_MAX_DIGITS),
        ));
    }
    if decimals > PRICE_DECIMAL_PLACES {
        return Err(error_with_message(
            "max_decimal_places",
            format!("Ensure that there are no more than {} decimal places.", PRICE_DECIMAL_PLACES),
        ));
    }
    if digits - decimals > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
        return Err(error_with_message(
            "max_whole_digits",
            format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES
            ),
        ));
    }

    Ok(price)
}

fn validate_price(value: &str) -> Result<(), ValidationError> {
    parse_price(value).map(|_| ())
}

/// Contact must look like an email (contains '@') or a phone number (contains a digit)
pub fn validate_contact_info(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.contains('@') || value.chars().any(char::is_numeric) {
        return Ok(());
    }
    Err(error_with_message(
        "contact_info",
        "Please enter a valid email address or phone number.".to_string(),
    ))
}

fn validate_item_type(value: &str) -> Result<(), ValidationError> {
    match ItemType::from_code(value) {
        Some(_) => Ok(()),
        None => Err(invalid_choice(value)),
    }
}

fn validate_condition(value: &str) -> Result<(), ValidationError> {
    match Condition::from_code(value) {
        Some(_) => Ok(()),
        None => Err(invalid_choice(value)),
    }
}
