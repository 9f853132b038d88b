//! Catalog domain types as served by the admin REST backend.
//!
//! Field names follow the backend's snake_case JSON. Optional fields use
//! `#[serde(default)]` so partially populated rows still decode.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Category / Subcategory
// ============================================================================

/// Top-level catalog grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub style_redirect_page: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Second-level grouping, owned by exactly one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Subcategory {
    /// Name with the icon prefix when one is set.
    pub fn display_name(&self) -> String {
        match self.icon.as_deref().filter(|i| !i.trim().is_empty()) {
            Some(icon) => format!("{} {}", icon, self.name),
            None => self.name.clone(),
        }
    }

    /// List label: display name followed by the code.
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name(), self.code)
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Product
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSize {
    #[serde(default)]
    pub id: Option<i64>,
    pub size_name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub printer_id: Option<String>,
    #[serde(default)]
    pub effect_image_url: Option<String>,
}

/// Input kind of a product custom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Select,
}

/// One choice of a `select` custom field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(default)]
    pub id: Option<i64>,
    pub field_name: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub field_options: Option<String>,
    #[serde(default)]
    pub is_required: bool,
}

impl CustomField {
    /// Options of a `select` field; empty for other types.
    pub fn options(&self) -> Vec<FieldOption> {
        match (&self.field_type, &self.field_options) {
            (FieldType::Select, Some(raw)) => parse_field_options(raw),
            _ => Vec::new(),
        }
    }
}

/// Parse stored field options.
///
/// The backend stores either a JSON array of `{name, image_url?}` objects or
/// a legacy comma-separated list of names.
pub fn parse_field_options(raw: &str) -> Vec<FieldOption> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Ok(options) = serde_json::from_str::<Vec<FieldOption>>(trimmed) {
        return options;
    }

    trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| FieldOption {
            name: name.to_string(),
            image_url: None,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default = "default_free_selection_count")]
    pub free_selection_count: i64,
    #[serde(default = "default_extra_photo_price")]
    pub extra_photo_price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub subcategory_id: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub sizes: Vec<ProductSize>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub style_category_ids: Vec<i64>,
}

fn default_free_selection_count() -> i64 {
    1
}

fn default_extra_photo_price() -> f64 {
    10.0
}

// ============================================================================
// Snapshot
// ============================================================================

/// Everything the console shows, loaded in one pass and treated as read-only
/// until the next reload.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub categories: Vec<Category>,
    pub subcategories_by_category: HashMap<i64, Vec<Subcategory>>,
    pub products: Vec<Product>,
}

impl CatalogSnapshot {
    pub fn new(
        mut categories: Vec<Category>,
        subcategories: Vec<Subcategory>,
        products: Vec<Product>,
    ) -> Self {
        categories.sort_by_key(|c| c.sort_order);

        let mut subcategories_by_category: HashMap<i64, Vec<Subcategory>> = HashMap::new();
        for sub in subcategories {
            subcategories_by_category
                .entry(sub.category_id)
                .or_default()
                .push(sub);
        }

        Self {
            categories,
            subcategories_by_category,
            products,
        }
    }

    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Subcategories of a category in their stored (unsorted) order.
    pub fn subcategories_of(&self, category_id: i64) -> &[Subcategory] {
        self.subcategories_by_category
            .get(&category_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn subcategory(&self, id: i64) -> Option<&Subcategory> {
        self.subcategories_by_category
            .values()
            .flat_map(|subs| subs.iter())
            .find(|s| s.id == id)
    }

    /// Replace one category's group after a backend re-fetch.
    pub fn replace_subcategories(&mut self, category_id: i64, subcategories: Vec<Subcategory>) {
        self.subcategories_by_category
            .insert(category_id, subcategories);
    }
}
