//! Request bodies for category and subcategory create/update.

use super::error::ApiError;
use crate::catalog::{Category, Subcategory};
use serde::Serialize;

/// Body of `POST/PUT /api/admin/product-categories`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryForm {
    pub name: String,
    pub code: String,
    pub icon: String,
    pub image_url: String,
    pub sort_order: i64,
    pub is_active: bool,
    /// Sent as `null` when blank.
    #[serde(serialize_with = "blank_as_null")]
    pub style_redirect_page: String,
}

impl CategoryForm {
    pub fn new() -> Self {
        Self {
            is_active: true,
            ..Default::default()
        }
    }

    /// Trim and check required fields.
    pub fn validate(mut self) -> Result<Self, ApiError> {
        self.name = self.name.trim().to_string();
        self.code = self.code.trim().to_string();
        if self.name.is_empty() {
            return Err(ApiError::Validation("Category name is required".into()));
        }
        if self.code.is_empty() {
            return Err(ApiError::Validation("Category code is required".into()));
        }
        Ok(self)
    }
}

impl From<&Category> for CategoryForm {
    fn from(c: &Category) -> Self {
        Self {
            name: c.name.clone(),
            code: c.code.clone(),
            icon: c.icon.clone().unwrap_or_default(),
            image_url: c.image_url.clone().unwrap_or_default(),
            sort_order: c.sort_order,
            is_active: c.is_active,
            style_redirect_page: c.style_redirect_page.clone().unwrap_or_default(),
        }
    }
}

/// Body of `POST/PUT /api/admin/product-subcategories`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubcategoryForm {
    pub category_id: i64,
    pub name: String,
    pub code: String,
    pub icon: String,
    pub sort_order: i64,
    pub is_active: bool,
}

impl SubcategoryForm {
    pub fn new(category_id: i64) -> Self {
        Self {
            category_id,
            is_active: true,
            ..Default::default()
        }
    }

    pub fn validate(mut self) -> Result<Self, ApiError> {
        self.name = self.name.trim().to_string();
        self.code = self.code.trim().to_string();
        if self.name.is_empty() {
            return Err(ApiError::Validation("Subcategory name is required".into()));
        }
        if self.code.is_empty() {
            return Err(ApiError::Validation("Subcategory code is required".into()));
        }
        Ok(self)
    }
}

impl From<&Subcategory> for SubcategoryForm {
    fn from(s: &Subcategory) -> Self {
        Self {
            category_id: s.category_id,
            name: s.name.clone(),
            code: s.code.clone(),
            icon: s.icon.clone().unwrap_or_default(),
            sort_order: s.sort_order,
            is_active: s.is_active,
        }
    }
}

/// Partial subcategory update used by the sort dialog.
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct SortOrderBody {
    pub sort_order: i64,
}

fn blank_as_null<S: serde::Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.serialize_str(trimmed)
    }
}
