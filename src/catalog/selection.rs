//! Category/subcategory selection and the derived product view.
//!
//! All display names are resolved by id against the `CatalogSnapshot`.

use super::types::{CatalogSnapshot, Product, Subcategory};

/// Title shown when no category is selected.
pub const ALL_PRODUCTS_TITLE: &str = "Product list";

/// Which category/subcategory is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_category_id: Option<i64>,
    pub selected_subcategory_id: Option<i64>,
}

impl SelectionState {
    /// Select a category. Always clears the subcategory, including when the
    /// same category is selected again.
    pub fn select_category(&mut self, category_id: i64) {
        self.selected_category_id = Some(category_id);
        self.selected_subcategory_id = None;
        tracing::debug!(category_id, "Category selected");
    }

    /// Select a subcategory of the current category.
    ///
    /// Returns false (and leaves state unchanged) when no category is
    /// selected or the subcategory belongs to another category.
    pub fn select_subcategory(&mut self, snapshot: &CatalogSnapshot, subcategory_id: i64) -> bool {
        let Some(category_id) = self.selected_category_id else {
            tracing::debug!(subcategory_id, "Ignoring subcategory without a category");
            return false;
        };

        let belongs = snapshot
            .subcategories_of(category_id)
            .iter()
            .any(|s| s.id == subcategory_id);
        if !belongs {
            tracing::debug!(
                category_id,
                subcategory_id,
                "Ignoring subcategory from another category"
            );
            return false;
        }

        self.selected_subcategory_id = Some(subcategory_id);
        true
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a product passes the current filter.
    pub fn matches(&self, product: &Product) -> bool {
        match self.selected_category_id {
            None => true,
            Some(category_id) => {
                product.category_id == Some(category_id)
                    && self
                        .selected_subcategory_id
                        .map_or(true, |sub_id| product.subcategory_id == Some(sub_id))
            }
        }
    }

    /// Recompute the visible product set.
    pub fn filter_products(&self, snapshot: &CatalogSnapshot) -> ProductView {
        let visible: Vec<i64> = snapshot
            .products
            .iter()
            .filter(|p| self.matches(p))
            .map(|p| p.id)
            .collect();

        ProductView {
            count: visible.len(),
            visible,
            title: self.title(snapshot),
        }
    }

    /// Compose the product pane title from id lookups.
    pub fn title(&self, snapshot: &CatalogSnapshot) -> String {
        let Some(category) = self
            .selected_category_id
            .and_then(|id| snapshot.category(id))
        else {
            return ALL_PRODUCTS_TITLE.to_string();
        };

        match self
            .selected_subcategory_id
            .and_then(|id| snapshot.subcategory(id))
        {
            Some(sub) => format!("{} - {}", category.name, sub.name),
            None => category.name.clone(),
        }
    }
}

/// Result of `filter_products`: visible product ids in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductView {
    pub visible: Vec<i64>,
    pub count: usize,
    pub title: String,
}

/// Subcategories of a category ordered for display.
///
/// Ascending by `sort_order`; ties keep their original relative order.
pub fn sorted_subcategories(snapshot: &CatalogSnapshot, category_id: i64) -> Vec<Subcategory> {
    let mut subs = snapshot.subcategories_of(category_id).to_vec();
    // sort_by_key is stable
    subs.sort_by_key(|s| s.sort_order);
    subs
}
