//! Catalog browsing state: data model, selection/filter, and subcategory
//! reordering.

mod persist;
mod reorder;
mod selection;
mod types;

pub use persist::{persist_sort_order, SortPersistError};
pub use reorder::{ReorderError, ReorderSession, RowSpan, SortUpdate};
pub use selection::{sorted_subcategories, ProductView, SelectionState, ALL_PRODUCTS_TITLE};
pub use types::{
    parse_field_options, CatalogSnapshot, Category, CustomField, FieldOption, FieldType, Product,
    ProductImage, ProductSize, Subcategory,
};
