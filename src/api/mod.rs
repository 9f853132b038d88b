//! REST client for the catalog admin backend.

mod client;
mod error;
mod forms;

pub use client::{CatalogClient, SaveReceipt};
pub use error::ApiError;
pub use forms::{CategoryForm, SubcategoryForm};

use crate::catalog::CatalogSnapshot;

/// Load categories, all subcategories, and products into one snapshot.
pub async fn load_snapshot(client: &CatalogClient) -> Result<CatalogSnapshot, ApiError> {
    let (categories, subcategories, products) = futures::try_join!(
        client.list_categories(),
        client.list_all_subcategories(),
        client.list_products(),
    )?;

    tracing::info!(
        categories = categories.len(),
        subcategories = subcategories.len(),
        products = products.len(),
        "Catalog snapshot loaded"
    );
    Ok(CatalogSnapshot::new(categories, subcategories, products))
}
