//! Sequential persistence of a sort plan.
//!
//! Updates are awaited one at a time. The first failure stops the sequence;
//! updates already applied stay applied.

use super::reorder::SortUpdate;
use crate::api::{ApiError, CatalogClient};
use thiserror::Error;

/// A sort save stopped partway through.
#[derive(Debug, Error)]
#[error("{}", failure_message(*.failed_id, .source))]
pub struct SortPersistError {
    /// Subcategory whose update failed.
    pub failed_id: i64,
    /// Updates that succeeded before the failure.
    pub applied: usize,
    pub total: usize,
    #[source]
    pub source: ApiError,
}

impl SortPersistError {
    /// Message naming the failed id, with the server's text when present.
    pub fn user_message(&self) -> String {
        failure_message(self.failed_id, &self.source)
    }
}

fn failure_message(failed_id: i64, source: &ApiError) -> String {
    match source.server_message() {
        Some(message) => format!("Subcategory {}: {}", failed_id, message),
        None => format!(
            "Update of subcategory {} sort order failed ({})",
            failed_id, source
        ),
    }
}

/// Send every update in order. Returns the number applied.
pub async fn persist_sort_order(
    client: &CatalogClient,
    plan: &[SortUpdate],
) -> Result<usize, SortPersistError> {
    let total = plan.len();

    for (applied, update) in plan.iter().enumerate() {
        if let Err(source) = client
            .update_subcategory_sort_order(update.subcategory_id, update.sort_order)
            .await
        {
            tracing::warn!(
                subcategory_id = update.subcategory_id,
                applied,
                total,
                error = %source,
                "Sort order save stopped; earlier updates remain applied"
            );
            return Err(SortPersistError {
                failed_id: update.subcategory_id,
                applied,
                total,
                source,
            });
        }
    }

    tracing::info!(updates = total, "Sort order saved");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_falls_back_to_failed_id() {
        let err = SortPersistError {
            failed_id: 42,
            applied: 1,
            total: 3,
            source: ApiError::HttpStatus(500),
        };
        assert!(err.user_message().contains("subcategory 42"));
    }

    #[test]
    fn test_message_keeps_failed_id_with_server_text() {
        let err = SortPersistError {
            failed_id: 42,
            applied: 0,
            total: 3,
            source: ApiError::Server {
                status: 400,
                message: "Update failed: db locked".into(),
            },
        };
        assert_eq!(err.to_string(), "Subcategory 42: Update failed: db locked");
        assert_eq!(err.user_message(), err.to_string());
    }
}
