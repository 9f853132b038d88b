//! Application event handling.
//!
//! This module applies the results of background tasks (catalog reloads,
//! sort saves, form saves, product fetches) to the application state.

use crate::app::{App, AppEvent, ProductDetail};
use crate::util::strip_control_chars;
use tokio::sync::mpsc;

use super::helpers::spawn_reload;

/// Handle application events from background tasks.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::SnapshotLoaded(result) => {
            app.loading = false;
            app.reload_handle = None;
            match result {
                Ok(snapshot) => {
                    let categories = snapshot.categories.len();
                    let products = snapshot.products.len();
                    app.apply_snapshot(snapshot);
                    tracing::info!(categories, products, "Catalog snapshot applied");
                    app.set_status(format!(
                        "Loaded {} categories, {} products",
                        categories, products
                    ));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Catalog reload failed");
                    app.set_status(format!("Reload failed: {}", strip_control_chars(&e)));
                }
            }
        }
        AppEvent::SubcategoriesLoaded {
            category_id,
            result,
        } => match result {
            Ok(subcategories) => {
                tracing::debug!(
                    category_id,
                    count = subcategories.len(),
                    "Subcategories refreshed"
                );
                app.replace_subcategories(category_id, subcategories);
            }
            Err(e) => {
                tracing::warn!(category_id, error = %e, "Subcategory refresh failed");
                app.set_status(format!(
                    "Could not refresh subcategories: {}",
                    strip_control_chars(&e)
                ));
            }
        },
        AppEvent::SortSaved {
            category_id,
            applied,
        } => {
            // The dialog may already be gone if the user quit mid-save
            if app
                .sort_dialog
                .as_ref()
                .is_some_and(|d| d.session.category_id() == category_id)
            {
                app.close_sort_dialog();
            }
            app.set_status(format!("Sort order saved ({} subcategories)", applied));
        }
        AppEvent::SortFailed {
            category_id,
            failed_id,
            applied,
            total,
            message,
        } => {
            tracing::warn!(
                category_id,
                failed_id,
                applied,
                total,
                "Sort save incomplete"
            );
            let message = strip_control_chars(&message).into_owned();
            if let Some(dialog) = app.sort_dialog.as_mut() {
                dialog.saving = false;
                dialog.error = Some(format!(
                    "{} ({} of {} updates applied)",
                    message, applied, total
                ));
            }
            app.set_status(message);
        }
        AppEvent::CategoryPrefilled { id, result } => {
            let Some(form) = app.form.as_mut().filter(|f| f.editing_id == Some(id)) else {
                return;
            };
            match result {
                Ok(category) => form.prefill_category(&category),
                Err(e) => {
                    form.loading = false;
                    form.error = Some(format!("Could not load category: {}", e));
                }
            }
        }
        AppEvent::SubcategoryPrefilled { id, result } => {
            let Some(form) = app.form.as_mut().filter(|f| f.editing_id == Some(id)) else {
                return;
            };
            match result {
                Ok(subcategory) => form.prefill_subcategory(&subcategory),
                Err(e) => {
                    form.loading = false;
                    form.error = Some(format!("Could not load subcategory: {}", e));
                }
            }
        }
        AppEvent::FormSaved { message } => {
            app.form = None;
            app.set_status(strip_control_chars(&message).into_owned());
            spawn_reload(app, event_tx);
        }
        AppEvent::FormFailed { error } => {
            // The form stays open so the user can correct and retry
            if let Some(form) = app.form.as_mut() {
                form.saving = false;
                form.error = Some(strip_control_chars(&error).into_owned());
            } else {
                app.set_status(format!("Save failed: {}", error));
            }
        }
        AppEvent::ProductLoaded { product_id, result } => {
            app.detail_handle = None;
            let pending = matches!(
                app.product_detail,
                Some(ProductDetail::Loading { product_id: id }) if id == product_id
            );
            if !pending {
                tracing::debug!(product_id, "Discarding stale product detail");
                return;
            }
            app.product_detail = Some(match result {
                Ok(product) => ProductDetail::Loaded {
                    product: Box::new(product),
                    scroll: 0,
                },
                Err(error) => ProductDetail::Failed { product_id, error },
            });
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            match task {
                "reload" => app.loading = false,
                "save_sort" => {
                    if let Some(dialog) = app.sort_dialog.as_mut() {
                        dialog.saving = false;
                    }
                }
                "save_form" => {
                    if let Some(form) = app.form.as_mut() {
                        form.saving = false;
                    }
                }
                _ => {}
            }
            app.set_status(format!("Internal error in {}: {}", task, error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{sample_snapshot, subcategory, test_app};
    use crate::app::FormDialog;
    use pretty_assertions::assert_eq;

    fn channel() -> (mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        mpsc::channel(8)
    }

    #[tokio::test]
    async fn test_sort_saved_closes_dialog() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        app.select_category_at_cursor();
        app.open_sort_dialog();

        handle_app_event(
            &mut app,
            AppEvent::SortSaved {
                category_id: 1,
                applied: 3,
            },
            &tx,
        );
        assert!(app.sort_dialog.is_none());
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "Sort order saved (3 subcategories)");
    }

    #[tokio::test]
    async fn test_sort_failed_keeps_dialog_open_with_error() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        app.select_category_at_cursor();
        app.open_sort_dialog();
        app.sort_dialog.as_mut().unwrap().saving = true;

        handle_app_event(
            &mut app,
            AppEvent::SortFailed {
                category_id: 1,
                failed_id: 11,
                applied: 1,
                total: 3,
                message: "Update of subcategory 11 sort order failed".into(),
            },
            &tx,
        );
        let dialog = app.sort_dialog.as_ref().unwrap();
        assert!(!dialog.saving);
        assert_eq!(
            dialog.error.as_deref(),
            Some("Update of subcategory 11 sort order failed (1 of 3 updates applied)")
        );
    }

    #[tokio::test]
    async fn test_subcategories_loaded_replaces_group() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        app.select_category_at_cursor();

        handle_app_event(
            &mut app,
            AppEvent::SubcategoriesLoaded {
                category_id: 1,
                result: Ok(vec![
                    subcategory(12, 1, "C", 0),
                    subcategory(10, 1, "A", 1),
                    subcategory(11, 1, "B", 2),
                ]),
            },
            &tx,
        );
        let ids: Vec<i64> = app.subcategory_rows.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![12, 10, 11]);
    }

    #[tokio::test]
    async fn test_snapshot_failure_keeps_old_data() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        app.loading = true;

        handle_app_event(&mut app, AppEvent::SnapshotLoaded(Err("boom".into())), &tx);
        assert!(!app.loading);
        assert_eq!(app.snapshot.categories.len(), 2);
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "Reload failed: boom");
    }

    #[tokio::test]
    async fn test_snapshot_loaded_applies() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        app.snapshot = Default::default();
        handle_app_event(&mut app, AppEvent::SnapshotLoaded(Ok(sample_snapshot())), &tx);
        assert_eq!(app.product_view.count, 4);
    }

    #[tokio::test]
    async fn test_form_failure_keeps_form_open() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        let mut form = FormDialog::new_category();
        form.saving = true;
        app.form = Some(form);

        handle_app_event(
            &mut app,
            AppEvent::FormFailed {
                error: "Code already exists".into(),
            },
            &tx,
        );
        let form = app.form.as_ref().unwrap();
        assert!(!form.saving);
        assert_eq!(form.error.as_deref(), Some("Code already exists"));
    }

    #[tokio::test]
    async fn test_prefill_for_other_row_is_ignored() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        app.form = Some(FormDialog::edit_subcategory(&subcategory(10, 1, "A", 0)));

        handle_app_event(
            &mut app,
            AppEvent::SubcategoryPrefilled {
                id: 99,
                result: Ok(subcategory(99, 1, "Other", 0)),
            },
            &tx,
        );
        assert!(app.form.as_ref().unwrap().loading);

        handle_app_event(
            &mut app,
            AppEvent::SubcategoryPrefilled {
                id: 10,
                result: Ok(subcategory(10, 1, "Fresh", 0)),
            },
            &tx,
        );
        let form = app.form.as_ref().unwrap();
        assert!(!form.loading);
        assert_eq!(form.to_subcategory_form(1).unwrap().name, "Fresh");
    }

    #[tokio::test]
    async fn test_stale_product_detail_discarded() {
        let (tx, _rx) = channel();
        let mut app = test_app();
        app.product_detail = Some(ProductDetail::Loading { product_id: 2 });

        handle_app_event(
            &mut app,
            AppEvent::ProductLoaded {
                product_id: 1,
                result: Err("late".into()),
            },
            &tx,
        );
        assert!(matches!(
            app.product_detail,
            Some(ProductDetail::Loading { product_id: 2 })
        ));
    }
}
