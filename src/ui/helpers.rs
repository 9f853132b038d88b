//! Background task helpers for the UI layer.
//!
//! Every network call the console makes runs in a spawned task that reports
//! back through the `AppEvent` channel. Panics inside those tasks are caught
//! and surfaced as `AppEvent::TaskPanicked`.

use crate::api::{load_snapshot, CatalogClient, CategoryForm, SubcategoryForm};
use crate::app::{App, AppEvent};
use crate::catalog::{persist_sort_order, SortUpdate};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Wraps a future to catch panics and convert them to errors.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Spawn `work` and deliver the events it produces in order.
///
/// A panic inside `work` becomes a single `TaskPanicked` event.
fn spawn_task<F>(
    task: &'static str,
    event_tx: &mpsc::Sender<AppEvent>,
    work: F,
) -> JoinHandle<()>
where
    F: Future<Output = Vec<AppEvent>> + Send + 'static,
{
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let events = match catch_task_panic(work).await {
            Ok(events) => events,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                vec![AppEvent::TaskPanicked {
                    task,
                    error: panic_msg,
                }]
            }
        };
        for event in events {
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, task, "Channel send failed (receiver dropped)");
                break;
            }
        }
    })
}

/// Reload the whole catalog. A reload already in flight is replaced.
pub fn spawn_reload(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(handle) = app.reload_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous reload task");
    }
    app.loading = true;

    let client = app.client.clone();
    app.reload_handle = Some(spawn_task("reload", event_tx, async move {
        let result = load_snapshot(&client).await.map_err(|e| e.to_string());
        vec![AppEvent::SnapshotLoaded(result)]
    }));
}

/// Re-fetch one category's subcategories from the backend.
pub(super) fn spawn_subcategory_refresh(
    client: &CatalogClient,
    category_id: i64,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let client = client.clone();
    spawn_task("subcategory_refresh", event_tx, async move {
        let result = client
            .list_subcategories(category_id)
            .await
            .map_err(|e| e.to_string());
        vec![AppEvent::SubcategoriesLoaded {
            category_id,
            result,
        }]
    });
}

/// Persist a sort plan, then re-fetch the category's subcategories.
///
/// The handle is not kept: once started, a save runs to completion.
pub(super) fn spawn_sort_save(
    client: &CatalogClient,
    category_id: i64,
    plan: Vec<SortUpdate>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let client = client.clone();
    spawn_task("save_sort", event_tx, async move {
        match persist_sort_order(&client, &plan).await {
            Ok(applied) => {
                let result = client
                    .list_subcategories(category_id)
                    .await
                    .map_err(|e| e.to_string());
                vec![
                    AppEvent::SortSaved {
                        category_id,
                        applied,
                    },
                    AppEvent::SubcategoriesLoaded {
                        category_id,
                        result,
                    },
                ]
            }
            Err(e) => vec![AppEvent::SortFailed {
                category_id,
                failed_id: e.failed_id,
                applied: e.applied,
                total: e.total,
                message: e.user_message(),
            }],
        }
    });
}

/// A validated create/update request from the form dialog.
pub(super) enum FormSubmission {
    CreateCategory(CategoryForm),
    UpdateCategory(i64, CategoryForm),
    CreateSubcategory(SubcategoryForm),
    UpdateSubcategory(i64, SubcategoryForm),
}

pub(super) fn spawn_form_save(
    client: &CatalogClient,
    submission: FormSubmission,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let client = client.clone();
    spawn_task("save_form", event_tx, async move {
        let (result, verb) = match submission {
            FormSubmission::CreateCategory(form) => {
                (client.create_category(form).await, "Category created")
            }
            FormSubmission::UpdateCategory(id, form) => {
                (client.update_category(id, form).await, "Category updated")
            }
            FormSubmission::CreateSubcategory(form) => {
                (client.create_subcategory(form).await, "Subcategory created")
            }
            FormSubmission::UpdateSubcategory(id, form) => (
                client.update_subcategory(id, form).await,
                "Subcategory updated",
            ),
        };
        let event = match result {
            Ok(receipt) => AppEvent::FormSaved {
                message: receipt.message.unwrap_or_else(|| verb.to_string()),
            },
            Err(e) => AppEvent::FormFailed {
                error: e.to_string(),
            },
        };
        vec![event]
    });
}

pub(super) fn spawn_category_prefill(
    client: &CatalogClient,
    id: i64,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let client = client.clone();
    spawn_task("prefill_category", event_tx, async move {
        let result = client.get_category(id).await.map_err(|e| e.to_string());
        vec![AppEvent::CategoryPrefilled { id, result }]
    });
}

pub(super) fn spawn_subcategory_prefill(
    client: &CatalogClient,
    id: i64,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let client = client.clone();
    spawn_task("prefill_subcategory", event_tx, async move {
        let result = client.get_subcategory(id).await.map_err(|e| e.to_string());
        vec![AppEvent::SubcategoryPrefilled { id, result }]
    });
}

/// Fetch a product for the detail overlay, replacing any pending fetch.
pub(super) fn spawn_product_load(
    app: &mut App,
    product_id: i64,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    if let Some(handle) = app.detail_handle.take() {
        handle.abort();
    }
    let client = app.client.clone();
    app.detail_handle = Some(spawn_task("product_detail", event_tx, async move {
        let result = client
            .get_product(product_id)
            .await
            .map_err(|e| e.to_string());
        vec![AppEvent::ProductLoaded { product_id, result }]
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_ok() {
        let result = catch_task_panic(async { 42 }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_catch_task_panic_str_payload() {
        let result: Result<(), String> = catch_task_panic(async { panic!("boom") }).await;
        assert_eq!(result, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_catch_task_panic_string_payload() {
        let id = 7;
        let result: Result<(), String> =
            catch_task_panic(async move { panic!("failed on {}", id) }).await;
        assert_eq!(result, Err("failed on 7".to_string()));
    }

    #[tokio::test]
    async fn test_spawn_task_reports_panic_as_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_task("explode", &tx, async {
            if true {
                panic!("kaboom");
            }
            Vec::new()
        });
        handle.await.unwrap();

        match rx.recv().await {
            Some(AppEvent::TaskPanicked { task, error }) => {
                assert_eq!(task, "explode");
                assert_eq!(error, "kaboom");
            }
            _ => panic!("expected TaskPanicked"),
        }
    }

    #[tokio::test]
    async fn test_spawn_task_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = spawn_task("ordered", &tx, async {
            vec![
                AppEvent::SortSaved {
                    category_id: 1,
                    applied: 3,
                },
                AppEvent::FormSaved {
                    message: "done".into(),
                },
            ]
        });
        handle.await.unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(AppEvent::SortSaved { applied: 3, .. })
        ));
        assert!(matches!(rx.recv().await, Some(AppEvent::FormSaved { .. })));
    }
}
