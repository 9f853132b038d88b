//! Input handling for the TUI.
//!
//! Keyboard input is dispatched through the keybinding registry; overlays
//! (help, product detail, form, sort dialog) capture input before the panes.
//! Mouse input only matters while the sort dialog is open.

use crate::app::{App, AppEvent, Focus, FormDialog, FormKind, ProductDetail};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;

use super::helpers::{
    spawn_category_prefill, spawn_form_save, spawn_product_load, spawn_reload, spawn_sort_save,
    spawn_subcategory_prefill, spawn_subcategory_refresh, FormSubmission,
};
use super::Action;

/// Map the current focus panel to a keybinding context for context-specific lookups.
fn focus_to_context(focus: Focus) -> KbContext {
    match focus {
        Focus::Categories => KbContext::Categories,
        Focus::Subcategories => KbContext::Subcategories,
        Focus::Products => KbContext::Products,
    }
}

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.show_help {
        return Ok(handle_help_input(app, code));
    }

    if app.product_detail.is_some() {
        return Ok(handle_detail_input(app, code));
    }

    if app.form.is_some() {
        return Ok(handle_form_input(app, code, modifiers, event_tx));
    }

    if app.sort_dialog.is_some() {
        return Ok(handle_sort_input(app, code, modifiers, event_tx));
    }

    handle_browse_input(app, code, modifiers, event_tx)
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Handle input while the product detail overlay is visible.
fn handle_detail_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
            app.product_detail = None;
            if let Some(handle) = app.detail_handle.take() {
                handle.abort();
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(ProductDetail::Loaded { scroll, .. }) = app.product_detail.as_mut() {
                *scroll = scroll.saturating_add(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(ProductDetail::Loaded { scroll, .. }) = app.product_detail.as_mut() {
                *scroll = scroll.saturating_sub(1);
            }
        }
        _ => {}
    }
    Action::Continue
}

// ============================================================================
// Browse panes
// ============================================================================

fn handle_browse_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let context = focus_to_context(app.focus);
    let action = app.keybindings.action_for_key(code, modifiers, context);

    match action {
        Some(KbAction::Quit) => return Ok(Action::Quit),
        Some(KbAction::NavDown) => app.nav_down(),
        Some(KbAction::NavUp) => app.nav_up(),
        Some(KbAction::CycleFocus) => app.focus = app.focus.next(),
        Some(KbAction::Select) => handle_select(app, event_tx),
        Some(KbAction::Back) => {
            if app.focus != Focus::Categories {
                app.focus = match app.focus {
                    Focus::Products => Focus::Subcategories,
                    _ => Focus::Categories,
                };
            } else if !app.step_back_selection() {
                app.set_status("Nothing selected");
            }
        }
        Some(KbAction::ShowAllProducts) => {
            app.show_all_products();
            app.focus = Focus::Categories;
        }
        Some(KbAction::Reload) => {
            if app.loading {
                app.set_status("Reload already in progress");
            } else {
                app.set_status("Reloading catalog...");
                spawn_reload(app, event_tx);
            }
        }
        Some(KbAction::OpenSort) => {
            app.open_sort_dialog();
        }
        Some(KbAction::AddCategory) => {
            app.form = Some(FormDialog::new_category());
        }
        Some(KbAction::AddSubcategory) => match app.selection.selected_category_id {
            Some(category_id) => app.form = Some(FormDialog::new_subcategory(category_id)),
            None => app.set_status("Select a category first"),
        },
        Some(KbAction::EditItem) => handle_edit(app, event_tx),
        Some(KbAction::CycleTheme) => {
            let name = app.cycle_theme();
            app.set_status(format!("Theme: {}", name));
        }
        Some(KbAction::ShowHelp) => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// Enter on the focused pane.
fn handle_select(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    match app.focus {
        Focus::Categories => {
            if let Some(category_id) = app.select_category_at_cursor() {
                app.focus = Focus::Subcategories;
                spawn_subcategory_refresh(&app.client, category_id, event_tx);
            }
        }
        Focus::Subcategories => {
            if app.select_subcategory_at_cursor() {
                app.focus = Focus::Products;
            } else if app.subcategory_rows.is_empty() {
                app.set_status("No subcategories");
            }
        }
        Focus::Products => {
            if let Some(product_id) = app.highlighted_product_id() {
                app.product_detail = Some(ProductDetail::Loading { product_id });
                spawn_product_load(app, product_id, event_tx);
            }
        }
    }
}

/// Open the edit form for the focused category or subcategory.
///
/// The form opens with the snapshot's values and is refreshed from the
/// backend as soon as the GET returns.
fn handle_edit(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    match app.focus {
        Focus::Categories => {
            if let Some(category) = app.highlighted_category().cloned() {
                let id = category.id;
                app.form = Some(FormDialog::edit_category(&category));
                spawn_category_prefill(&app.client, id, event_tx);
            }
        }
        Focus::Subcategories => {
            if let Some(subcategory) = app.highlighted_subcategory().cloned() {
                let id = subcategory.id;
                app.form = Some(FormDialog::edit_subcategory(&subcategory));
                spawn_subcategory_prefill(&app.client, id, event_tx);
            }
        }
        Focus::Products => app.set_status("Products are edited in the product editor"),
    }
}

// ============================================================================
// Add / edit form
// ============================================================================

fn handle_form_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    let action = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Form);
    let Some(form) = app.form.as_mut() else {
        return Action::Continue;
    };

    match action {
        Some(KbAction::CancelForm) => {
            app.form = None;
            app.set_status("Cancelled");
        }
        // The prefill would overwrite anything typed before it lands
        _ if form.loading => {}
        Some(KbAction::NextField) => form.next_field(),
        Some(KbAction::PrevField) => form.prev_field(),
        Some(KbAction::SubmitForm) => submit_form(app, event_tx),
        _ => match code {
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                form.insert_char(c)
            }
            _ => {}
        },
    }
    Action::Continue
}

/// Validate the form and send it. Validation failures stay in the form.
fn submit_form(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(form) = app.form.as_mut() else {
        return;
    };
    if form.saving || form.loading {
        return;
    }

    let submission = match (form.kind, form.editing_id) {
        (FormKind::Category, None) => form.to_category_form().map(FormSubmission::CreateCategory),
        (FormKind::Category, Some(id)) => form
            .to_category_form()
            .map(|body| FormSubmission::UpdateCategory(id, body)),
        (FormKind::Subcategory { category_id }, None) => form
            .to_subcategory_form(category_id)
            .map(FormSubmission::CreateSubcategory),
        (FormKind::Subcategory { category_id }, Some(id)) => form
            .to_subcategory_form(category_id)
            .map(|body| FormSubmission::UpdateSubcategory(id, body)),
    };

    match submission {
        Ok(submission) => {
            form.saving = true;
            form.error = None;
            tracing::debug!(title = form.title(), "Submitting form");
            spawn_form_save(&app.client, submission, event_tx);
        }
        Err(e) => form.error = Some(e.to_string()),
    }
}

// ============================================================================
// Sort dialog
// ============================================================================

fn handle_sort_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    let action = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::SortDialog);
    let confirm_discard_sort = app.confirm_discard_sort;
    let Some(dialog) = app.sort_dialog.as_mut() else {
        return Action::Continue;
    };

    if dialog.saving {
        return Action::Continue;
    }

    if dialog.confirm_discard {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.close_sort_dialog();
                app.set_status("Sort changes discarded");
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                dialog.confirm_discard = false;
            }
            _ => {}
        }
        return Action::Continue;
    }

    match action {
        Some(KbAction::PickUp) => {
            if dialog.session.is_dragging() {
                dialog.drop_here();
            } else if let Err(e) = dialog.pick_up() {
                tracing::debug!(error = %e, "Pick up ignored");
            }
        }
        Some(KbAction::NavDown) => {
            if dialog.session.is_dragging() {
                dialog.session.nudge(1);
                dialog.cursor = dialog.session.dragging_position().unwrap_or(dialog.cursor);
            } else {
                dialog.move_cursor(1);
            }
        }
        Some(KbAction::NavUp) => {
            if dialog.session.is_dragging() {
                dialog.session.nudge(-1);
                dialog.cursor = dialog.session.dragging_position().unwrap_or(dialog.cursor);
            } else {
                dialog.move_cursor(-1);
            }
        }
        Some(KbAction::CancelSort) => {
            if dialog.session.is_dragging() {
                dialog.abort();
            } else if dialog.session.is_modified() && confirm_discard_sort {
                dialog.confirm_discard = true;
            } else {
                app.close_sort_dialog();
            }
        }
        Some(KbAction::SaveOrder) => {
            if dialog.session.is_dragging() {
                dialog.drop_here();
            }
            dialog.saving = true;
            dialog.error = None;
            let category_id = dialog.session.category_id();
            let plan = dialog.session.save_plan();
            tracing::info!(category_id, updates = plan.len(), "Saving sort order");
            app.set_status("Saving sort order...");
            spawn_sort_save(&app.client, category_id, plan, event_tx);
        }
        Some(KbAction::ShowHelp) => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        _ => {}
    }
    Action::Continue
}

/// Handle a mouse event. Press picks up a row, drag hovers, release drops
/// inside the list and aborts outside it.
pub(super) fn handle_mouse(app: &mut App, event: MouseEvent) {
    let Some(dialog) = app.sort_dialog.as_mut() else {
        return;
    };
    if dialog.saving || dialog.confirm_discard {
        return;
    }

    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if !dialog.contains(event.column, event.row) {
                return;
            }
            let Some(row) = dialog.display_row_at(event.row) else {
                return;
            };
            if dialog.session.is_dragging() {
                dialog.abort();
            }
            dialog.cursor = row;
            if dialog.pick_up().is_ok() {
                dialog.mouse_drag = true;
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if !dialog.mouse_drag {
                return;
            }
            if let Some(row) = dialog.display_row_at(event.row) {
                dialog.hover_row(row);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if !dialog.mouse_drag {
                return;
            }
            if dialog.contains(event.column, event.row) {
                dialog.drop_here();
            } else {
                dialog.abort();
            }
        }
        MouseEventKind::ScrollDown => dialog.move_cursor(1),
        MouseEventKind::ScrollUp => dialog.move_cursor(-1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{category, test_app};
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::layout::Rect;

    fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).unwrap()
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn working_ids(app: &App) -> Vec<i64> {
        app.sort_dialog
            .as_ref()
            .unwrap()
            .session
            .working_order()
            .iter()
            .map(|s| s.id)
            .collect()
    }

    #[tokio::test]
    async fn test_quit_key() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        assert!(matches!(
            press(&mut app, KeyCode::Char('q'), &tx),
            Action::Quit
        ));
    }

    #[tokio::test]
    async fn test_tab_cycles_focus() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        press(&mut app, KeyCode::Tab, &tx);
        assert_eq!(app.focus, Focus::Subcategories);
    }

    #[tokio::test]
    async fn test_enter_selects_category_and_moves_focus() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        press(&mut app, KeyCode::Enter, &tx);
        assert_eq!(app.selection.selected_category_id, Some(1));
        assert_eq!(app.focus, Focus::Subcategories);
    }

    #[tokio::test]
    async fn test_sort_key_without_category_shows_message() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        press(&mut app, KeyCode::Char('s'), &tx);
        assert!(app.sort_dialog.is_none());
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "Select a category first");
    }

    #[tokio::test]
    async fn test_add_subcategory_requires_category() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        press(&mut app, KeyCode::Char('N'), &tx);
        assert!(app.form.is_none());

        app.select_category_at_cursor();
        press(&mut app, KeyCode::Char('N'), &tx);
        assert_eq!(
            app.form.as_ref().map(|f| f.kind),
            Some(FormKind::Subcategory { category_id: 1 })
        );
    }

    #[tokio::test]
    async fn test_form_typing_and_validation_error() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        press(&mut app, KeyCode::Char('n'), &tx);
        // 'q' and 'j' are text inside the form, not quit / navigate
        assert!(matches!(
            press(&mut app, KeyCode::Char('q'), &tx),
            Action::Continue
        ));
        press(&mut app, KeyCode::Char('j'), &tx);
        press(&mut app, KeyCode::Enter, &tx);

        let form = app.form.as_ref().unwrap();
        assert!(!form.saving);
        assert_eq!(form.error.as_deref(), Some("Category code is required"));

        press(&mut app, KeyCode::Esc, &tx);
        assert!(app.form.is_none());
    }

    #[tokio::test]
    async fn test_form_ignores_input_until_prefilled() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        app.form = Some(FormDialog::edit_category(&category(1, "Frames", 0)));

        press(&mut app, KeyCode::Char('x'), &tx);
        press(&mut app, KeyCode::Tab, &tx);
        press(&mut app, KeyCode::Enter, &tx);
        let form = app.form.as_ref().unwrap();
        assert!(form.loading);
        assert!(!form.saving);
        assert_eq!(form.active, 0);
        assert_eq!(form.to_category_form().unwrap().name, "Frames");

        app.form.as_mut().unwrap().prefill_category(&category(1, "Frames", 0));
        press(&mut app, KeyCode::Char('x'), &tx);
        assert_eq!(
            app.form.as_ref().unwrap().to_category_form().unwrap().name,
            "Framesx"
        );

        press(&mut app, KeyCode::Esc, &tx);
        assert!(app.form.is_none());
    }

    #[tokio::test]
    async fn test_sort_keyboard_drag_c_to_top() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        app.select_category_at_cursor();
        press(&mut app, KeyCode::Char('s'), &tx);

        press(&mut app, KeyCode::Char('j'), &tx);
        press(&mut app, KeyCode::Char('j'), &tx);
        press(&mut app, KeyCode::Char(' '), &tx);
        press(&mut app, KeyCode::Char('k'), &tx);
        press(&mut app, KeyCode::Char('k'), &tx);
        press(&mut app, KeyCode::Char(' '), &tx);

        assert_eq!(working_ids(&app), vec![12, 10, 11]);
        assert_eq!(app.sort_dialog.as_ref().unwrap().cursor, 0);
    }

    #[tokio::test]
    async fn test_sort_esc_aborts_drag_then_asks_before_discard() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        app.select_category_at_cursor();
        press(&mut app, KeyCode::Char('s'), &tx);

        // Esc during a drag only aborts it
        press(&mut app, KeyCode::Char(' '), &tx);
        press(&mut app, KeyCode::Char('j'), &tx);
        press(&mut app, KeyCode::Esc, &tx);
        assert!(app.sort_dialog.is_some());
        assert_eq!(working_ids(&app), vec![10, 11, 12]);

        // Modify, then Esc asks; 'n' keeps the dialog, 'y' discards
        press(&mut app, KeyCode::Char(' '), &tx);
        press(&mut app, KeyCode::Char('j'), &tx);
        press(&mut app, KeyCode::Char(' '), &tx);
        press(&mut app, KeyCode::Esc, &tx);
        assert!(app.sort_dialog.as_ref().unwrap().confirm_discard);
        press(&mut app, KeyCode::Char('n'), &tx);
        assert!(app.sort_dialog.is_some());
        press(&mut app, KeyCode::Esc, &tx);
        press(&mut app, KeyCode::Char('y'), &tx);
        assert!(app.sort_dialog.is_none());
    }

    #[tokio::test]
    async fn test_sort_esc_closes_unmodified_dialog() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        app.select_category_at_cursor();
        press(&mut app, KeyCode::Char('s'), &tx);
        press(&mut app, KeyCode::Esc, &tx);
        assert!(app.sort_dialog.is_none());
    }

    #[tokio::test]
    async fn test_mouse_drag_c_to_top() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        app.select_category_at_cursor();
        press(&mut app, KeyCode::Char('s'), &tx);
        app.sort_dialog.as_mut().unwrap().list_area = Some(Rect::new(10, 5, 30, 6));

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 12, 7));
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 12, 6));
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 12, 5));
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 12, 5));

        assert_eq!(working_ids(&app), vec![12, 10, 11]);
    }

    #[tokio::test]
    async fn test_mouse_release_outside_list_aborts() {
        let (tx, _rx) = mpsc::channel(8);
        let mut app = test_app();
        app.select_category_at_cursor();
        press(&mut app, KeyCode::Char('s'), &tx);
        app.sort_dialog.as_mut().unwrap().list_area = Some(Rect::new(10, 5, 30, 6));

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 12, 5));
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 12, 7));
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 50, 7));

        let dialog = app.sort_dialog.as_ref().unwrap();
        assert!(!dialog.session.is_dragging());
        let visual: Vec<i64> = dialog.session.visual_items().map(|s| s.id).collect();
        assert_eq!(visual, vec![10, 11, 12]);
    }
}
