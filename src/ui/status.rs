use crate::app::{App, Focus};
use crate::keybindings::{Action, Context};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

/// Build "[key]label" hints from the live bindings so overrides show up.
fn hints(app: &App, context: Context, entries: &[(Action, &str)]) -> String {
    entries
        .iter()
        .filter_map(|(action, label)| {
            app.keybindings
                .key_hint(Context::Global, *action)
                .or_else(|| app.keybindings.key_hint(context, *action))
                .map(|key| format!("[{}]{}", key, label))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Browse-mode hints. Add-subcategory appears once a category is selected
/// and sort only while that category has subcategories.
fn browse_hints(app: &App, context: Context) -> String {
    let mut entries = vec![(Action::Select, " select")];
    if !app.subcategory_rows.is_empty() {
        entries.push((Action::OpenSort, "ort"));
    }
    entries.push((Action::AddCategory, "ew"));
    if app.selection.selected_category_id.is_some() {
        entries.push((Action::AddSubcategory, " new subcategory"));
    }
    entries.extend([
        (Action::EditItem, "dit"),
        (Action::Reload, "eload"),
        (Action::ShowHelp, " help"),
        (Action::Quit, "uit"),
    ]);
    hints(app, context, &entries)
}

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if app.loading {
        Cow::Borrowed("Loading catalog...")
    } else if let Some(dialog) = &app.sort_dialog {
        if dialog.saving {
            Cow::Borrowed("Saving sort order...")
        } else if dialog.confirm_discard {
            Cow::Borrowed("Discard changes? (y/n)")
        } else {
            Cow::Owned(hints(
                app,
                Context::SortDialog,
                &[
                    (Action::PickUp, " pick up/drop"),
                    (Action::SaveOrder, " save"),
                    (Action::CancelSort, " cancel"),
                ],
            ))
        }
    } else if app.form.is_some() {
        Cow::Owned(hints(
            app,
            Context::Form,
            &[
                (Action::NextField, " next field"),
                (Action::SubmitForm, " save"),
                (Action::CancelForm, " cancel"),
            ],
        ))
    } else {
        let context = match app.focus {
            Focus::Categories => Context::Categories,
            Focus::Subcategories => Context::Subcategories,
            Focus::Products => Context::Products,
        };
        Cow::Owned(browse_hints(app, context))
    };

    let paragraph = Paragraph::new(text).style(app.style("status_bar"));
    f.render_widget(paragraph, area);
}
