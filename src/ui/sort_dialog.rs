//! Sort dialog overlay.
//!
//! Draws the working order of the open reorder session. The dragged row is
//! shown at its hover position. The inner list area and scroll offset are
//! written back to the dialog so mouse events can be mapped to rows.

use crate::app::App;
use crate::util::strip_control_chars;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::render::centered_fixed;

pub fn render(f: &mut Frame, app: &mut App) {
    let Some(dialog) = app.sort_dialog.as_ref() else {
        return;
    };

    let rows = dialog.session.len() as u16;
    let overlay = centered_fixed(64, rows.saturating_add(5), f.area());
    if overlay.width < 20 || overlay.height < 6 {
        if let Some(dialog) = app.sort_dialog.as_mut() {
            dialog.list_area = None;
        }
        return;
    }

    let category_name = app
        .snapshot
        .category(dialog.session.category_id())
        .map(|c| strip_control_chars(&c.name).into_owned())
        .unwrap_or_else(|| format!("#{}", dialog.session.category_id()));
    let modified = if dialog.session.is_modified() {
        " (modified)"
    } else {
        ""
    };
    let title = format!(" Sort subcategories - {}{} ", category_name, modified);

    f.render_widget(Clear, overlay);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"))
        .title(Span::styled(title, app.style("dialog_title")));
    let inner = block.inner(overlay);
    f.render_widget(block, overlay);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    let list_area = chunks[0];

    let dragging_id = dialog.session.dragging_id();
    let style_row = app.style("sort_row");
    let style_dragging = app.style("sort_dragging");
    let style_cursor = app.style("item_selected");
    let style_code = app.style("item_code");

    let items: Vec<ListItem> = dialog
        .session
        .visual_items()
        .enumerate()
        .map(|(i, sub)| {
            let is_dragged = dragging_id == Some(sub.id);
            let style = if is_dragged {
                style_dragging
            } else if i == dialog.cursor {
                style_cursor
            } else {
                style_row
            };
            let handle = if is_dragged { ">> " } else { ":: " };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}{:>2}. ", handle, i + 1), style),
                Span::styled(strip_control_chars(&sub.display_name()).into_owned(), style),
                Span::styled(format!("  {}", strip_control_chars(&sub.code)), style_code),
            ]))
        })
        .collect();

    let list = List::new(items).highlight_style(Style::default());
    let mut state = ListState::default().with_selected(Some(dialog.cursor));
    f.render_stateful_widget(list, list_area, &mut state);

    let message = if dialog.saving {
        Line::from(Span::styled("Saving...", app.style("hint")))
    } else if dialog.confirm_discard {
        Line::from(Span::styled(
            "Discard the new order? (y/n)",
            app.style("dialog_error"),
        ))
    } else if let Some(error) = &dialog.error {
        Line::from(Span::styled(error.clone(), app.style("dialog_error")))
    } else if dialog.session.is_modified() {
        Line::from(Span::styled("Order changed, not saved", app.style("sort_modified")))
    } else {
        Line::from("")
    };
    f.render_widget(Paragraph::new(message), chunks[1]);
    f.render_widget(
        Paragraph::new(Span::styled(
            "Space pick up/drop  Drag with mouse  Enter save  Esc cancel",
            app.style("hint"),
        )),
        chunks[2],
    );

    let offset = state.offset();
    if let Some(dialog) = app.sort_dialog.as_mut() {
        dialog.list_area = Some(Rect {
            height: list_area.height.min(rows),
            ..list_area
        });
        dialog.list_offset = offset;
    }
}
