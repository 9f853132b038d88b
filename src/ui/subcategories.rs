use crate::app::{App, Focus};
use crate::util::strip_control_chars;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the subcategory panel for the selected category.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let is_focused = app.focus == Focus::Subcategories;
    let selected_id = app.selection.selected_subcategory_id;

    let items: Vec<ListItem> = if app.selection.selected_category_id.is_none() {
        vec![ListItem::new("Select a category").style(app.style("hint"))]
    } else if app.subcategory_rows.is_empty() {
        vec![ListItem::new("No subcategories").style(app.style("hint"))]
    } else {
        app.subcategory_rows
            .iter()
            .enumerate()
            .map(|(i, sub)| {
                let style = if is_focused && i == app.subcategory_cursor {
                    app.style("item_selected")
                } else if !sub.is_active {
                    app.style("item_inactive")
                } else {
                    app.style("item_normal")
                };
                let marker = if selected_id == Some(sub.id) { "* " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, style),
                    Span::styled(strip_control_chars(&sub.label()).into_owned(), style),
                ]))
            })
            .collect()
    };

    let border_style = if is_focused {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };

    let title = match app
        .selection
        .selected_category_id
        .and_then(|id| app.snapshot.category(id))
    {
        Some(category) => format!(
            "Subcategories - {} ({})",
            strip_control_chars(&category.name),
            app.subcategory_rows.len()
        ),
        None => "Subcategories".to_string(),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(Style::default());

    let selected = (!app.subcategory_rows.is_empty()).then_some(app.subcategory_cursor);
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);
}
