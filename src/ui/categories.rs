use crate::app::{App, Focus};
use crate::util::strip_control_chars;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Render the category panel.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let is_focused = app.focus == Focus::Categories;
    let selected_id = app.selection.selected_category_id;

    let style_selected = app.style("item_selected");
    let style_normal = app.style("item_normal");
    let style_inactive = app.style("item_inactive");
    let style_code = app.style("item_code");

    let items: Vec<ListItem> = app
        .snapshot
        .categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            let style = if is_focused && i == app.category_cursor {
                style_selected
            } else if !category.is_active {
                style_inactive
            } else {
                style_normal
            };
            let marker = if selected_id == Some(category.id) { "* " } else { "  " };

            let mut spans = Vec::with_capacity(4);
            spans.push(Span::styled(marker, style));
            if let Some(icon) = category.icon.as_deref().filter(|i| !i.trim().is_empty()) {
                spans.push(Span::styled(format!("{} ", strip_control_chars(icon)), style));
            }
            spans.push(Span::styled(strip_control_chars(&category.name), style));
            spans.push(Span::styled(
                format!(" {}", strip_control_chars(&category.code)),
                style_code,
            ));

            ListItem::new(Line::from(spans))
        })
        .collect();

    let border_style = if is_focused {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };

    let title = if app.loading {
        "Categories (loading...)"
    } else {
        "Categories"
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
        .highlight_style(Style::default());

    let selected = (!app.snapshot.categories.is_empty()).then_some(app.category_cursor);
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);
}
