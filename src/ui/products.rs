use crate::app::{App, Focus};
use crate::catalog::Product;
use crate::util::{display_width, strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

/// Lowest size price.
fn starting_price(product: &Product) -> Option<f64> {
    product
        .sizes
        .iter()
        .map(|s| s.price)
        .fold(None, |min, p| Some(min.map_or(p, |m: f64| m.min(p))))
}

/// Render the product list, filtered by the current selection.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let is_focused = app.focus == Focus::Products;
    let style_price = app.style("product_price");
    let style_code = app.style("item_code");
    // Room for borders, code column and price
    let max_name = (area.width as usize).saturating_sub(26);

    let items: Vec<ListItem> = if app.product_view.count == 0 {
        vec![ListItem::new("No products").style(app.style("hint"))]
    } else {
        app.visible_products()
            .enumerate()
            .map(|(i, product)| {
                let style = if is_focused && i == app.product_cursor {
                    app.style("item_selected")
                } else if !product.is_active {
                    app.style("item_inactive")
                } else {
                    app.style("item_normal")
                };

                let name = strip_control_chars(&product.name);
                let name = truncate_to_width(&name, max_name).into_owned();
                let pad = max_name.saturating_sub(display_width(&name));

                let mut spans = vec![
                    Span::styled(name, style),
                    Span::raw(" ".repeat(pad)),
                    Span::styled(format!(" {:<10}", strip_control_chars(&product.code)), style_code),
                ];
                if let Some(price) = starting_price(product) {
                    spans.push(Span::styled(format!(" from {:.2}", price), style_price));
                }
                ListItem::new(Line::from(spans))
            })
            .collect()
    };

    let border_style = if is_focused {
        app.style("panel_border_focused")
    } else {
        app.style("panel_border")
    };

    let title = format!(
        "{} ({})",
        strip_control_chars(&app.product_view.title),
        app.product_view.count
    );

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(title, app.style("panel_title"))),
        )
        .highlight_style(Style::default());

    let selected = (app.product_view.count > 0).then_some(app.product_cursor);
    let mut state = ListState::default().with_selected(selected);
    f.render_stateful_widget(list, area, &mut state);
}
