//! Read-only product detail overlay.

use crate::app::{App, ProductDetail};
use crate::catalog::{FieldType, Product};
use crate::util::strip_control_chars;
use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::render::centered_rect;

/// Lay out a product as text lines.
fn product_lines<'a>(app: &App, product: &'a Product) -> Vec<Line<'a>> {
    let heading = app.style("dialog_title");
    let body = app.style("dialog_body");
    let price = app.style("product_price");

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Code: ", heading),
            Span::styled(strip_control_chars(&product.code), body),
        ]),
        Line::from(vec![
            Span::styled("Active: ", heading),
            Span::styled(if product.is_active { "yes" } else { "no" }, body),
        ]),
        Line::from(vec![
            Span::styled("Free photos: ", heading),
            Span::styled(product.free_selection_count.to_string(), body),
            Span::styled("  Extra photo: ", heading),
            Span::styled(format!("{:.2}", product.extra_photo_price), price),
        ]),
    ];

    if let Some(category) = product.category_id.and_then(|id| app.snapshot.category(id)) {
        let sub = product
            .subcategory_id
            .and_then(|id| app.snapshot.subcategory(id))
            .map(|s| format!(" / {}", strip_control_chars(&s.name)))
            .unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled("Category: ", heading),
            Span::styled(format!("{}{}", strip_control_chars(&category.name), sub), body),
        ]));
    }

    if let Some(description) = product.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            strip_control_chars(description),
            body,
        )));
    }

    if !product.sizes.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Sizes", heading)));
        for size in &product.sizes {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<16}", strip_control_chars(&size.size_name)), body),
                Span::styled(format!("{:>10.2}", size.price), price),
            ]));
        }
    }

    if !product.custom_fields.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Custom fields", heading)));
        for field in &product.custom_fields {
            let required = if field.is_required { " *" } else { "" };
            let kind = match field.field_type {
                FieldType::Text => "text",
                FieldType::Number => "number",
                FieldType::Select => "select",
            };
            lines.push(Line::from(Span::styled(
                format!(
                    "  {}{} ({})",
                    strip_control_chars(&field.field_name),
                    required,
                    kind
                ),
                body,
            )));
            for option in field.options() {
                lines.push(Line::from(Span::styled(
                    format!("    - {}", strip_control_chars(&option.name)),
                    body,
                )));
            }
        }
    }

    if !product.style_category_ids.is_empty() {
        let ids = product
            .style_category_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Style categories: ", heading),
            Span::styled(ids, body),
        ]));
    }

    lines
}

pub fn render(f: &mut Frame, app: &App) {
    let Some(detail) = app.product_detail.as_ref() else {
        return;
    };

    let overlay = centered_rect(70, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }
    f.render_widget(Clear, overlay);

    let (title, lines, scroll) = match detail {
        ProductDetail::Loading { product_id } => (
            format!(" Product #{} ", product_id),
            vec![Line::from(Span::styled("Loading...", app.style("hint")))],
            0,
        ),
        ProductDetail::Failed { product_id, error } => (
            format!(" Product #{} ", product_id),
            vec![Line::from(Span::styled(
                format!("Could not load product: {}", strip_control_chars(error)),
                app.style("dialog_error"),
            ))],
            0,
        ),
        ProductDetail::Loaded { product, scroll } => (
            format!(" {} ", strip_control_chars(&product.name)),
            product_lines(app, product),
            *scroll,
        ),
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.style("panel_border_focused"))
                .title(Span::styled(title, app.style("dialog_title"))),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, overlay);
}
