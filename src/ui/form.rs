use crate::app::{App, FieldValue};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::render::centered_fixed;

/// Render the add/edit dialog: one line per field, then status and hints.
pub fn render(f: &mut Frame, app: &App) {
    let Some(form) = app.form.as_ref() else {
        return;
    };

    let height = form.fields.len() as u16 + 6;
    let overlay = centered_fixed(64, height, f.area());
    if overlay.width < 30 || overlay.height < 6 {
        return;
    }

    f.render_widget(Clear, overlay);
    let title = if form.loading {
        format!(" {} (loading...) ", form.title())
    } else {
        format!(" {} ", form.title())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.style("panel_border_focused"))
        .title(Span::styled(title, app.style("dialog_title")));
    let inner = block.inner(overlay);
    f.render_widget(block, overlay);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let label_width = form
        .fields
        .iter()
        .map(|field| field.label.len())
        .max()
        .unwrap_or(0);

    let lines: Vec<Line> = form
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let active = i == form.active;
            let style = if active {
                app.style("dialog_field_active")
            } else {
                app.style("dialog_field")
            };
            let value = match &field.value {
                FieldValue::Text(text) if active => format!("{}_", text),
                FieldValue::Text(text) => text.clone(),
                FieldValue::Flag(true) => "[x]".to_string(),
                FieldValue::Flag(false) => "[ ]".to_string(),
            };
            Line::from(vec![
                Span::styled(
                    format!("{:>width$}: ", field.label, width = label_width),
                    app.style("dialog_body"),
                ),
                Span::styled(value, style),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), chunks[0]);

    let status = if form.saving {
        Line::from(Span::styled("Saving...", app.style("hint")))
    } else if let Some(error) = &form.error {
        Line::from(Span::styled(error.clone(), app.style("dialog_error")))
    } else {
        Line::from("")
    };
    f.render_widget(Paragraph::new(status), chunks[1]);
    f.render_widget(
        Paragraph::new(Span::styled(
            "Tab next  Shift+Tab previous  Space toggles  Enter save  Esc cancel",
            app.style("hint"),
        )),
        chunks[2],
    );
}
