//! Render functions for the TUI.
//!
//! This module handles all rendering logic: the three browse panes, the
//! status bar, and whichever overlay is active on top of them.

use crate::app::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::Paragraph,
    Frame,
};

use super::{categories, form, help, product_detail, products, sort_dialog, status, subcategories};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

/// Main render dispatch function.
///
/// Handles terminal size validation before rendering.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // At truly minimal dimensions, we can't render anything meaningful
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        // Mouse hit testing must not use a stale list area
        if let Some(dialog) = app.sort_dialog.as_mut() {
            dialog.list_area = None;
        }
        return;
    }

    render_browse(f, app);

    if app.sort_dialog.is_some() {
        sort_dialog::render(f, app);
    }

    if app.form.is_some() {
        form::render(f, app);
    }

    if app.product_detail.is_some() {
        product_detail::render(f, app);
    }

    // Help goes on top of everything else
    if app.show_help {
        help::render(f, app);
    }
}

/// Render the browse view (three panes + status bar).
fn render_browse(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    render_main_panels(f, app, chunks[0]);
    status::render(f, app, chunks[1]);
}

/// Categories | subcategories | products.
fn render_main_panels(f: &mut Frame, app: &App, area: Rect) {
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(22),
            Constraint::Percentage(28),
            Constraint::Percentage(50),
        ])
        .split(area);

    categories::render(f, app, main_chunks[0]);
    subcategories::render(f, app, main_chunks[1]);
    products::render(f, app, main_chunks[2]);
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Create a centered rectangle of a fixed size, shrunk to fit the area.
pub(super) fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
