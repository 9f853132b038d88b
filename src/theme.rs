//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes,
//! and `StyleMap` resolves role names to concrete styles.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Build the `ColorPalette` for this variant.
    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Human-readable name for status display.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette: semantic roles to Style
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Category / subcategory / product lists --
    pub item_normal: Style,
    pub item_selected: Style,
    pub item_inactive: Style,
    pub item_code: Style,
    pub product_price: Style,

    // -- Sort dialog --
    pub sort_row: Style,
    pub sort_dragging: Style,
    pub sort_modified: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub panel_title: Style,
    pub hint: Style,

    // -- Dialogs --
    pub dialog_title: Style,
    pub dialog_body: Style,
    pub dialog_field: Style,
    pub dialog_field_active: Style,
    pub dialog_error: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            item_normal: Style::default(),
            item_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            item_inactive: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
            item_code: Style::default().fg(Color::Cyan),
            product_price: Style::default().fg(Color::Yellow),

            sort_row: Style::default(),
            sort_dragging: Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            sort_modified: Style::default().fg(Color::Yellow),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            panel_title: Style::default().add_modifier(Modifier::BOLD),
            hint: Style::default().fg(Color::DarkGray),

            dialog_title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            dialog_body: Style::default(),
            dialog_field: Style::default().fg(Color::Gray),
            dialog_field_active: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            dialog_error: Style::default().fg(Color::Red),
        }
    }

    /// Light palette, adapted for light terminal backgrounds.
    fn light() -> Self {
        Self {
            item_normal: Style::default().fg(Color::Black),
            item_selected: Style::default().bg(Color::Blue).fg(Color::White),
            item_inactive: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::CROSSED_OUT),
            item_code: Style::default().fg(Color::Blue),
            product_price: Style::default().fg(Color::Magenta),

            sort_row: Style::default().fg(Color::Black),
            sort_dragging: Style::default()
                .bg(Color::Magenta)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            sort_modified: Style::default().fg(Color::Magenta),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            panel_title: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            hint: Style::default().fg(Color::DarkGray),

            dialog_title: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            dialog_body: Style::default().fg(Color::Black),
            dialog_field: Style::default().fg(Color::DarkGray),
            dialog_field_active: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            dialog_error: Style::default().fg(Color::Red),
        }
    }
}

// ============================================================================
// Style Map: string-keyed lookup
// ============================================================================

/// String-keyed style lookup, built from a `ColorPalette`.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

/// All semantic role names, in declaration order.
const ROLE_NAMES: [&str; 18] = [
    "item_normal",
    "item_selected",
    "item_inactive",
    "item_code",
    "product_price",
    "sort_row",
    "sort_dragging",
    "sort_modified",
    "status_bar",
    "panel_border",
    "panel_border_focused",
    "panel_title",
    "hint",
    "dialog_title",
    "dialog_body",
    "dialog_field",
    "dialog_field_active",
    "dialog_error",
];

impl StyleMap {
    /// Build a `StyleMap` from a `ColorPalette`.
    pub fn from_palette(p: &ColorPalette) -> Self {
        let styles: [Style; 18] = [
            p.item_normal,
            p.item_selected,
            p.item_inactive,
            p.item_code,
            p.product_price,
            p.sort_row,
            p.sort_dragging,
            p.sort_modified,
            p.status_bar,
            p.panel_border,
            p.panel_border_focused,
            p.panel_title,
            p.hint,
            p.dialog_title,
            p.dialog_body,
            p.dialog_field,
            p.dialog_field_active,
            p.dialog_error,
        ];

        let mut map = HashMap::with_capacity(ROLE_NAMES.len());
        for (name, style) in ROLE_NAMES.iter().zip(styles.iter()) {
            map.insert(*name, *style);
        }

        Self { map }
    }

    /// Resolve a role name to its `Style`. Returns `Style::default()` for unknown roles.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
