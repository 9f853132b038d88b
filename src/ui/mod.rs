//! Terminal User Interface module.
//!
//! This module provides the TUI for the catalog admin console, including:
//! - Main event loop (`run`)
//! - Input handling for the browse panes, sort dialog, and add/edit form
//! - Rendering for panes and overlays
//! - Background task event processing
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and mouse input handling
//! - `events` - Background task event processing
//! - `render` - Layout and overlay dispatch
//! - `helpers` - Background task spawning
//! - `categories` / `subcategories` / `products` - Browse panes
//! - `sort_dialog` - Drag-to-sort overlay
//! - `form` - Add/edit overlay
//! - `product_detail` - Read-only product overlay
//! - `status` - Status bar widget
//! - `help` - Keybinding overlay

mod categories;
mod events;
mod form;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod product_detail;
mod products;
mod render;
mod sort_dialog;
mod status;
mod subcategories;

// Re-export the public API
pub use helpers::spawn_reload;
pub use loop_runner::{run, Action};
