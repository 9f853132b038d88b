//! Terminal admin console for a product catalog backend.
//!
//! The library holds everything the `catalog-admin` binary uses: the REST
//! client, catalog browsing and reorder state, the TUI, and the visit tracker.

pub mod api;
pub mod app;
pub mod catalog;
pub mod config;
pub mod keybindings;
pub mod theme;
pub mod tracker;
pub mod ui;
pub mod util;
