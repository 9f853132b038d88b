//! Shared helpers: backend URL normalisation and terminal text fitting.

mod base_url;
mod text;

pub use base_url::{parse_base_url, BaseUrlError};
pub use text::{display_width, strip_control_chars, truncate_to_width};
