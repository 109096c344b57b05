//! URL handling module for KP-Harvest
//!
//! This module provides slug transliteration, search address construction,
//! link resolution and path-derived fields.

mod address;
mod slug;

// Re-export main functions
pub use address::{resolve_href, search_address, subcategory_from_url};
pub use slug::transform;
