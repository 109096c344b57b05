//! Category catalog
//!
//! The site's two-level category tree and the slug to numeric id table that
//! search addresses are built from.

mod category;
mod ids;
mod index;

pub use category::{Category, SubCategory};
pub use ids::CategoryIdMapping;
pub use index::CategoryIndex;
