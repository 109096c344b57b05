use crate::url::transform;
use serde::Serialize;

/// A top-level category of the site
///
/// Created once per traversal of the tree and never mutated afterwards.
/// `sub_categories` stays empty until the category is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub display_name: String,
    /// Always `transform(display_name)`
    pub slug: String,
    pub canonical_url: String,
    /// In the order the site presents them
    pub sub_categories: Vec<SubCategory>,
}

impl Category {
    /// Creates an unresolved category, deriving its slug from the name
    pub fn new(display_name: impl Into<String>, canonical_url: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            slug: transform(&display_name),
            display_name,
            canonical_url: canonical_url.into(),
            sub_categories: Vec::new(),
        }
    }

    /// Returns a copy carrying the given subcategories
    pub fn with_sub_categories(&self, sub_categories: Vec<SubCategory>) -> Self {
        Self {
            sub_categories,
            ..self.clone()
        }
    }

    /// Finds a subcategory by slug
    pub fn sub_category(&self, slug: &str) -> Option<&SubCategory> {
        self.sub_categories.iter().find(|sub| sub.slug == slug)
    }
}

/// A subcategory listed on its parent category's page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubCategory {
    pub display_name: String,
    pub slug: String,
    pub canonical_url: String,
}

impl SubCategory {
    pub fn new(display_name: impl Into<String>, canonical_url: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            slug: transform(&display_name),
            display_name,
            canonical_url: canonical_url.into(),
        }
    }
}
