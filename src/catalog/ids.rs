use crate::catalog::Category;
use crate::HarvestError;
use std::collections::BTreeMap;

/// Slug to numeric category id table
///
/// Supplied from configuration and read-only for the engine. A slug missing
/// here is a data error in the table, reported as
/// [`HarvestError::UnmappedCategory`] rather than as an unknown category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryIdMapping {
    ids: BTreeMap<String, u32>,
}

impl CategoryIdMapping {
    pub fn new(ids: BTreeMap<String, u32>) -> Self {
        Self { ids }
    }

    /// Builds a mapping from `(slug, id)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        Self {
            ids: pairs.into_iter().map(|(slug, id)| (slug.into(), id)).collect(),
        }
    }

    pub fn get(&self, slug: &str) -> Option<u32> {
        self.ids.get(slug).copied()
    }

    /// Looks up a slug that must be mapped
    pub fn require(&self, slug: &str) -> Result<u32, HarvestError> {
        self.get(slug).ok_or_else(|| HarvestError::UnmappedCategory {
            slug: slug.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Slugs of the given categories and their subcategories with no id
    pub fn unmapped_slugs(&self, categories: &[Category]) -> Vec<String> {
        categories
            .iter()
            .flat_map(|category| {
                std::iter::once(category.slug.as_str())
                    .chain(category.sub_categories.iter().map(|sub| sub.slug.as_str()))
            })
            .filter(|slug| !self.ids.contains_key(*slug))
            .map(|slug| slug.to_string())
            .collect()
    }
}
