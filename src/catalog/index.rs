//! Category tree discovery and resolution

use crate::catalog::{Category, SubCategory};
use crate::config::Config;
use crate::session::{reach, BrowsingSession, ContextHandle, ElementHandle};
use crate::url::{resolve_href, transform};
use crate::{HarvestError, Result};
use std::sync::Arc;
use url::Url;

/// Holds the category tree of the site
///
/// Both operations navigate the context they are given, so the cursor of
/// that context is somewhere else afterwards.
pub struct CategoryIndex {
    session: Arc<dyn BrowsingSession>,
    config: Arc<Config>,
    categories: Option<Vec<Category>>,
}

impl CategoryIndex {
    pub fn new(session: Arc<dyn BrowsingSession>, config: Arc<Config>) -> Self {
        Self {
            session,
            config,
            categories: None,
        }
    }

    /// Top-level categories in site order, fetched on first use
    ///
    /// Subcategories are left empty; use [`CategoryIndex::resolve`] for them.
    pub async fn list_categories(&mut self, ctx: ContextHandle) -> Result<&[Category]> {
        if self.categories.is_none() {
            let categories = self.fetch_categories(ctx).await?;
            tracing::info!("Found {} top-level categories", categories.len());
            self.categories = Some(categories);
        }
        Ok(self.categories.as_deref().unwrap_or_default())
    }

    /// Looks up a listed category without navigating
    pub fn lookup(&self, slug: &str) -> Option<&Category> {
        self.categories
            .as_ref()?
            .iter()
            .find(|category| category.slug == slug)
    }

    /// Resolves a category by slug, reading its subcategories from its page
    ///
    /// # Errors
    ///
    /// * `NotFound` - no listed category has this slug
    /// * `Navigation` - the category page could not be reached in time
    pub async fn resolve(&mut self, ctx: ContextHandle, slug: &str) -> Result<Category> {
        self.list_categories(ctx).await?;
        let category = self
            .lookup(slug)
            .cloned()
            .ok_or_else(|| HarvestError::NotFound {
                slug: slug.to_string(),
            })?;

        let selectors = &self.config.selectors;
        let page_url = self
            .reach(ctx, &category.canonical_url, &selectors.subcategory_name)
            .await?;

        let elements = self
            .session
            .query_all(ctx, None, &selectors.subcategory_name)
            .await?;
        let sub_categories = self
            .read_links(ctx, &elements, &page_url)
            .await
            .into_iter()
            .map(|(name, url)| SubCategory::new(name, url))
            .collect::<Vec<_>>();

        tracing::info!(
            "Resolved '{}' with {} subcategories",
            category.display_name,
            sub_categories.len()
        );
        Ok(category.with_sub_categories(sub_categories))
    }

    /// Resolves a category by its display name
    pub async fn resolve_name(&mut self, ctx: ContextHandle, display_name: &str) -> Result<Category> {
        let slug = transform(display_name);
        self.resolve(ctx, &slug).await
    }

    async fn fetch_categories(&self, ctx: ContextHandle) -> Result<Vec<Category>> {
        let selectors = &self.config.selectors;
        let page_url = self
            .reach(ctx, &self.config.site.base_url, &selectors.category_list)
            .await?;

        let container = self
            .session
            .query_one(ctx, None, &selectors.category_list)
            .await?;
        let elements = match container {
            Some(container) => {
                self.session
                    .query_all(ctx, Some(container), &selectors.category_name)
                    .await?
            }
            None => Vec::new(),
        };

        Ok(self
            .read_links(ctx, &elements, &page_url)
            .await
            .into_iter()
            .map(|(name, url)| Category::new(name, url))
            .collect())
    }

    /// Navigates and waits for `marker`, returning the address links resolve against
    async fn reach(&self, ctx: ContextHandle, url: &str, marker: &str) -> Result<Url> {
        let navigation = reach(self.session.as_ref(), ctx, url, marker, &self.config.session)
            .await
            .map_err(|e| HarvestError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Url::parse(&navigation.final_url)?)
    }

    /// Reads `(name, absolute url)` pairs from link elements, skipping any
    /// without a name or a usable href
    async fn read_links(
        &self,
        ctx: ContextHandle,
        elements: &[ElementHandle],
        page_url: &Url,
    ) -> Vec<(String, String)> {
        let mut links = Vec::with_capacity(elements.len());

        for &element in elements {
            let name = self
                .session
                .extract_text(ctx, element)
                .await
                .ok()
                .flatten()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());
            let url = self
                .session
                .extract_attribute(ctx, element, "href")
                .await
                .ok()
                .flatten()
                .and_then(|href| resolve_href(&href, page_url));

            match (name, url) {
                (Some(name), Some(url)) => links.push((name, url)),
                (name, _) => tracing::debug!("Skipping category link without href: {:?}", name),
            }
        }

        links
    }
}
