//! Search page retrieval

use crate::catalog::{Category, CategoryIdMapping, SubCategory};
use crate::config::Config;
use crate::listing::extract::Extractor;
use crate::listing::ListingSummary;
use crate::session::{reach, BrowsingSession, ContextHandle, ElementHandle};
use crate::url::search_address;
use crate::{HarvestError, Result};
use futures::stream::{self, Stream};
use std::sync::Arc;
use url::Url;

/// Retrieves pages of listing summaries from category search pages
pub struct ListingPageFetcher {
    session: Arc<dyn BrowsingSession>,
    config: Arc<Config>,
    ids: CategoryIdMapping,
    base: Url,
}

impl ListingPageFetcher {
    /// Creates a fetcher using the id table and base address from `config`
    pub fn new(session: Arc<dyn BrowsingSession>, config: Arc<Config>) -> Result<Self> {
        let base = Url::parse(&config.site.base_url)?;
        let ids = CategoryIdMapping::new(config.category_ids.clone());
        Ok(Self {
            session,
            config,
            ids,
            base,
        })
    }

    pub fn ids(&self) -> &CategoryIdMapping {
        &self.ids
    }

    /// Search address of one page of the category with this slug
    ///
    /// # Errors
    ///
    /// * `InvalidPage` - `page` is 0
    /// * `UnmappedCategory` - the slug has no id
    pub fn search_url(&self, slug: &str, page: u32) -> Result<Url> {
        if page == 0 {
            return Err(HarvestError::InvalidPage(page));
        }
        let category_id = self.ids.require(slug)?;
        Ok(search_address(
            &self.base,
            &self.config.site.search_path,
            slug,
            category_id,
            page,
        )?)
    }

    /// One page of summaries of a category, in the site's order
    ///
    /// A page past the last one yields an empty list.
    pub async fn fetch_page(
        &self,
        ctx: ContextHandle,
        category: &Category,
        page: u32,
    ) -> Result<Vec<ListingSummary>> {
        self.fetch(ctx, &category.slug, page).await
    }

    /// One page of summaries of a subcategory
    pub async fn fetch_subcategory_page(
        &self,
        ctx: ContextHandle,
        sub_category: &SubCategory,
        page: u32,
    ) -> Result<Vec<ListingSummary>> {
        self.fetch(ctx, &sub_category.slug, page).await
    }

    /// Lazy sequence of pages of a category starting at page 1
    ///
    /// Ends at the first empty page (not yielded) or after `max_pages`. A
    /// failure is yielded as the last item.
    pub fn pages<'a>(
        &'a self,
        ctx: ContextHandle,
        category: &'a Category,
        max_pages: u32,
    ) -> impl Stream<Item = Result<Vec<ListingSummary>>> + 'a {
        self.pages_of(ctx, &category.slug, max_pages)
    }

    /// Lazy sequence of pages of a subcategory, ending like [`Self::pages`]
    pub fn subcategory_pages<'a>(
        &'a self,
        ctx: ContextHandle,
        sub_category: &'a SubCategory,
        max_pages: u32,
    ) -> impl Stream<Item = Result<Vec<ListingSummary>>> + 'a {
        self.pages_of(ctx, &sub_category.slug, max_pages)
    }

    fn pages_of<'a>(
        &'a self,
        ctx: ContextHandle,
        slug: &'a str,
        max_pages: u32,
    ) -> impl Stream<Item = Result<Vec<ListingSummary>>> + 'a {
        stream::unfold(Some(1u32), move |next| async move {
            let page = next.filter(|page| *page <= max_pages)?;
            match self.fetch(ctx, slug, page).await {
                Ok(summaries) if summaries.is_empty() => {
                    tracing::debug!("Page {} of '{}' is empty, no more pages", page, slug);
                    None
                }
                Ok(summaries) => Some((Ok(summaries), Some(page + 1))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    async fn fetch(&self, ctx: ContextHandle, slug: &str, page: u32) -> Result<Vec<ListingSummary>> {
        let url = self.search_url(slug, page)?;
        let selectors = &self.config.selectors;

        let navigation = reach(
            self.session.as_ref(),
            ctx,
            url.as_str(),
            &selectors.search_ready,
            &self.config.session,
        )
        .await
        .map_err(|e| HarvestError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let page_url = Url::parse(&navigation.final_url)?;
        let extractor = Extractor::new(self.session.as_ref(), ctx, &page_url);

        let entries = self
            .session
            .query_all(ctx, None, &selectors.listing_entry)
            .await?;

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.read_entry(&extractor, entry).await {
                Some(summary) => summaries.push(summary),
                None => tracing::debug!("Dropping entry without a listing address on {}", url),
            }
        }

        tracing::info!(
            "Fetched {} summaries from '{}' page {}",
            summaries.len(),
            slug,
            page
        );
        Ok(summaries)
    }

    /// Reads one entry; None when it has no resolvable address
    async fn read_entry(&self, extractor: &Extractor<'_>, entry: ElementHandle) -> Option<ListingSummary> {
        let selectors = &self.config.selectors;
        let scope = Some(entry);

        let url = extractor
            .link(scope, &selectors.listing_url, &["href"])
            .await
            .into_option()?;

        let summary = ListingSummary {
            title: extractor.text(scope, &selectors.listing_title).await,
            price: extractor.text(scope, &selectors.listing_price).await,
            location: extractor.text(scope, &selectors.listing_location).await,
            cover_image_url: extractor
                .link(scope, &selectors.listing_image, &["src", "data-src"])
                .await,
            short_description: extractor.text(scope, &selectors.listing_description).await,
            url,
        };

        let gaps = summary.gaps();
        if !gaps.is_empty() {
            tracing::debug!("{} is missing {}", summary.url, gaps.join(", "));
        }
        Some(summary)
    }
}
