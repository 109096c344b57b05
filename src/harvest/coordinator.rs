//! Harvester - category-to-records orchestration
//!
//! One harvest run:
//! - resolves the requested category (and subcategory) on the main context
//! - fetches search pages one at a time on that same context
//! - enriches each page through the context pool when asked to
//! - hands every finished record to the sink and returns the statistics

use crate::catalog::{Category, CategoryIndex, SubCategory};
use crate::config::Config;
use crate::harvest::ResultAggregator;
use crate::listing::{ListingDetailEnricher, ListingKind, ListingPageFetcher};
use crate::output::{HarvestStats, RecordSink};
use crate::session::{BrowsingSession, ContextHandle};
use crate::url::transform;
use crate::{HarvestError, Result};
use futures::future::Either;
use std::sync::Arc;

/// What to harvest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    /// Display name or slug of a top-level category
    pub category: String,
    /// Display name or slug of one of its subcategories
    pub subcategory: Option<String>,
    /// Overrides `[harvest] max-pages`
    pub max_pages: Option<u32>,
    /// Emit enriched details instead of summaries
    pub enrich: bool,
}

impl HarvestRequest {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: None,
            max_pages: None,
            enrich: false,
        }
    }

    pub fn subcategory(mut self, name: impl Into<String>) -> Self {
        self.subcategory = Some(name.into());
        self
    }

    pub fn max_pages(mut self, pages: u32) -> Self {
        self.max_pages = Some(pages);
        self
    }

    pub fn enrich(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }
}

/// The search target a run paginates
#[derive(Clone, Copy)]
enum Target<'a> {
    Category(&'a Category),
    SubCategory(&'a SubCategory),
}

impl Target<'_> {
    fn slug(&self) -> &str {
        match self {
            Self::Category(category) => &category.slug,
            Self::SubCategory(sub) => &sub.slug,
        }
    }
}

/// Main harvest coordinator
///
/// Owns one main context for category and search navigation. Enrichment never
/// touches it; it runs in pooled contexts of its own.
pub struct Harvester {
    session: Arc<dyn BrowsingSession>,
    config: Arc<Config>,
    index: CategoryIndex,
    fetcher: ListingPageFetcher,
    enricher: ListingDetailEnricher,
    ctx: ContextHandle,
}

impl Harvester {
    /// Creates a harvester and opens its main context
    pub async fn new(session: Arc<dyn BrowsingSession>, config: Arc<Config>) -> Result<Self> {
        let ctx = session.open_isolated_context().await?;
        tracing::debug!("Main context is {:?}", ctx);

        Ok(Self {
            index: CategoryIndex::new(Arc::clone(&session), Arc::clone(&config)),
            fetcher: ListingPageFetcher::new(Arc::clone(&session), Arc::clone(&config))?,
            enricher: ListingDetailEnricher::new(Arc::clone(&session), Arc::clone(&config)),
            session,
            config,
            ctx,
        })
    }

    /// Top-level categories of the site
    pub async fn list_categories(&mut self) -> Result<Vec<Category>> {
        Ok(self.index.list_categories(self.ctx).await?.to_vec())
    }

    /// Resolves a category by display name or slug
    ///
    /// Slugs of the category and its subcategories missing from the id
    /// mapping are reported as warnings here, before any search needs them.
    pub async fn resolve(&mut self, name: &str) -> Result<Category> {
        let category = self.index.resolve(self.ctx, &transform(name)).await?;

        let unmapped = self
            .fetcher
            .ids()
            .unmapped_slugs(std::slice::from_ref(&category));
        if !unmapped.is_empty() {
            tracing::warn!(
                "No category id for {}; searching them will fail",
                unmapped.join(", ")
            );
        }
        Ok(category)
    }

    /// Runs one harvest, streaming records into `sink`
    ///
    /// Pagination stops at the first empty page, at the page limit, or at the
    /// first page that cannot be fetched (counted in the statistics).
    /// Resolution and id mapping errors are returned.
    pub async fn harvest(
        &mut self,
        request: &HarvestRequest,
        sink: &mut dyn RecordSink,
    ) -> Result<HarvestStats> {
        let category = self.resolve(&request.category).await?;
        for sub in &category.sub_categories {
            tracing::info!("  {} ({})", sub.display_name, sub.slug);
        }

        let target = match &request.subcategory {
            Some(name) => {
                let slug = transform(name);
                let sub = category
                    .sub_category(&slug)
                    .ok_or(HarvestError::NotFound { slug })?;
                Target::SubCategory(sub)
            }
            None => Target::Category(&category),
        };

        let kind = ListingKind::for_category(&category.slug, &self.config.harvest.vehicle_categories);
        let max_pages = request.max_pages.unwrap_or(self.config.harvest.max_pages);
        tracing::info!(
            "Harvesting '{}' ({} listings, up to {} pages{})",
            target.slug(),
            kind,
            max_pages,
            if request.enrich { ", enriched" } else { "" }
        );

        let pages = match target {
            Target::Category(category) => {
                Either::Left(self.fetcher.pages(self.ctx, category, max_pages))
            }
            Target::SubCategory(sub) => {
                Either::Right(self.fetcher.subcategory_pages(self.ctx, sub, max_pages))
            }
        };

        let mut aggregator = ResultAggregator::new(sink, target.slug());
        if request.enrich {
            aggregator
                .collect_enriched(pages, &self.enricher, kind)
                .await?;
        } else {
            aggregator.collect(pages).await?;
        }

        let stats = aggregator.into_stats();
        tracing::info!(
            "Harvest of '{}' finished: {} records from {} pages",
            stats.category,
            stats.records_emitted,
            stats.pages_fetched
        );
        Ok(stats)
    }

    /// Closes the main context
    pub async fn close(self) -> Result<()> {
        self.session.close_context(self.ctx).await?;
        Ok(())
    }
}
