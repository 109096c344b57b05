//! Detail page extraction
//!
//! Generic listings get a description, gallery and subcategory. Vehicle
//! listings additionally get the characteristics table and the gear and
//! warnings lists. Each of these steps fails on its own into a gap.

use crate::config::Config;
use crate::listing::extract::{pair_cells, Extractor};
use crate::listing::{Field, ListingDetail, ListingKind, ListingSummary, VehicleAttributes};
use crate::session::{reach, BrowsingSession, ContextHandle, ContextPool, ElementHandle};
use crate::url::subcategory_from_url;
use crate::{HarvestError, Result};
use std::sync::Arc;
use url::Url;

/// Turns summaries into detail records
pub struct ListingDetailEnricher {
    session: Arc<dyn BrowsingSession>,
    config: Arc<Config>,
    pool: ContextPool,
}

impl ListingDetailEnricher {
    /// Creates an enricher whose pool is sized by `[enrichment] max-open-contexts`
    pub fn new(session: Arc<dyn BrowsingSession>, config: Arc<Config>) -> Self {
        let pool = ContextPool::new(
            Arc::clone(&session),
            config.enrichment.max_open_contexts as usize,
        );
        Self {
            session,
            config,
            pool,
        }
    }

    /// Pool used by [`ListingDetailEnricher::enrich_isolated`]
    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    /// Enriches a summary by visiting its detail page in `ctx`
    ///
    /// The returned detail carries `summary` unchanged.
    ///
    /// # Errors
    ///
    /// * `DetailUnavailable` - the detail page could not be reached or never
    ///   showed its marker; the caller skips this summary
    pub async fn enrich(
        &self,
        ctx: ContextHandle,
        summary: &ListingSummary,
        kind: ListingKind,
    ) -> Result<ListingDetail> {
        let selectors = &self.config.selectors;
        let unavailable = |reason: String| HarvestError::DetailUnavailable {
            url: summary.url.clone(),
            reason,
        };

        let navigation = reach(
            self.session.as_ref(),
            ctx,
            &summary.url,
            &selectors.detail_ready,
            &self.config.session,
        )
        .await
        .map_err(|e| unavailable(e.to_string()))?;
        let page_url = Url::parse(&navigation.final_url).map_err(|e| unavailable(e.to_string()))?;
        let extractor = Extractor::new(self.session.as_ref(), ctx, &page_url);

        let vehicle = match kind {
            ListingKind::Generic => None,
            ListingKind::Vehicle => Some(self.vehicle_attributes(&extractor).await),
        };

        let detail = ListingDetail {
            summary: summary.clone(),
            full_description: extractor.text(None, &selectors.detail_description).await,
            images: extractor
                .links(None, &selectors.detail_gallery_image, &["src", "data-src"])
                .await,
            subcategory: subcategory_from_url(&summary.url).into(),
            vehicle,
        };

        let gaps = detail.gaps();
        if gaps.is_empty() {
            tracing::debug!("Enriched {} as {}", detail.url(), kind);
        } else {
            tracing::debug!(
                "Enriched {} as {}, missing {}",
                detail.url(),
                kind,
                gaps.join(", ")
            );
        }
        Ok(detail)
    }

    /// Enriches a summary in a context of its own, checked out of the pool
    ///
    /// The context is closed afterwards on every path. Failing to get a
    /// context also counts as the detail being unavailable.
    pub async fn enrich_isolated(
        &self,
        summary: &ListingSummary,
        kind: ListingKind,
    ) -> Result<ListingDetail> {
        self.pool
            .with_context(|ctx| self.enrich(ctx, summary, kind))
            .await
            .map_err(|e| match e {
                HarvestError::Session(e) => HarvestError::DetailUnavailable {
                    url: summary.url.clone(),
                    reason: e.to_string(),
                },
                other => other,
            })
    }

    async fn vehicle_attributes(&self, extractor: &Extractor<'_>) -> VehicleAttributes {
        let selectors = &self.config.selectors;

        let characteristics = match extractor.one(None, &selectors.vehicle_table).await {
            Some(table) => extractor
                .cell_texts(Some(table), &selectors.vehicle_table_cell)
                .await
                .map(pair_cells)
                .into(),
            None => Field::Absent,
        };

        let sections = extractor
            .all(None, &selectors.description_section)
            .await
            .unwrap_or_default();

        VehicleAttributes {
            characteristics,
            gear: self
                .section_items(extractor, &sections, selectors.gear_section_index)
                .await,
            warnings: self
                .section_items(extractor, &sections, selectors.warnings_section_index)
                .await,
        }
    }

    /// Bullet items of the description section at `index`
    async fn section_items(
        &self,
        extractor: &Extractor<'_>,
        sections: &[ElementHandle],
        index: usize,
    ) -> Field<Vec<String>> {
        match sections.get(index) {
            Some(&section) => {
                extractor
                    .texts(Some(section), &self.config.selectors.description_section_item)
                    .await
            }
            None => Field::Absent,
        }
    }
}
