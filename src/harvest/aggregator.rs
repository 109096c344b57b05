use crate::listing::{ListingDetail, ListingDetailEnricher, ListingKind, ListingSummary};
use crate::output::{HarvestStats, Record, RecordSink};
use crate::{HarvestError, Result};
use futures::stream::{self, Stream, StreamExt};
use std::collections::HashSet;
use std::pin::pin;

/// Merges pages into one ordered, duplicate-free record stream
///
/// Records reach the sink as soon as they are finished, one `append` per
/// record. The aggregator keeps only the urls it has seen.
pub struct ResultAggregator<'s> {
    sink: &'s mut dyn RecordSink,
    seen: HashSet<String>,
    stats: HarvestStats,
}

impl<'s> ResultAggregator<'s> {
    pub fn new(sink: &'s mut dyn RecordSink, category: &str) -> Self {
        Self {
            sink,
            seen: HashSet::new(),
            stats: HarvestStats::new(category),
        }
    }

    pub fn stats(&self) -> &HarvestStats {
        &self.stats
    }

    /// Stops counting and returns the finished statistics
    pub fn into_stats(mut self) -> HarvestStats {
        self.stats.finish();
        self.stats
    }

    /// Counts a search page that could not be fetched
    pub fn page_failed(&mut self) {
        self.stats.pages_failed += 1;
    }

    /// Emits the new summaries of a page and returns them
    pub fn push_page(&mut self, page: Vec<ListingSummary>) -> Result<Vec<ListingSummary>> {
        let admitted = self.admit(page);
        for summary in &admitted {
            self.emit(Record::Summary(summary.clone()))?;
        }
        Ok(admitted)
    }

    /// Enriches the new summaries of a page and emits the details
    ///
    /// Up to the pool size of summaries are enriched at once; details are
    /// still emitted in the order of the page. A summary whose detail page is
    /// unavailable is skipped. Any other error aborts the page.
    pub async fn push_enriched_page(
        &mut self,
        page: Vec<ListingSummary>,
        enricher: &ListingDetailEnricher,
        kind: ListingKind,
    ) -> Result<Vec<ListingDetail>> {
        let admitted = self.admit(page);
        let mut results = pin!(stream::iter(&admitted)
            .map(|summary| enricher.enrich_isolated(summary, kind))
            .buffered(enricher.pool().size()));

        let mut details = Vec::with_capacity(admitted.len());
        while let Some(result) = results.next().await {
            match result {
                Ok(detail) => {
                    self.stats.details_enriched += 1;
                    self.emit(Record::Detail(detail.clone()))?;
                    details.push(detail);
                }
                Err(HarvestError::DetailUnavailable { url, reason }) => {
                    self.stats.details_skipped += 1;
                    tracing::warn!("Skipping {}: {}", url, reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(details)
    }

    /// Drains a page stream, emitting summaries
    ///
    /// A page that fails to load is counted and ends the harvest without an
    /// error; any other failure is returned.
    pub async fn collect<S>(&mut self, pages: S) -> Result<Vec<ListingSummary>>
    where
        S: Stream<Item = Result<Vec<ListingSummary>>>,
    {
        let mut pages = pin!(pages);
        let mut summaries = Vec::new();
        while let Some(page) = pages.next().await {
            match self.accept(page)? {
                Some(page) => summaries.extend(self.push_page(page)?),
                None => break,
            }
        }
        Ok(summaries)
    }

    /// Drains a page stream, enriching each page before the next is pulled
    ///
    /// Failures end the harvest the way they do in [`Self::collect`].
    pub async fn collect_enriched<S>(
        &mut self,
        pages: S,
        enricher: &ListingDetailEnricher,
        kind: ListingKind,
    ) -> Result<Vec<ListingDetail>>
    where
        S: Stream<Item = Result<Vec<ListingSummary>>>,
    {
        let mut pages = pin!(pages);
        let mut details = Vec::new();
        while let Some(page) = pages.next().await {
            match self.accept(page)? {
                Some(page) => details.extend(self.push_enriched_page(page, enricher, kind).await?),
                None => break,
            }
        }
        Ok(details)
    }

    /// None when the page could not be loaded
    fn accept(
        &mut self,
        page: Result<Vec<ListingSummary>>,
    ) -> Result<Option<Vec<ListingSummary>>> {
        match page {
            Ok(page) => Ok(Some(page)),
            Err(e @ HarvestError::Navigation { .. }) => {
                tracing::warn!("Stopping: {}", e);
                self.page_failed();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Counts a page and keeps only summaries with an unseen url
    fn admit(&mut self, page: Vec<ListingSummary>) -> Vec<ListingSummary> {
        if !page.is_empty() {
            self.stats.pages_fetched += 1;
        }
        self.stats.summaries_seen += page.len() as u64;

        let before = page.len();
        let admitted: Vec<_> = page
            .into_iter()
            .filter(|summary| self.seen.insert(summary.url.clone()))
            .collect();

        let dropped = (before - admitted.len()) as u64;
        if dropped > 0 {
            tracing::debug!("Dropped {} duplicate listings", dropped);
            self.stats.duplicates_dropped += dropped;
        }
        admitted
    }

    fn emit(&mut self, record: Record) -> Result<()> {
        self.sink.append(&record)?;
        self.stats.records_emitted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::listing::{Field, ListingPageFetcher};
    use crate::output::MemorySink;
    use crate::session::testing::{html_page, html_response, mount, test_config};
    use crate::session::{BrowsingSession, HtmlSession};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer};

    fn summaries(urls: &[&str]) -> Vec<ListingSummary> {
        urls.iter().map(|url| ListingSummary::new(*url)).collect()
    }

    fn detail_page(description: &str) -> String {
        html_page(&format!(
            r#"<div class="AdViewInfo_adView__sJnPK">
                <div class="AdViewDescription_descriptionHolder__9hET7">{}</div>
            </div>"#,
            description
        ))
    }

    #[tokio::test]
    async fn test_collect_drops_duplicates_across_pages() {
        let mut sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(&mut sink, "alati-i-orudja");
        let pages = stream::iter(vec![
            Ok(summaries(&["https://kp.test/a", "https://kp.test/b", "https://kp.test/a"])),
            Ok(summaries(&["https://kp.test/c", "https://kp.test/b"])),
        ]);

        let collected = aggregator.collect(pages).await.unwrap();
        let stats = aggregator.into_stats();

        let urls: Vec<_> = collected.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://kp.test/a", "https://kp.test/b", "https://kp.test/c"]);
        assert_eq!(stats.pages_fetched, 2);
        assert_eq!(stats.summaries_seen, 5);
        assert_eq!(stats.duplicates_dropped, 2);
        assert_eq!(stats.records_emitted, 3);
        assert!(stats.finished_at.is_some());

        let emitted: Vec<_> = sink.records().iter().map(|r| r.url()).collect();
        assert_eq!(emitted, urls);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(&mut sink, "alati-i-orudja");
        let mut first = ListingSummary::new("https://kp.test/a");
        first.title = Field::Present("prvi".to_string());
        let mut second = ListingSummary::new("https://kp.test/a");
        second.title = Field::Present("drugi".to_string());

        let admitted = aggregator.push_page(vec![first, second]).unwrap();

        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].title, Field::Present("prvi".to_string()));
    }

    #[tokio::test]
    async fn test_enriched_page_keeps_order_and_skips_unavailable() {
        let server = MockServer::start().await;
        // The first listing answers last
        Mock::given(method("GET"))
            .and(path("/alati-i-orudja/busilice/oglas/spora/1"))
            .respond_with(
                html_response(&detail_page("spora")).set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        mount(&server, "/alati-i-orudja/testere/oglas/brza/2", &detail_page("brza")).await;
        mount(&server, "/alati-i-orudja/kljucevi/oglas/treca/4", &detail_page("treca")).await;

        let session = Arc::new(HtmlSession::new(reqwest::Client::new()));
        let config = test_config(&server.uri(), "[enrichment]\nmax-open-contexts = 3\n");
        let enricher = ListingDetailEnricher::new(session.clone(), config);

        let base = server.uri();
        let urls = [
            format!("{}/alati-i-orudja/busilice/oglas/spora/1", base),
            format!("{}/alati-i-orudja/testere/oglas/brza/2", base),
            format!("{}/alati-i-orudja/nestao/oglas/nema/3", base),
            format!("{}/alati-i-orudja/kljucevi/oglas/treca/4", base),
        ];
        let page = urls.iter().map(|url| ListingSummary::new(url.as_str())).collect();

        let mut sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(&mut sink, "alati-i-orudja");
        let details = aggregator
            .push_enriched_page(page, &enricher, ListingKind::Generic)
            .await
            .unwrap();
        let stats = aggregator.into_stats();

        let descriptions: Vec<_> = details
            .iter()
            .map(|d| d.full_description.value_or_default())
            .collect();
        assert_eq!(descriptions, vec!["spora", "brza", "treca"]);
        assert_eq!(stats.details_enriched, 3);
        assert_eq!(stats.details_skipped, 1);
        assert_eq!(stats.records_emitted, 3);
        assert_eq!(sink.details().len(), 3);
        assert!(sink.summaries().is_empty());
        assert_eq!(session.open_contexts(), 0);
    }

    #[tokio::test]
    async fn test_collect_enriched_dedupes_before_enriching() {
        let server = MockServer::start().await;
        mount(&server, "/alati-i-orudja/busilice/oglas/a/1", &detail_page("a")).await;

        let session = Arc::new(HtmlSession::new(reqwest::Client::new()));
        let enricher = ListingDetailEnricher::new(session, test_config(&server.uri(), ""));
        let url = format!("{}/alati-i-orudja/busilice/oglas/a/1", server.uri());
        let pages = stream::iter(vec![
            Ok(summaries(&[url.as_str()])),
            Ok(summaries(&[url.as_str()])),
        ]);

        let mut sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(&mut sink, "alati-i-orudja");
        let details = aggregator
            .collect_enriched(pages, &enricher, ListingKind::Generic)
            .await
            .unwrap();

        assert_eq!(details.len(), 1);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_is_counted_and_ends_collection() {
        let mut sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(&mut sink, "alati-i-orudja");
        let pages = stream::iter(vec![
            Ok(summaries(&["https://kp.test/a"])),
            Err(HarvestError::Navigation {
                url: "https://kp.test/alati-i-orudja/pretraga?page=2".to_string(),
                reason: "HTTP 503".to_string(),
            }),
            Ok(summaries(&["https://kp.test/b"])),
        ]);

        let collected = aggregator.collect(pages).await.unwrap();
        let stats = aggregator.into_stats();

        assert_eq!(collected.len(), 1);
        assert_eq!(stats.pages_fetched, 1);
        assert_eq!(stats.pages_failed, 1);
    }

    #[tokio::test]
    async fn test_collect_unmapped_category_is_an_error() {
        let server = MockServer::start().await;
        let session = Arc::new(HtmlSession::new(reqwest::Client::new()));
        let ctx = session.open_isolated_context().await.unwrap();
        let fetcher = ListingPageFetcher::new(session, test_config(&server.uri(), "")).unwrap();
        let category = Category::new("Nekretnine", "https://kp.test/nekretnine");

        let mut sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(&mut sink, "nekretnine");
        let result = aggregator.collect(fetcher.pages(ctx, &category, 5)).await;

        assert!(matches!(
            result,
            Err(HarvestError::UnmappedCategory { slug }) if slug == "nekretnine"
        ));
        assert_eq!(aggregator.stats().pages_failed, 0);
    }

    #[test]
    fn test_empty_page_is_not_counted() {
        let mut sink = MemorySink::new();
        let mut aggregator = ResultAggregator::new(&mut sink, "alati-i-orudja");

        aggregator.push_page(Vec::new()).unwrap();
        assert_eq!(aggregator.stats().pages_fetched, 0);
    }
}
