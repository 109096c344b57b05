//! Integration tests for the harvester
//!
//! These tests serve a small copy of the classifieds site with wiremock and
//! run category resolution, pagination and enrichment end-to-end.

use kp_harvest::config::{parse_config, Config};
use kp_harvest::output::{JsonLinesSink, MemorySink};
use kp_harvest::{
    BrowsingSession, CategoryIndex, Field, HarvestError, HarvestRequest, Harvester,
    HtmlSession, ListingDetailEnricher, ListingKind, ListingPageFetcher,
};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME: &str = r#"
    <nav class="CategoryList_list__a7SOH">
        <a class="CategoryList_name__ES_NA" href="/alati-i-orudja">Alati i oruđa</a>
        <a class="CategoryList_name__ES_NA" href="/automobili">Automobili</a>
    </nav>"#;

const TOOLS: &str = r#"
    <a class="CategoryBox_name__54eU9" href="/alati-i-orudja/busilice">Bušilice</a>
    <a class="CategoryBox_name__54eU9" href="/alati-i-orudja/testere">Testere</a>"#;

const CARS: &str = r#"
    <a class="CategoryBox_name__54eU9" href="/automobili/audi">Audi</a>"#;

const TOOL_DETAIL: &str = r#"
    <div class="AdViewInfo_adView__sJnPK">
        <div class="AdViewDescription_descriptionHolder__9hET7">Bosch udarna bušilica, 750W.</div>
        <div class="AdViewGallery_thumbnailHolder__kWhwX"><img src="/slike/1.jpg"></div>
        <div class="AdViewGallery_thumbnailHolder__kWhwX"><img src="/slike/2.jpg"></div>
        <div class="AdViewGallery_thumbnailHolder__kWhwX"><img data-src="/slike/3.jpg"></div>
    </div>"#;

const CAR_DETAIL_WITHOUT_TABLE: &str = r#"
    <div class="AdViewInfo_adView__sJnPK">
        <div class="AdViewDescription_descriptionHolder__9hET7">Audi A4 2.0 TDI</div>
        <div class="AdViewGallery_thumbnailHolder__kWhwX"><img src="/slike/audi.jpg"></div>
        <section class="AdViewDescription_section__4hmsO"><ul><li>Opis</li></ul></section>
        <section class="AdViewDescription_section__4hmsO"><ul><li>ABS</li><li>Klima</li></ul></section>
    </div>"#;

fn page(body: &str) -> String {
    format!("<html><head><title>KP</title></head><body>{}</body></html>", body)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(page(body).into_bytes(), "text/html; charset=utf-8")
}

fn entry(href: &str, title: &str, price: &str) -> String {
    format!(
        r#"<article class="AdItem_adHolder__NoNLJ">
            <div class="AdItem_imageHolder__LZaKa"><img src="/slike/mala-{title}.jpg"></div>
            <div class="AdItem_adTextHolder__Fmra9"><a href="{href}"><div class="AdItem_name__RhGAZ">{title}</div></a></div>
            <div class="AdItem_price__jUgxi">{price}</div>
            <div class="AdItem_originAndPromoLocation__nZ2hN"><p>Novi Sad</p></div>
        </article>"#,
        href = href,
        title = title,
        price = price
    )
}

async fn mount(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_search(server: &MockServer, slug: &str, page_number: u32, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{}/pretraga", slug)))
        .and(query_param("page", page_number.to_string()))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Mounts the whole fixture site
async fn start_site() -> MockServer {
    let server = MockServer::start().await;
    mount(&server, "/", HOME).await;
    mount(&server, "/alati-i-orudja", TOOLS).await;
    mount(&server, "/automobili", CARS).await;

    let tools_page_one = [
        entry("/alati-i-orudja/busilice/oglas/bosch-busilica/1001", "bosch", "7.500 din"),
        // No link, so no identity: dropped
        r#"<article class="AdItem_adHolder__NoNLJ"><div class="AdItem_name__RhGAZ">bez linka</div></article>"#
            .to_string(),
        entry("/alati-i-orudja/testere/oglas/lancana-testera/1002", "testera", "12.000 din"),
    ]
    .concat();
    mount_search(&server, "alati-i-orudja", 1, &tools_page_one).await;
    mount_search(&server, "alati-i-orudja", 2, "<p>Nema rezultata</p>").await;
    mount(&server, "/alati-i-orudja/busilice/oglas/bosch-busilica/1001", TOOL_DETAIL).await;
    mount(&server, "/alati-i-orudja/testere/oglas/lancana-testera/1002", TOOL_DETAIL).await;

    let cars_page_one = entry("/automobili/audi/oglas/audi-a4/2001", "audi", "9.900 €");
    mount_search(&server, "automobili", 1, &cars_page_one).await;
    mount(&server, "/automobili/audi/oglas/audi-a4/2001", CAR_DETAIL_WITHOUT_TABLE).await;

    server
}

fn create_test_config(base_url: &str) -> Arc<Config> {
    let config = parse_config(&format!(
        r#"
[site]
base-url = "{}"

[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[session]
navigation-timeout-ms = 5000
ready-timeout-ms = 1000

[enrichment]
max-open-contexts = 2

[harvest]
max-pages = 5

[category-ids]
alati-i-orudja = 10
busilice = 11
automobili = 2013
"#,
        base_url
    ))
    .expect("Failed to parse test config");
    Arc::new(config)
}

#[tokio::test]
async fn test_resolve_fetch_and_enrich_generic() {
    let server = start_site().await;
    let config = create_test_config(&server.uri());
    let session: Arc<dyn BrowsingSession> = Arc::new(HtmlSession::new(reqwest::Client::new()));
    let ctx = session.open_isolated_context().await.unwrap();

    // Resolve by display name
    let mut index = CategoryIndex::new(Arc::clone(&session), Arc::clone(&config));
    let category = index.resolve_name(ctx, "Alati i oruđa").await.unwrap();
    assert_eq!(category.slug, "alati-i-orudja");
    let sub_slugs: Vec<_> = category.sub_categories.iter().map(|s| s.slug.as_str()).collect();
    assert_eq!(sub_slugs, vec!["busilice", "testere"]);

    // Page 1 in site order, entries without an address dropped
    let fetcher = ListingPageFetcher::new(Arc::clone(&session), Arc::clone(&config)).unwrap();
    let summaries = fetcher.fetch_page(ctx, &category, 1).await.unwrap();
    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|s| !s.url.is_empty()));
    assert!(summaries[0].url.ends_with("/alati-i-orudja/busilice/oglas/bosch-busilica/1001"));
    assert!(summaries[1].url.ends_with("/alati-i-orudja/testere/oglas/lancana-testera/1002"));
    assert_eq!(summaries[0].title, Field::Present("bosch".to_string()));
    assert_eq!(summaries[0].price, Field::Present("7.500 din".to_string()));
    assert_eq!(summaries[0].short_description, Field::Absent);

    // Enriching the first as generic
    let enricher = ListingDetailEnricher::new(Arc::clone(&session), Arc::clone(&config));
    let detail = enricher
        .enrich(ctx, &summaries[0], ListingKind::Generic)
        .await
        .unwrap();

    let path_segment = url::Url::parse(&summaries[0].url)
        .unwrap()
        .path_segments()
        .unwrap()
        .nth(1)
        .unwrap()
        .to_string();
    assert_eq!(detail.subcategory, Field::Present(path_segment));
    assert_eq!(detail.images.value_or_default().len(), 3);
    assert_eq!(detail.summary, summaries[0]);
    assert!(detail.vehicle.is_none());
}

#[tokio::test]
async fn test_page_beyond_last_is_empty() {
    let server = start_site().await;
    let config = create_test_config(&server.uri());
    let session: Arc<dyn BrowsingSession> = Arc::new(HtmlSession::new(reqwest::Client::new()));
    let ctx = session.open_isolated_context().await.unwrap();

    let mut index = CategoryIndex::new(Arc::clone(&session), Arc::clone(&config));
    let category = index.resolve(ctx, "alati-i-orudja").await.unwrap();
    let fetcher = ListingPageFetcher::new(Arc::clone(&session), config).unwrap();

    let summaries = fetcher.fetch_page(ctx, &category, 2).await.unwrap();
    assert!(summaries.is_empty());
}

#[tokio::test]
async fn test_harvest_enriched_to_json_lines() {
    let server = start_site().await;
    let session = Arc::new(HtmlSession::new(reqwest::Client::new()));
    let mut harvester = Harvester::new(session.clone(), create_test_config(&server.uri()))
        .await
        .expect("Failed to create harvester");

    let mut sink = JsonLinesSink::new(Vec::new());
    let request = HarvestRequest::new("Alati i oruđa").enrich(true);
    let stats = harvester.harvest(&request, &mut sink).await.expect("Harvest failed");
    harvester.close().await.unwrap();

    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(stats.details_enriched, 2);
    assert_eq!(stats.details_skipped, 0);
    assert_eq!(stats.records_emitted, 2);
    assert_eq!(session.open_contexts(), 0);

    let output = String::from_utf8(sink.into_inner()).unwrap();
    let records: Vec<serde_json::Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["record"], "detail");
    assert_eq!(records[0]["subcategory"], "busilice");
    assert_eq!(records[1]["subcategory"], "testere");
    assert_eq!(records[0]["images"].as_array().unwrap().len(), 3);
    assert!(records[0].get("vehicle").is_none());
}

#[tokio::test]
async fn test_vehicle_without_characteristics_table() {
    let server = start_site().await;
    let session = Arc::new(HtmlSession::new(reqwest::Client::new()));
    let mut harvester = Harvester::new(session, create_test_config(&server.uri()))
        .await
        .unwrap();

    let mut sink = MemorySink::new();
    let request = HarvestRequest::new("Automobili").max_pages(1).enrich(true);
    let stats = harvester.harvest(&request, &mut sink).await.unwrap();

    assert_eq!(stats.details_enriched, 1);
    let details = sink.details();
    assert_eq!(details.len(), 1);

    let detail = details[0];
    let vehicle = detail.vehicle.as_ref().expect("vehicle attributes");
    assert_eq!(vehicle.characteristics, Field::Absent);
    assert!(vehicle.characteristics.value_or_default().is_empty());
    assert_eq!(
        vehicle.gear,
        Field::Present(vec!["ABS".to_string(), "Klima".to_string()])
    );
    // Only two description sections on the page
    assert_eq!(vehicle.warnings, Field::Absent);
    assert_eq!(
        detail.full_description,
        Field::Present("Audi A4 2.0 TDI".to_string())
    );
    assert_eq!(detail.images.value_or_default().len(), 1);
}

#[tokio::test]
async fn test_unknown_category() {
    let server = start_site().await;
    let session = Arc::new(HtmlSession::new(reqwest::Client::new()));
    let mut harvester = Harvester::new(session, create_test_config(&server.uri()))
        .await
        .unwrap();

    let mut sink = MemorySink::new();
    let result = harvester
        .harvest(&HarvestRequest::new("Nekretnine"), &mut sink)
        .await;

    assert!(matches!(
        result,
        Err(HarvestError::NotFound { slug }) if slug == "nekretnine"
    ));
}
