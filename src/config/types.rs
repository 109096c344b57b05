use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for KP-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    /// Slug to numeric category id, used verbatim in search addresses
    #[serde(rename = "category-ids", default)]
    pub category_ids: BTreeMap<String, u32>,
}

/// Where the classifieds site lives
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Home page; also the base every search address is built on
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path segment appended to a category slug to reach its search page
    #[serde(rename = "search-path", default = "default_search_path")]
    pub search_path: String,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the harvester
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the harvester
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for harvester-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Timeouts applied to every session call that waits on the remote view
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Upper bound for a single navigation (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Upper bound for a wait-for-ready on a marker selector (milliseconds)
    #[serde(rename = "ready-timeout-ms", default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,
}

impl SessionConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout(),
            ready_timeout_ms: default_ready_timeout(),
        }
    }
}

/// Detail enrichment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    /// Maximum number of isolated contexts open at the same time
    #[serde(rename = "max-open-contexts", default = "default_max_open_contexts")]
    pub max_open_contexts: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            max_open_contexts: default_max_open_contexts(),
        }
    }
}

/// Traversal defaults
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Number of search pages fetched per category unless the caller asks otherwise
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Category slugs whose listings are enriched as vehicles
    #[serde(rename = "vehicle-categories", default = "default_vehicle_categories")]
    pub vehicle_categories: Vec<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            vehicle_categories: default_vehicle_categories(),
        }
    }
}

/// CSS selectors for every element the engine reads
///
/// The site ships hashed CSS-module class names, so these change with site
/// deployments and are kept out of the code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    #[serde(rename = "category-list")]
    pub category_list: String,
    #[serde(rename = "category-name")]
    pub category_name: String,
    #[serde(rename = "subcategory-name")]
    pub subcategory_name: String,

    #[serde(rename = "search-ready")]
    pub search_ready: String,
    #[serde(rename = "listing-entry")]
    pub listing_entry: String,
    #[serde(rename = "listing-url")]
    pub listing_url: String,
    #[serde(rename = "listing-title")]
    pub listing_title: String,
    #[serde(rename = "listing-price")]
    pub listing_price: String,
    #[serde(rename = "listing-location")]
    pub listing_location: String,
    #[serde(rename = "listing-image")]
    pub listing_image: String,
    #[serde(rename = "listing-description")]
    pub listing_description: String,

    #[serde(rename = "detail-ready")]
    pub detail_ready: String,
    #[serde(rename = "detail-description")]
    pub detail_description: String,
    #[serde(rename = "detail-gallery-image")]
    pub detail_gallery_image: String,
    #[serde(rename = "vehicle-table")]
    pub vehicle_table: String,
    #[serde(rename = "vehicle-table-cell")]
    pub vehicle_table_cell: String,
    #[serde(rename = "description-section")]
    pub description_section: String,
    #[serde(rename = "description-section-item")]
    pub description_section_item: String,
    #[serde(rename = "gear-section-index")]
    pub gear_section_index: usize,
    #[serde(rename = "warnings-section-index")]
    pub warnings_section_index: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            category_list: ".CategoryList_list__a7SOH".to_string(),
            category_name: ".CategoryList_name__ES_NA".to_string(),
            subcategory_name: ".CategoryBox_name__54eU9".to_string(),
            search_ready: "body".to_string(),
            listing_entry: ".AdItem_adHolder__NoNLJ".to_string(),
            listing_url: ".AdItem_adTextHolder__Fmra9 a".to_string(),
            listing_title: ".AdItem_name__RhGAZ".to_string(),
            listing_price: ".AdItem_price__jUgxi".to_string(),
            listing_location: ".AdItem_originAndPromoLocation__nZ2hN p".to_string(),
            listing_image: ".AdItem_imageHolder__LZaKa img".to_string(),
            listing_description: ".AdItem_descriptionHolder__kffJU p".to_string(),
            detail_ready: ".AdViewInfo_adView__sJnPK".to_string(),
            detail_description: ".AdViewDescription_descriptionHolder__9hET7".to_string(),
            detail_gallery_image: ".AdViewGallery_thumbnailHolder__kWhwX img".to_string(),
            vehicle_table: ".AdViewInfo_infoTable__9dTNC".to_string(),
            vehicle_table_cell: "td".to_string(),
            description_section: ".AdViewDescription_section__4hmsO".to_string(),
            description_section_item: "li".to_string(),
            gear_section_index: 1,
            warnings_section_index: 2,
        }
    }
}

impl SelectorConfig {
    /// Every selector paired with its config key, for validation
    pub fn named(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("category-list", self.category_list.as_str()),
            ("category-name", self.category_name.as_str()),
            ("subcategory-name", self.subcategory_name.as_str()),
            ("search-ready", self.search_ready.as_str()),
            ("listing-entry", self.listing_entry.as_str()),
            ("listing-url", self.listing_url.as_str()),
            ("listing-title", self.listing_title.as_str()),
            ("listing-price", self.listing_price.as_str()),
            ("listing-location", self.listing_location.as_str()),
            ("listing-image", self.listing_image.as_str()),
            ("listing-description", self.listing_description.as_str()),
            ("detail-ready", self.detail_ready.as_str()),
            ("detail-description", self.detail_description.as_str()),
            ("detail-gallery-image", self.detail_gallery_image.as_str()),
            ("vehicle-table", self.vehicle_table.as_str()),
            ("vehicle-table-cell", self.vehicle_table_cell.as_str()),
            ("description-section", self.description_section.as_str()),
            ("description-section-item", self.description_section_item.as_str()),
        ]
    }
}

fn default_search_path() -> String {
    "pretraga".to_string()
}

fn default_navigation_timeout() -> u64 {
    2 * 60 * 1000
}

fn default_ready_timeout() -> u64 {
    30_000
}

fn default_max_open_contexts() -> u32 {
    4
}

fn default_max_pages() -> u32 {
    1
}

fn default_vehicle_categories() -> Vec<String> {
    vec!["automobili".to_string()]
}
