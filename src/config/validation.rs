use crate::config::types::{
    Config, EnrichmentConfig, HarvestConfig, SelectorConfig, SessionConfig, SiteConfig,
    UserAgentConfig,
};
use crate::url::transform;
use crate::ConfigError;
use scraper::Selector;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_session_config(&config.session)?;
    validate_enrichment_config(&config.enrichment)?;
    validate_harvest_config(&config.harvest)?;
    validate_selectors(&config.selectors)?;
    validate_category_ids(&config.category_ids)?;
    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use HTTP(S), got '{}'",
            config.base_url
        )));
    }

    if config.search_path.is_empty() || config.search_path.contains('/') {
        return Err(ConfigError::Validation(format!(
            "search-path must be a single non-empty path segment, got '{}'",
            config.search_path
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.navigation_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-ms must be >= 100ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.ready_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "ready-timeout-ms must be >= 100ms, got {}ms",
            config.ready_timeout_ms
        )));
    }

    Ok(())
}

fn validate_enrichment_config(config: &EnrichmentConfig) -> Result<(), ConfigError> {
    if config.max_open_contexts < 1 || config.max_open_contexts > 32 {
        return Err(ConfigError::Validation(format!(
            "max-open-contexts must be between 1 and 32, got {}",
            config.max_open_contexts
        )));
    }
    Ok(())
}

fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    for slug in &config.vehicle_categories {
        validate_slug(slug, "vehicle-categories")?;
    }

    Ok(())
}

/// Every selector must parse
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, selector) in config.named() {
        if Selector::parse(selector).is_err() {
            return Err(ConfigError::InvalidSelector {
                name: name.to_string(),
                selector: selector.to_string(),
            });
        }
    }

    if config.gear_section_index == config.warnings_section_index {
        return Err(ConfigError::Validation(format!(
            "gear-section-index and warnings-section-index must differ, both are {}",
            config.gear_section_index
        )));
    }

    Ok(())
}

fn validate_category_ids(ids: &BTreeMap<String, u32>) -> Result<(), ConfigError> {
    for (slug, id) in ids {
        validate_slug(slug, "category-ids")?;
        if *id == 0 {
            return Err(ConfigError::Validation(format!(
                "category id for '{}' must be positive",
                slug
            )));
        }
    }
    Ok(())
}

/// A configured slug must already be in canonical form
fn validate_slug(slug: &str, table: &str) -> Result<(), ConfigError> {
    if slug.is_empty() || transform(slug) != slug {
        return Err(ConfigError::Validation(format!(
            "'{}' in {} is not a canonical slug (expected '{}')",
            slug,
            table,
            transform(slug)
        )));
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
