//! Address construction and link resolution

use url::Url;

/// Builds the search address for one page of a category
///
/// The format is `{base}/{slug}/{search_path}?categoryId={id}&page={page}`.
/// The base is treated as a directory even when its path lacks a trailing
/// slash, so a base of `https://host/kp` yields `https://host/kp/{slug}/...`.
///
/// # Example
///
/// ```
/// use kp_harvest::url::search_address;
/// use url::Url;
///
/// let base = Url::parse("https://www.kupujemprodajem.com/").unwrap();
/// let url = search_address(&base, "pretraga", "alati-i-orudja", 10, 2).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.kupujemprodajem.com/alati-i-orudja/pretraga?categoryId=10&page=2"
/// );
/// ```
pub fn search_address(
    base: &Url,
    search_path: &str,
    slug: &str,
    category_id: u32,
    page: u32,
) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.set_fragment(None);

    let mut url = base.join(&format!("{}/{}", slug, search_path))?;
    url.query_pairs_mut()
        .append_pair("categoryId", &category_id.to_string())
        .append_pair("page", &page.to_string());
    Ok(url)
}

/// Resolves an `href`/`src` value to an absolute HTTP(S) URL
///
/// Returns None if the value should be ignored:
/// - empty values and fragment-only anchors
/// - javascript:, mailto:, tel:, data: schemes
/// - values that do not resolve to HTTP(S)
pub fn resolve_href(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Derives the subcategory slug of a listing from its URL
///
/// Listing addresses are laid out as `/{category}/{subcategory}/oglas/...`,
/// so the subcategory is the second path segment. Computed locally, no page
/// visit needed.
pub fn subcategory_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .nth(1)
        .map(|segment| segment.to_string())
}
