//! Field extraction helpers shared by the fetcher and the enricher
//!
//! Every helper turns a missing element, an empty value or a session error
//! into [`Field::Absent`], so one unreadable field never aborts the record
//! it belongs to.

use crate::listing::Field;
use crate::session::{BrowsingSession, ContextHandle, ElementHandle};
use crate::url::resolve_href;
use url::Url;

/// Reads fields from the document loaded in one context
pub(crate) struct Extractor<'a> {
    session: &'a dyn BrowsingSession,
    ctx: ContextHandle,
    /// Address relative links resolve against
    base: &'a Url,
}

impl<'a> Extractor<'a> {
    pub(crate) fn new(session: &'a dyn BrowsingSession, ctx: ContextHandle, base: &'a Url) -> Self {
        Self { session, ctx, base }
    }

    /// First element matching `selector`
    pub(crate) async fn one(&self, scope: Option<ElementHandle>, selector: &str) -> Option<ElementHandle> {
        match self.session.query_one(self.ctx, scope, selector).await {
            Ok(found) => found,
            Err(e) => {
                tracing::debug!("Query '{}' failed: {}", selector, e);
                None
            }
        }
    }

    /// All elements matching `selector`, or None when the query itself failed
    pub(crate) async fn all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> Option<Vec<ElementHandle>> {
        match self.session.query_all(self.ctx, scope, selector).await {
            Ok(found) => Some(found),
            Err(e) => {
                tracing::debug!("Query '{}' failed: {}", selector, e);
                None
            }
        }
    }

    /// Trimmed text of an element; empty text is a gap
    pub(crate) async fn element_text(&self, element: ElementHandle) -> Field<String> {
        match self.session.extract_text(self.ctx, element).await {
            Ok(text) => text
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .into(),
            Err(e) => {
                tracing::debug!("Reading text of {:?} failed: {}", element, e);
                Field::Absent
            }
        }
    }

    /// First non-empty value among `names`, tried in order
    pub(crate) async fn element_attribute(&self, element: ElementHandle, names: &[&str]) -> Field<String> {
        for name in names {
            match self.session.extract_attribute(self.ctx, element, name).await {
                Ok(Some(value)) if !value.trim().is_empty() => {
                    return Field::Present(value.trim().to_string())
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Reading '{}' of {:?} failed: {}", name, element, e);
                    return Field::Absent;
                }
            }
        }
        Field::Absent
    }

    /// Absolute address held in the first usable attribute among `names`
    pub(crate) async fn element_link(&self, element: ElementHandle, names: &[&str]) -> Field<String> {
        match self.element_attribute(element, names).await {
            Field::Present(href) => resolve_href(&href, self.base).into(),
            Field::Absent => Field::Absent,
        }
    }

    /// Text of the first element matching `selector`
    pub(crate) async fn text(&self, scope: Option<ElementHandle>, selector: &str) -> Field<String> {
        match self.one(scope, selector).await {
            Some(element) => self.element_text(element).await,
            None => Field::Absent,
        }
    }

    /// Link read from the first element matching `selector`
    pub(crate) async fn link(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
        names: &[&str],
    ) -> Field<String> {
        match self.one(scope, selector).await {
            Some(element) => self.element_link(element, names).await,
            None => Field::Absent,
        }
    }

    /// Links of every matching element in document order
    ///
    /// Elements without a usable link are left out. No match at all is an
    /// empty list, not a gap.
    pub(crate) async fn links(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
        names: &[&str],
    ) -> Field<Vec<String>> {
        let Some(elements) = self.all(scope, selector).await else {
            return Field::Absent;
        };

        let mut links = Vec::with_capacity(elements.len());
        for element in elements {
            if let Field::Present(link) = self.element_link(element, names).await {
                links.push(link);
            }
        }
        Field::Present(links)
    }

    /// Non-empty texts of every matching element in document order
    pub(crate) async fn texts(&self, scope: Option<ElementHandle>, selector: &str) -> Field<Vec<String>> {
        let Some(elements) = self.all(scope, selector).await else {
            return Field::Absent;
        };

        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            if let Field::Present(text) = self.element_text(element).await {
                texts.push(text);
            }
        }
        Field::Present(texts)
    }

    /// Raw trimmed texts of every matching element, empty ones included
    ///
    /// Used where position matters, such as table cells read in pairs.
    pub(crate) async fn cell_texts(&self, scope: Option<ElementHandle>, selector: &str) -> Option<Vec<String>> {
        let elements = self.all(scope, selector).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            texts.push(self.element_text(element).await.value_or_default());
        }
        Some(texts)
    }
}

/// Pairs adjacent cells as `(key, value)`; a trailing unpaired cell is discarded
pub(crate) fn pair_cells(cells: Vec<String>) -> Vec<(String, String)> {
    cells
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}
