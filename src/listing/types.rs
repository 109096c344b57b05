//! Listing record types
//!
//! Summaries are read from search pages; details add what only the listing's
//! own page shows. Every optional field is a [`Field`], so a reader can tell
//! exactly which fields the remote document failed to provide.

use serde::{Serialize, Serializer};
use std::fmt;

/// Result of extracting one field from the remote document
///
/// `Absent` is not an error: the element was missing, empty or unreadable,
/// and the surrounding record is still valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Present(T),
    Absent,
}

impl<T> Field<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Self::Present(value) => Field::Present(f(value)),
            Self::Absent => Field::Absent,
        }
    }
}

impl<T: Clone + Default> Field<T> {
    /// The value, or the empty default (`""`, `[]`) for a gap
    pub fn value_or_default(&self) -> T {
        self.value().cloned().unwrap_or_default()
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Present(value),
            None => Self::Absent,
        }
    }
}

/// Gaps serialize as `null`
impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(value) => serializer.serialize_some(value),
            Self::Absent => serializer.serialize_none(),
        }
    }
}

/// Which extraction strategy a listing gets
///
/// Decided by the category the listing was reached through, never by
/// inspecting the detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Generic,
    Vehicle,
}

impl ListingKind {
    /// Vehicle when `slug` is one of the configured vehicle categories
    pub fn for_category(slug: &str, vehicle_categories: &[String]) -> Self {
        if vehicle_categories.iter().any(|vehicle| vehicle == slug) {
            Self::Vehicle
        } else {
            Self::Generic
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Vehicle => write!(f, "vehicle"),
        }
    }
}

/// A listing as shown on a search page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingSummary {
    /// Absolute address of the listing; its identity
    pub url: String,
    pub title: Field<String>,
    /// Price as displayed, currency and all
    pub price: Field<String>,
    pub location: Field<String>,
    pub cover_image_url: Field<String>,
    pub short_description: Field<String>,
}

impl ListingSummary {
    /// A summary with only its identity known
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Field::Absent,
            price: Field::Absent,
            location: Field::Absent,
            cover_image_url: Field::Absent,
            short_description: Field::Absent,
        }
    }

    /// Names of the fields the search page did not provide
    pub fn gaps(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_absent()),
            ("price", self.price.is_absent()),
            ("location", self.location.is_absent()),
            ("cover_image_url", self.cover_image_url.is_absent()),
            ("short_description", self.short_description.is_absent()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name)
        .collect()
    }
}

/// Attributes only vehicle listings carry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VehicleAttributes {
    /// Key/value rows of the characteristics table, in table order
    pub characteristics: Field<Vec<(String, String)>>,
    pub gear: Field<Vec<String>>,
    pub warnings: Field<Vec<String>>,
}

/// A summary enriched with its detail page
///
/// The summary is carried by value, so enrichment can only add fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingDetail {
    #[serde(flatten)]
    pub summary: ListingSummary,
    pub full_description: Field<String>,
    /// Gallery images in gallery order
    pub images: Field<Vec<String>>,
    /// Derived from the listing address, not read from the page
    pub subcategory: Field<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleAttributes>,
}

impl ListingDetail {
    pub fn url(&self) -> &str {
        &self.summary.url
    }

    pub fn kind(&self) -> ListingKind {
        if self.vehicle.is_some() {
            ListingKind::Vehicle
        } else {
            ListingKind::Generic
        }
    }

    /// Names of the detail-only fields that could not be read
    pub fn gaps(&self) -> Vec<&'static str> {
        let mut gaps = Vec::new();
        if self.full_description.is_absent() {
            gaps.push("full_description");
        }
        if self.images.is_absent() {
            gaps.push("images");
        }
        if self.subcategory.is_absent() {
            gaps.push("subcategory");
        }
        if let Some(vehicle) = &self.vehicle {
            if vehicle.characteristics.is_absent() {
                gaps.push("characteristics");
            }
            if vehicle.gear.is_absent() {
                gaps.push("gear");
            }
            if vehicle.warnings.is_absent() {
                gaps.push("warnings");
            }
        }
        gaps
    }
}
