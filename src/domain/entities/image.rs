//! Gallery image records and listing parameters.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::serde_utils::lenient_datetime;

/// Backend-assigned image identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Creates an identifier from any string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An image as stored by the gallery backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Unique identifier.
    pub id: ImageId,
    /// Display URL.
    pub url: String,
    /// Optional thumbnail URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Tags. Order carries no meaning.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Upload timestamp, absent when the backend has not set one.
    #[serde(default, with = "lenient_datetime")]
    pub upload_date: Option<DateTime<Utc>>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Original filename.
    #[serde(default)]
    pub filename: String,
    /// Like counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    /// View counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl ImageRecord {
    /// Returns true if any searchable field contains `needle`.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.filename.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }

    /// Thumbnail URL, falling back to the display URL.
    #[must_use]
    pub fn thumbnail_or_url(&self) -> &str {
        self.thumbnail.as_deref().unwrap_or(&self.url)
    }
}

/// Partial update for an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePatch {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement tag list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Field a gallery listing is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Upload date.
    #[default]
    Date,
    /// Title.
    Name,
    /// Byte size.
    Size,
}

impl SortKey {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Name => "name",
            Self::Size => "size",
        }
    }

    /// Compares two records by this key, ascending.
    #[must_use]
    pub fn compare(self, a: &ImageRecord, b: &ImageRecord) -> Ordering {
        match self {
            Self::Date => a.upload_date.cmp(&b.upload_date),
            Self::Name => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            Self::Size => a.size.cmp(&b.size),
        }
    }

    /// Next key in the cycle date → name → size → date.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Date => Self::Name,
            Self::Name => Self::Size,
            Self::Size => Self::Date,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sorts `records` in place. The sort is stable.
pub fn sort_records(records: &mut [ImageRecord], key: SortKey, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = key.compare(a, b);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Parameters for a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Sort field.
    pub sort: SortKey,
    /// Sort direction.
    pub order: SortOrder,
}

impl ListQuery {
    /// Default page size used by the backend.
    pub const DEFAULT_LIMIT: u32 = 20;

    /// Creates a query for the given page with default sorting.
    #[must_use]
    pub const fn page(page: u32) -> Self {
        Self {
            page,
            limit: Self::DEFAULT_LIMIT,
            sort: SortKey::Date,
            order: SortOrder::Desc,
        }
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the sort field and direction.
    #[must_use]
    pub const fn sorted_by(mut self, sort: SortKey, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::page(1)
    }
}

/// Where a read result came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSource {
    /// Fresh from the backend.
    #[default]
    Live,
    /// Served from the response cache.
    Cache,
    /// Sample data substituted because the backend was unreachable.
    Fallback,
}

impl DataSource {
    /// Returns true for substituted sample data.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// One page of the gallery listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePage {
    /// Records on this page.
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    /// Total number of records.
    #[serde(default)]
    pub total: u64,
    /// Page number.
    #[serde(default = "first_page")]
    pub page: u32,
    /// Number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Whether a further page exists.
    #[serde(default)]
    pub has_more: bool,
    /// Provenance of this page.
    #[serde(skip)]
    pub source: DataSource,
}

/// Search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// Matching records.
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    /// Total number of matches.
    #[serde(default)]
    pub total: u64,
    /// Echo of the query.
    #[serde(default)]
    pub query: String,
    /// Provenance of these results.
    #[serde(skip)]
    pub source: DataSource,
}

const fn first_page() -> u32 {
    1
}
