//! Open Library response and display types.

use serde::{Deserialize, Serialize};

/// Fields requested from the search endpoint.
pub const SEARCH_FIELDS: &str = "key,title,author_name,first_publish_year,publisher,isbn,cover_i,subject,number_of_pages_median,first_sentence,edition_count";

/// Image returned when a book has no cover.
pub const PLACEHOLDER_COVER: &str = "/placeholder.svg";

/// Author shown when a record names none.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// One page of search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Total number of matches.
    #[serde(rename = "numFound")]
    pub num_found: u64,
    /// Offset of the first document.
    #[serde(default)]
    pub start: u64,
    /// Whether `num_found` is exact.
    #[serde(rename = "numFoundExact", default)]
    pub num_found_exact: bool,
    /// Matching books.
    #[serde(default)]
    pub docs: Vec<BookSummary>,
}

/// A search result record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookSummary {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub author_name: Vec<String>,
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub publisher: Vec<String>,
    #[serde(default)]
    pub isbn: Vec<String>,
    pub cover_i: Option<u64>,
    #[serde(default)]
    pub subject: Vec<String>,
    pub number_of_pages_median: Option<u32>,
    #[serde(default)]
    pub first_sentence: Vec<String>,
    pub edition_count: Option<u32>,
    #[serde(default)]
    pub publish_date: Vec<String>,
    #[serde(default)]
    pub language: Vec<String>,
}

/// Extended metadata for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub key: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub description: String,
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    pub publishers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_pages: Option<u32>,
    pub cover_url: String,
    pub first_sentence: String,
    pub language: Vec<String>,
}

/// Compact record for list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCard {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover_image: String,
    pub status: Availability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_year: Option<i32>,
    pub subjects: Vec<String>,
}

/// Shelf status shown on a card. Open Library has no loan data, so cards
/// built from search results are always `InStock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "On Loan")]
    OnLoan,
    #[serde(rename = "Reserved")]
    Reserved,
}

/// Cover image size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CoverSize {
    #[serde(rename = "S")]
    Small,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
}

impl CoverSize {
    /// Size letter used in cover URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "S",
            Self::Medium => "M",
            Self::Large => "L",
        }
    }
}

// =============================================================================
// Raw API records
// =============================================================================

/// A text field that is either a bare string or `{"type": .., "value": ..}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum TextValue {
    Plain(String),
    Typed { value: String },
}

impl TextValue {
    pub(crate) fn into_string(self) -> String {
        match self {
            Self::Plain(s) | Self::Typed { value: s } => s,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Named {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KeyRef {
    pub key: String,
}

/// `GET /works/{id}.json`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WorkRecord {
    pub title: String,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<Named>,
    pub description: Option<TextValue>,
    #[serde(default)]
    pub subjects: Vec<String>,
    pub publish_date: Option<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub isbn_10: Vec<String>,
    #[serde(default)]
    pub isbn_13: Vec<String>,
    pub number_of_pages: Option<u32>,
    #[serde(default)]
    pub covers: Vec<i64>,
    pub first_sentence: Option<TextValue>,
    #[serde(default)]
    pub languages: Vec<KeyRef>,
}

/// One entry of `GET /api/books?jscmd=data`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EditionRecord {
    pub key: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<Named>,
    pub description: Option<TextValue>,
    #[serde(default)]
    pub subjects: Vec<Named>,
    pub publish_date: Option<String>,
    #[serde(default)]
    pub publishers: Vec<Named>,
    pub number_of_pages: Option<u32>,
    pub cover: Option<CoverSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CoverSet {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

pub(crate) fn names(items: Vec<Named>) -> Vec<String> {
    items.into_iter().filter_map(|n| n.name).collect()
}
