//! Open Library HTTP client.
//!
//! Caches searches, work details, and ISBN lookups using `moka` (5-minute
//! TTL). Failed requests are returned as-is and never retried.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogConfig;

use super::CatalogError;
use super::cache::{CacheKey, CacheValue};
use super::types::{
    Availability, BookCard, BookDetail, BookSummary, CoverSize, EditionRecord, PLACEHOLDER_COVER,
    SEARCH_FIELDS, SearchResponse, TextValue, UNKNOWN_AUTHOR, WorkRecord, names,
};

/// Page size used when the caller does not pick one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Query used for the trending shelf.
pub const TRENDING_QUERY: &str = "subject:fiction OR subject:bestseller";

const MAX_DETAIL_SUBJECTS: usize = 10;
const MAX_CARD_SUBJECTS: usize = 3;
const WORKS_PREFIX: &str = "/works/";

/// Client for the Open Library search, works, and books APIs.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    covers_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("covers_url", &self.inner.covers_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                covers_url: config.covers_url.as_str().trim_end_matches('/').to_owned(),
                cache,
            }),
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Free-text search.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<SearchResponse, CatalogError> {
        let cache_key = CacheKey::Search {
            query: query.to_owned(),
            limit,
            offset,
        };

        if let Some(CacheValue::Search(response)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for search");
            return Ok(*response);
        }

        let mut url = self.endpoint(&["search.json"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string())
            .append_pair("fields", SEARCH_FIELDS);

        let response: SearchResponse = self.get_json(url, query).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Search(Box::new(response.clone())))
            .await;

        Ok(response)
    }

    /// Search by title.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::search`].
    pub async fn search_by_title(
        &self,
        title: &str,
        limit: u32,
    ) -> Result<SearchResponse, CatalogError> {
        self.search(&format!("title:{title}"), limit, 0).await
    }

    /// Search by author.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::search`].
    pub async fn search_by_author(
        &self,
        author: &str,
        limit: u32,
    ) -> Result<SearchResponse, CatalogError> {
        self.search(&format!("author:{author}"), limit, 0).await
    }

    /// Search by subject.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::search`].
    pub async fn search_by_subject(
        &self,
        subject: &str,
        limit: u32,
    ) -> Result<SearchResponse, CatalogError> {
        self.search(&format!("subject:{subject}"), limit, 0).await
    }

    /// Popular fiction and bestsellers.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::search`].
    pub async fn trending(&self, limit: u32) -> Result<SearchResponse, CatalogError> {
        self.search(TRENDING_QUERY, limit, 0).await
    }

    /// Books in a genre. Genre names are matched lower-cased.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::search`].
    pub async fn by_genre(&self, genre: &str, limit: u32) -> Result<SearchResponse, CatalogError> {
        self.search(&format!("subject:{}", genre.to_lowercase()), limit, 0)
            .await
    }

    // =========================================================================
    // Details
    // =========================================================================

    /// Extended metadata for a work, by key (`/works/OL45804W` or `OL45804W`).
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInput` for a malformed key,
    /// `CatalogError::NotFound` if the work does not exist, or an error if
    /// the request fails.
    #[instrument(skip(self))]
    pub async fn work_details(&self, key: &str) -> Result<BookDetail, CatalogError> {
        let work_id = parse_work_id(key)?;
        let cache_key = CacheKey::Work(work_id.to_owned());

        if let Some(CacheValue::Work(detail)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for work");
            return Ok(*detail);
        }

        let url = self.endpoint(&["works", &format!("{work_id}.json")])?;
        let record: WorkRecord = self.get_json(url, work_id).await?;
        let detail = self.work_to_detail(work_id, record);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Work(Box::new(detail.clone())))
            .await;

        Ok(detail)
    }

    /// Look up an edition by ISBN-10 or ISBN-13. Hyphens and spaces are
    /// ignored. Returns `None` if Open Library has no record for it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidInput` for a malformed ISBN, or an error
    /// if the request fails.
    #[instrument(skip(self))]
    pub async fn by_isbn(&self, isbn: &str) -> Result<Option<BookDetail>, CatalogError> {
        let isbn = normalize_isbn(isbn)?;
        let cache_key = CacheKey::Isbn(isbn.clone());

        if let Some(CacheValue::Isbn(detail)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for ISBN");
            return Ok(detail.map(|d| *d));
        }

        let bibkey = format!("ISBN:{isbn}");
        let mut url = self.endpoint(&["api", "books"])?;
        url.query_pairs_mut()
            .append_pair("bibkeys", &bibkey)
            .append_pair("format", "json")
            .append_pair("jscmd", "data");

        let mut records: std::collections::HashMap<String, EditionRecord> =
            self.get_json(url, &isbn).await?;
        let detail = records
            .remove(&bibkey)
            .map(|record| edition_to_detail(&isbn, record));

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Isbn(detail.clone().map(Box::new)),
            )
            .await;

        Ok(detail)
    }

    // =========================================================================
    // Display helpers
    // =========================================================================

    /// URL of a cover image, or the placeholder when there is no cover.
    #[must_use]
    pub fn cover_url(&self, cover_id: Option<u64>, size: CoverSize) -> String {
        match cover_id.filter(|id| *id > 0) {
            Some(id) => format!("{}/id/{id}-{}.jpg", self.inner.covers_url, size.as_str()),
            None => PLACEHOLDER_COVER.to_owned(),
        }
    }

    /// Compact display record for a search result.
    #[must_use]
    pub fn book_card(&self, summary: &BookSummary) -> BookCard {
        BookCard {
            id: summary.key.clone(),
            title: summary.title.clone(),
            author: summary
                .author_name
                .first()
                .cloned()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned()),
            cover_image: self.cover_url(summary.cover_i, CoverSize::Medium),
            status: Availability::InStock,
            publish_year: summary.first_publish_year,
            subjects: summary
                .subject
                .iter()
                .take(MAX_CARD_SUBJECTS)
                .cloned()
                .collect(),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidInput("catalog base URL cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, CatalogError> {
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(what.to_owned()));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Open Library returned non-success status"
            );
            return Err(CatalogError::Status(status.as_u16()));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Open Library response"
            );
            CatalogError::Parse(e)
        })
    }

    fn work_to_detail(&self, work_id: &str, record: WorkRecord) -> BookDetail {
        let cover_id = record
            .covers
            .first()
            .and_then(|id| u64::try_from(*id).ok());

        BookDetail {
            key: format!("{WORKS_PREFIX}{work_id}"),
            title: record.title,
            subtitle: record.subtitle,
            authors: names(record.authors),
            description: record
                .description
                .map(TextValue::into_string)
                .unwrap_or_default(),
            subjects: record
                .subjects
                .into_iter()
                .take(MAX_DETAIL_SUBJECTS)
                .collect(),
            publish_date: record.publish_date,
            publishers: record.publishers,
            isbn: record
                .isbn_13
                .into_iter()
                .next()
                .or_else(|| record.isbn_10.into_iter().next()),
            number_of_pages: record.number_of_pages,
            cover_url: self.cover_url(cover_id, CoverSize::Large),
            first_sentence: record
                .first_sentence
                .map(TextValue::into_string)
                .unwrap_or_default(),
            language: record
                .languages
                .into_iter()
                .map(|lang| {
                    lang.key
                        .strip_prefix("/languages/")
                        .map_or_else(|| lang.key.clone(), str::to_owned)
                })
                .collect(),
        }
    }
}

fn edition_to_detail(isbn: &str, record: EditionRecord) -> BookDetail {
    let cover_url = record
        .cover
        .and_then(|c| c.large.or(c.medium).or(c.small))
        .unwrap_or_else(|| PLACEHOLDER_COVER.to_owned());

    BookDetail {
        key: record.key.unwrap_or_else(|| isbn.to_owned()),
        title: record.title.unwrap_or_default(),
        subtitle: None,
        authors: names(record.authors),
        description: record
            .description
            .map(TextValue::into_string)
            .unwrap_or_default(),
        subjects: names(record.subjects),
        publish_date: record.publish_date,
        publishers: names(record.publishers),
        isbn: Some(isbn.to_owned()),
        number_of_pages: record.number_of_pages,
        cover_url,
        first_sentence: String::new(),
        language: Vec::new(),
    }
}

/// Strip an optional `/works/` prefix and check what remains is a bare ID.
fn parse_work_id(key: &str) -> Result<&str, CatalogError> {
    let key = key.trim();
    let id = key.strip_prefix(WORKS_PREFIX).unwrap_or(key);

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CatalogError::InvalidInput(format!("not a work key: {key}")));
    }
    Ok(id)
}

/// Drop separators and check for 10 or 13 digits (ISBN-10 may end in `X`).
fn normalize_isbn(isbn: &str) -> Result<String, CatalogError> {
    let cleaned: String = isbn
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let valid = match cleaned.len() {
        13 => cleaned.chars().all(|c| c.is_ascii_digit()),
        10 => cleaned
            .char_indices()
            .all(|(i, c)| c.is_ascii_digit() || (i == 9 && c == 'X')),
        _ => false,
    };

    if valid {
        Ok(cleaned)
    } else {
        Err(CatalogError::InvalidInput(format!("not an ISBN: {isbn}")))
    }
}
