//! In-memory managed book collection.
//!
//! The library's own holdings as administrators curate them: title, author,
//! ISBN, copy counts, and an active/inactive status. Like the credential
//! store it is an explicitly constructed value held in the application
//! state and lives only as long as the process.

use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest publication year the collection accepts.
pub const MIN_PUBLISH_YEAR: i32 = 1800;

/// Cover used when a book has none.
pub const PLACEHOLDER_COVER: &str = "/placeholder.svg";

/// Errors returned by the book collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    /// A submitted book failed validation. The message is shown as is.
    #[error("{0}")]
    Invalid(String),

    /// No book has this ID.
    #[error("Book not found: {0}")]
    NotFound(String),
}

/// Whether a book is offered to members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Active,
    Inactive,
}

/// A book held by the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedBook {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
    pub publisher: String,
    pub publish_year: Option<i32>,
    pub total_copies: u32,
    /// Never more than `total_copies`.
    pub available_copies: u32,
    pub description: String,
    pub cover_url: String,
    pub status: BookStatus,
}

/// A book as submitted by the management form.
///
/// Absent text fields read as blank, so a missing title is reported by
/// validation rather than by the body parser.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub publisher: String,
    pub publish_year: Option<i32>,
    #[serde(default = "one")]
    pub total_copies: u32,
    #[serde(default)]
    pub description: String,
    pub cover_url: Option<String>,
    /// Kept from the stored book on update when absent.
    pub status: Option<BookStatus>,
}

const fn one() -> u32 {
    1
}

impl BookDraft {
    /// Trimmed copy of the draft, or the first validation failure.
    fn validated(self) -> Result<Self, CollectionError> {
        let title = self.title.trim().to_owned();
        let author = self.author.trim().to_owned();
        let isbn = self.isbn.trim().to_owned();

        if title.is_empty() || author.is_empty() || isbn.is_empty() {
            return Err(CollectionError::Invalid(
                "Please fill in all required fields".to_owned(),
            ));
        }
        if self.total_copies == 0 {
            return Err(CollectionError::Invalid(
                "Total copies must be at least 1".to_owned(),
            ));
        }
        if self.publish_year.is_some_and(|year| year < MIN_PUBLISH_YEAR) {
            return Err(CollectionError::Invalid(format!(
                "Publish year must be {MIN_PUBLISH_YEAR} or later"
            )));
        }

        Ok(Self {
            title,
            author,
            isbn,
            genre: self.genre.trim().to_owned(),
            publisher: self.publisher.trim().to_owned(),
            description: self.description.trim().to_owned(),
            cover_url: self
                .cover_url
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty()),
            publish_year: self.publish_year,
            total_copies: self.total_copies,
            status: self.status,
        })
    }
}

/// Listing filter. `None` matches everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    /// Case-insensitive match on title or author, substring match on ISBN.
    pub q: Option<String>,
    /// Exact genre.
    pub genre: Option<String>,
    /// Exact status.
    pub status: Option<BookStatus>,
}

impl BookFilter {
    fn matches(&self, book: &ManagedBook) -> bool {
        let query = self
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());

        let text = query.is_none_or(|q| {
            let needle = q.to_lowercase();
            book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
                || book.isbn.contains(q)
        });
        let genre = self.genre.as_deref().is_none_or(|g| book.genre == g);
        let status = self.status.is_none_or(|s| book.status == s);

        text && genre && status
    }
}

/// The library's managed holdings.
#[derive(Debug, Default)]
pub struct BookCollection {
    books: RwLock<Vec<ManagedBook>>,
}

impl BookCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection seeded with the demo holdings.
    #[must_use]
    pub fn with_demo_books() -> Self {
        Self {
            books: RwLock::new(demo_books()),
        }
    }

    /// Books matching `filter`, in insertion order.
    #[must_use]
    pub fn list(&self, filter: &BookFilter) -> Vec<ManagedBook> {
        self.read(|books| {
            books
                .iter()
                .filter(|book| filter.matches(book))
                .cloned()
                .collect()
        })
    }

    /// The book with the given ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ManagedBook> {
        self.read(|books| books.iter().find(|b| b.id == id).cloned())
    }

    /// Add a book. All its copies start available and it starts active
    /// unless the draft says otherwise.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::Invalid` if title, author, or ISBN is
    /// blank, no copies are held, or the publication year is too early.
    pub fn add(&self, draft: BookDraft) -> Result<ManagedBook, CollectionError> {
        let draft = draft.validated()?;
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);

        let book = ManagedBook {
            id: next_id(&books),
            available_copies: draft.total_copies,
            status: draft.status.unwrap_or(BookStatus::Active),
            title: draft.title,
            author: draft.author,
            isbn: draft.isbn,
            genre: draft.genre,
            publisher: draft.publisher,
            publish_year: draft.publish_year,
            total_copies: draft.total_copies,
            description: draft.description,
            cover_url: draft
                .cover_url
                .unwrap_or_else(|| PLACEHOLDER_COVER.to_owned()),
        };

        books.push(book.clone());
        tracing::info!(book_id = %book.id, title = %book.title, "Book added");
        Ok(book)
    }

    /// Replace a book's details.
    ///
    /// Available copies are clamped to the new total. Raising the total
    /// leaves them as they were.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::NotFound` for an unknown ID, or
    /// `CollectionError::Invalid` as for [`Self::add`].
    pub fn update(&self, id: &str, draft: BookDraft) -> Result<ManagedBook, CollectionError> {
        let draft = draft.validated()?;
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| CollectionError::NotFound(id.to_owned()))?;

        book.available_copies = book.available_copies.min(draft.total_copies);
        book.status = draft.status.unwrap_or(book.status);
        book.title = draft.title;
        book.author = draft.author;
        book.isbn = draft.isbn;
        book.genre = draft.genre;
        book.publisher = draft.publisher;
        book.publish_year = draft.publish_year;
        book.total_copies = draft.total_copies;
        book.description = draft.description;
        if let Some(cover) = draft.cover_url {
            book.cover_url = cover;
        }

        tracing::info!(book_id = %book.id, "Book updated");
        Ok(book.clone())
    }

    /// Remove a book.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::NotFound` for an unknown ID.
    pub fn remove(&self, id: &str) -> Result<ManagedBook, CollectionError> {
        let mut books = self.books.write().unwrap_or_else(PoisonError::into_inner);
        let index = books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| CollectionError::NotFound(id.to_owned()))?;

        let removed = books.remove(index);
        tracing::info!(book_id = %removed.id, "Book removed");
        Ok(removed)
    }

    /// Number of books held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(Vec::len)
    }

    /// Whether the collection holds no books.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Every mutation completes under the write lock before it is released.
    fn read<T>(&self, f: impl FnOnce(&Vec<ManagedBook>) -> T) -> T {
        let books = self.books.read().unwrap_or_else(PoisonError::into_inner);
        f(&books)
    }
}

/// `book_<unix millis>`, bumped past any ID already taken.
fn next_id(books: &[ManagedBook]) -> String {
    let mut stamp = Utc::now().timestamp_millis();
    loop {
        let id = format!("book_{stamp}");
        if books.iter().all(|b| b.id != id) {
            return id;
        }
        stamp += 1;
    }
}

/// The seeded demo holdings.
fn demo_books() -> Vec<ManagedBook> {
    let seed = |id: &str,
                title: &str,
                author: &str,
                isbn: &str,
                genre: &str,
                publisher: &str,
                year: i32,
                copies: (u32, u32),
                description: &str| ManagedBook {
        id: id.to_owned(),
        title: title.to_owned(),
        author: author.to_owned(),
        isbn: isbn.to_owned(),
        genre: genre.to_owned(),
        publisher: publisher.to_owned(),
        publish_year: Some(year),
        total_copies: copies.0,
        available_copies: copies.1,
        description: description.to_owned(),
        cover_url: PLACEHOLDER_COVER.to_owned(),
        status: BookStatus::Active,
    };

    vec![
        seed(
            "1",
            "The Midnight Library",
            "Matt Haig",
            "978-0525559474",
            "Fiction",
            "Viking",
            2020,
            (5, 2),
            "Between life and death there is a library.",
        ),
        seed(
            "2",
            "Atomic Habits",
            "James Clear",
            "978-0735211292",
            "Self-Help",
            "Avery",
            2018,
            (8, 3),
            "An easy and proven way to build good habits and break bad ones.",
        ),
        seed(
            "3",
            "Dune",
            "Frank Herbert",
            "978-0441172719",
            "Science Fiction",
            "Ace",
            1965,
            (3, 0),
            "Set on the desert planet Arrakis.",
        ),
    ]
}
