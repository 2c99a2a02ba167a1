//! Catalog commands.

use libris_portal::catalog::DEFAULT_LIMIT;

use super::{CommandError, emit, restored_state};

/// Search Open Library and list the results as cards.
pub async fn search(query: &str, limit: Option<u32>) -> Result<(), CommandError> {
    let state = restored_state().await?;
    let catalog = state.catalog();
    let response = catalog.search(query, limit.unwrap_or(DEFAULT_LIMIT), 0).await?;

    tracing::info!("{} matches for {query:?}", response.num_found);
    let cards: Vec<_> = response.docs.iter().map(|doc| catalog.book_card(doc)).collect();
    emit("Results", &cards)
}

/// Show a work, or an edition when `id` looks like an ISBN.
pub async fn book(id: &str, isbn: bool) -> Result<(), CommandError> {
    let state = restored_state().await?;
    let catalog = state.catalog();

    if isbn {
        match catalog.by_isbn(id).await? {
            Some(detail) => emit("Edition", &detail),
            None => Err(CommandError::Usage(format!("No edition found for ISBN {id}"))),
        }
    } else {
        emit("Work", &catalog.work_details(id).await?)
    }
}
