//! Catalog management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
    repository::Repository,
};

/// Number of same-genre books returned alongside a book's details
const SIMILAR_BOOKS_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Search books with pagination and sorting
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Books of the same genre, excluding the book itself
    pub async fn similar_books(&self, id: Uuid) -> AppResult<Vec<Book>> {
        // Verify the book exists so an unknown id is a 404, not an empty list
        self.repository.books.get_by_id(id).await?;
        self.repository.books.similar(id, SIMILAR_BOOKS_LIMIT).await
    }

    /// Create a new book
    pub async fn create_book(&self, req: CreateBook) -> AppResult<Book> {
        req.validate()?;
        let book = self.repository.books.create(&req).await?;
        tracing::info!("Created book {} ({})", book.id, book.title);
        Ok(book)
    }

    /// Update an existing book
    pub async fn update_book(&self, id: Uuid, req: UpdateBook) -> AppResult<Book> {
        req.validate()?;
        self.repository.books.update(id, &req).await
    }

    /// Delete a book
    pub async fn delete_book(&self, id: Uuid, force: bool) -> AppResult<()> {
        self.repository.books.delete(id, force).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }
}
