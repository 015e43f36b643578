//! Books repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, BookSort, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with pagination and sorting
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref q) = query.query {
            if !q.is_empty() {
                params.push(format!("%{}%", q));
                conditions.push(format!(
                    "(title ILIKE ${n} OR author ILIKE ${n} OR genre ILIKE ${n})",
                    n = params.len()
                ));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let order_clause = query.sort.unwrap_or(BookSort::Newest).order_clause();

        let select_query = format!(
            "SELECT * FROM books {} ORDER BY {} LIMIT {} OFFSET {}",
            where_clause, order_clause, per_page, offset
        );

        let mut select_builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Books sharing the genre of the given book, excluding the book itself
    pub async fn similar(&self, book_id: Uuid, limit: i64) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.* FROM books b
            WHERE b.genre = (SELECT genre FROM books WHERE id = $1)
              AND b.id != $1
            ORDER BY b.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(book_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Create a new book; all copies start available
    pub async fn create(&self, req: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, genre, rating, cover_url, cover_color,
                               description, total_copies, available_copies, video_url, summary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.author)
        .bind(&req.genre)
        .bind(req.rating)
        .bind(&req.cover_url)
        .bind(&req.cover_color)
        .bind(&req.description)
        .bind(req.total_copies)
        .bind(&req.video_url)
        .bind(&req.summary)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Update a book. `available_copies` is recomputed from the outstanding
    /// loan count inside the same transaction, so the copy-count invariant
    /// cannot drift through stock changes.
    pub async fn update(&self, id: Uuid, req: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let outstanding: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE book_id = $1 AND status = 'BORROWED'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let total = req.total_copies.unwrap_or(current.total_copies);
        if (total as i64) < outstanding {
            return Err(AppError::BusinessRule(format!(
                "Cannot set total copies to {}: {} are currently borrowed",
                total, outstanding
            )));
        }

        let available = total - outstanding as i32;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                genre = COALESCE($4, genre),
                rating = COALESCE($5, rating),
                cover_url = COALESCE($6, cover_url),
                cover_color = COALESCE($7, cover_color),
                description = COALESCE($8, description),
                total_copies = $9,
                available_copies = $10,
                video_url = COALESCE($11, video_url),
                summary = COALESCE($12, summary)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.title)
        .bind(&req.author)
        .bind(&req.genre)
        .bind(req.rating)
        .bind(&req.cover_url)
        .bind(&req.cover_color)
        .bind(&req.description)
        .bind(total)
        .bind(available)
        .bind(&req.video_url)
        .bind(&req.summary)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(book)
    }

    /// Delete a book together with its borrow history.
    /// Refused while copies are out on loan unless `force`.
    pub async fn delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let outstanding: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_records WHERE book_id = $1 AND status = 'BORROWED'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if outstanding > 0 && !force {
            return Err(AppError::Conflict(format!(
                "Book has {} outstanding borrow record(s)",
                outstanding
            )));
        }

        sqlx::query("DELETE FROM borrow_records WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Count all books
    pub async fn count_all(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Most recently added books (dashboard)
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<Book>> {
        let books =
            sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY created_at DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;
        Ok(books)
    }
}
