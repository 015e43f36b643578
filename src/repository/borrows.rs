//! Borrow records repository for database operations

use chrono::{NaiveDate, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::borrow::{
        BorrowQuery, BorrowRecord, BorrowRecordDetails, BorrowSort, BorrowStatus, BorrowedBook,
        Borrower,
    },
};

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow record by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>("SELECT * FROM borrow_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow record with id {} not found", id)))
    }

    /// Borrow a book for a user.
    ///
    /// The availability check and the copy-count decrement are a single
    /// conditional UPDATE, so two concurrent borrows of the last copy
    /// cannot both succeed. Zero affected rows distinguishes an absent
    /// book from an exhausted one.
    pub async fn create(
        &self,
        user_id: Uuid,
        book_id: Uuid,
        duration_days: i64,
    ) -> AppResult<BorrowRecord> {
        let mut tx = self.pool.begin().await?;

        let already_borrowed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrow_records
                WHERE user_id = $1 AND book_id = $2 AND status = 'BORROWED'
            )
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_borrowed {
            return Err(AppError::AlreadyBorrowed);
        }

        let updated = sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1 \
             WHERE id = $1 AND available_copies > 0",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                    .bind(book_id)
                    .fetch_one(&mut *tx)
                    .await?;
            return Err(if exists {
                AppError::BookNotAvailable(book_id)
            } else {
                AppError::NotFound(format!("Book with id {} not found", book_id))
            });
        }

        // Due date and borrow date come from the same database clock
        let record = sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrow_records (user_id, book_id, due_date, status)
            VALUES ($1, $2, CURRENT_DATE + $3::int, 'BORROWED')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(duration_days as i32)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(record)
    }

    /// Transition a record between BORROWED and RETURNED.
    ///
    /// The record row is locked for the duration of the transaction and
    /// the copy-count adjustments are conditional, so a transition can
    /// never push `available_copies` outside `0..=total_copies` and a
    /// same-status update is a no-op rather than a double adjustment.
    pub async fn update_status(
        &self,
        record_id: Uuid,
        new_status: BorrowStatus,
    ) -> AppResult<BorrowRecord> {
        let mut tx = self.pool.begin().await?;

        let record = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrow_records WHERE id = $1 FOR UPDATE",
        )
        .bind(record_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrow record with id {} not found", record_id)))?;

        if record.status == new_status {
            return Ok(record);
        }

        let updated = match new_status {
            BorrowStatus::Returned => {
                let result = sqlx::query(
                    "UPDATE books SET available_copies = available_copies + 1 \
                     WHERE id = $1 AND available_copies < total_copies",
                )
                .bind(record.book_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::Conflict(
                        "All copies of this book are already in stock".to_string(),
                    ));
                }

                sqlx::query_as::<_, BorrowRecord>(
                    "UPDATE borrow_records SET status = $2, return_date = CURRENT_DATE \
                     WHERE id = $1 RETURNING *",
                )
                .bind(record_id)
                .bind(BorrowStatus::Returned)
                .fetch_one(&mut *tx)
                .await?
            }
            BorrowStatus::Borrowed => {
                let result = sqlx::query(
                    "UPDATE books SET available_copies = available_copies - 1 \
                     WHERE id = $1 AND available_copies > 0",
                )
                .bind(record.book_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::BookNotAvailable(record.book_id));
                }

                sqlx::query_as::<_, BorrowRecord>(
                    "UPDATE borrow_records SET status = $2, return_date = NULL \
                     WHERE id = $1 RETURNING *",
                )
                .bind(record_id)
                .bind(BorrowStatus::Borrowed)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        Ok(updated)
    }

    /// Search borrow records with joined book and user details
    pub async fn search(
        &self,
        query: &BorrowQuery,
    ) -> AppResult<(Vec<BorrowRecordDetails>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref q) = query.query {
            if !q.is_empty() {
                params.push(format!("%{}%", q));
                conditions.push(format!(
                    "(b.title ILIKE ${n} OR u.full_name ILIKE ${n} OR u.email ILIKE ${n})",
                    n = params.len()
                ));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!(
            r#"
            SELECT COUNT(*)
            FROM borrow_records br
            JOIN books b ON br.book_id = b.id
            JOIN users u ON br.user_id = u.id
            {}
            "#,
            where_clause
        );
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let order_clause = query.sort.unwrap_or(BorrowSort::Newest).order_clause();

        let select_query = format!(
            r#"
            SELECT br.id, br.status, br.borrow_date, br.due_date, br.return_date,
                   b.id as book_id, b.title, b.author, b.genre, b.cover_url, b.cover_color,
                   u.id as user_id, u.full_name, u.email
            FROM borrow_records br
            JOIN books b ON br.book_id = b.id
            JOIN users u ON br.user_id = u.id
            {}
            ORDER BY {}
            LIMIT {} OFFSET {}
            "#,
            where_clause, order_clause, per_page, offset
        );

        let mut select_builder = sqlx::query(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let rows = select_builder.fetch_all(&self.pool).await?;

        let today = Utc::now().date_naive();
        let records = rows
            .iter()
            .map(|row| Self::details_from_row(row, today, true))
            .collect();

        Ok((records, total))
    }

    /// All borrow records of one user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowRecordDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT br.id, br.status, br.borrow_date, br.due_date, br.return_date,
                   b.id as book_id, b.title, b.author, b.genre, b.cover_url, b.cover_color
            FROM borrow_records br
            JOIN books b ON br.book_id = b.id
            WHERE br.user_id = $1
            ORDER BY br.borrow_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();
        Ok(rows
            .iter()
            .map(|row| Self::details_from_row(row, today, false))
            .collect())
    }

    /// Count outstanding (not yet returned) records
    pub async fn count_outstanding(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrow_records WHERE status = 'BORROWED'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Most recent borrow records with details (dashboard)
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<BorrowRecordDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT br.id, br.status, br.borrow_date, br.due_date, br.return_date,
                   b.id as book_id, b.title, b.author, b.genre, b.cover_url, b.cover_color,
                   u.id as user_id, u.full_name, u.email
            FROM borrow_records br
            JOIN books b ON br.book_id = b.id
            JOIN users u ON br.user_id = u.id
            ORDER BY br.borrow_date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();
        Ok(rows
            .iter()
            .map(|row| Self::details_from_row(row, today, true))
            .collect())
    }

    fn details_from_row(row: &PgRow, today: NaiveDate, with_user: bool) -> BorrowRecordDetails {
        let status: BorrowStatus = row.get("status");
        let due_date: NaiveDate = row.get("due_date");

        BorrowRecordDetails {
            id: row.get("id"),
            status,
            borrow_date: row.get("borrow_date"),
            due_date,
            return_date: row.get("return_date"),
            is_late: status == BorrowStatus::Borrowed && due_date < today,
            book: BorrowedBook {
                id: row.get("book_id"),
                title: row.get("title"),
                author: row.get("author"),
                genre: row.get("genre"),
                cover_url: row.get("cover_url"),
                cover_color: row.get("cover_color"),
            },
            user: with_user.then(|| Borrower {
                id: row.get("user_id"),
                full_name: row.get("full_name"),
                email: row.get("email"),
            }),
        }
    }
}
