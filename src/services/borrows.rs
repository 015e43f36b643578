//! Borrow lifecycle service

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::BorrowConfig,
    error::{AppError, AppResult},
    models::{
        borrow::{BorrowQuery, BorrowRecord, BorrowRecordDetails, BorrowStatus},
        receipt::BorrowReceipt,
        user::AccountStatus,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
    config: BorrowConfig,
}

impl BorrowsService {
    pub fn new(repository: Repository, config: BorrowConfig) -> Self {
        Self { repository, config }
    }

    /// Borrow a book for a user. Only approved accounts may borrow.
    pub async fn borrow_book(&self, user_id: Uuid, book_id: Uuid) -> AppResult<BorrowRecord> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if user.status != AccountStatus::Approved {
            return Err(AppError::AccountNotApproved);
        }

        let record = self
            .repository
            .borrows
            .create(user_id, book_id, self.config.duration_days)
            .await?;

        tracing::info!(
            "User {} borrowed book {} (due {})",
            user_id,
            book_id,
            record.due_date
        );
        Ok(record)
    }

    /// Transition a borrow record between BORROWED and RETURNED
    pub async fn update_status(
        &self,
        record_id: Uuid,
        status: BorrowStatus,
    ) -> AppResult<BorrowRecord> {
        let record = self.repository.borrows.update_status(record_id, status).await?;
        tracing::info!("Borrow record {} set to {}", record_id, status);
        Ok(record)
    }

    /// Get a borrow record by ID
    pub async fn get_record(&self, record_id: Uuid) -> AppResult<BorrowRecord> {
        self.repository.borrows.get_by_id(record_id).await
    }

    /// Search borrow records with joined details (admin)
    pub async fn search_records(
        &self,
        query: &BorrowQuery,
    ) -> AppResult<(Vec<BorrowRecordDetails>, i64)> {
        self.repository.borrows.search(query).await
    }

    /// Borrow records of one user
    pub async fn user_records(&self, user_id: Uuid) -> AppResult<Vec<BorrowRecordDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        self.repository.borrows.list_for_user(user_id).await
    }

    /// Compose the borrow receipt for a record
    pub async fn receipt_for(&self, record: &BorrowRecord) -> AppResult<BorrowReceipt> {
        let book = self.repository.books.get_by_id(record.book_id).await?;
        Ok(BorrowReceipt::compose(record, &book, Utc::now()))
    }
}
