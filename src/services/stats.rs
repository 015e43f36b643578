//! Dashboard statistics service

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{book::Book, borrow::BorrowRecordDetails, user::UserSummary},
    repository::Repository,
};

/// Number of rows shown per dashboard panel
const DASHBOARD_PANEL_LIMIT: i64 = 6;

/// Admin dashboard summary
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    /// Total number of books in the catalog
    pub total_books: i64,
    /// Total number of user accounts
    pub total_users: i64,
    /// Currently borrowed (not yet returned) copies
    pub borrowed_books: i64,
    /// Most recently added books
    pub recent_books: Vec<Book>,
    /// Most recent borrow records
    pub borrow_requests: Vec<BorrowRecordDetails>,
    /// Most recent pending account requests
    pub account_requests: Vec<UserSummary>,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Collect the admin dashboard summary
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let total_books = self.repository.books.count_all().await?;
        let total_users = self.repository.users.count_all().await?;
        let borrowed_books = self.repository.borrows.count_outstanding().await?;
        let recent_books = self.repository.books.recent(DASHBOARD_PANEL_LIMIT).await?;
        let borrow_requests = self.repository.borrows.recent(DASHBOARD_PANEL_LIMIT).await?;
        let account_requests = self
            .repository
            .users
            .recent_pending(DASHBOARD_PANEL_LIMIT)
            .await?;

        Ok(DashboardStats {
            total_books,
            total_users,
            borrowed_books,
            recent_books,
            borrow_requests,
            account_requests,
        })
    }
}
