//! Borrow receipt composition

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{book::Book, borrow::BorrowRecord};

/// Structured borrow receipt.
/// The client renders this to PDF; the server only composes the data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowReceipt {
    /// Receipt identifier (the borrow record id)
    pub receipt_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub book_title: String,
    pub book_author: String,
    pub book_genre: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    /// Loan duration in days
    pub duration_days: i64,
}

impl BorrowReceipt {
    pub fn compose(record: &BorrowRecord, book: &Book, issued_at: DateTime<Utc>) -> Self {
        let duration_days = (record.due_date - record.borrow_date.date_naive()).num_days();
        Self {
            receipt_id: record.id,
            issued_at,
            book_title: book.title.clone(),
            book_author: book.author.clone(),
            book_genre: book.genre.clone(),
            borrow_date: record.borrow_date,
            due_date: record.due_date,
            duration_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::borrow::BorrowStatus;
    use chrono::TimeZone;

    #[test]
    fn receipt_carries_loan_duration() {
        let borrow_date = Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0).unwrap();
        let record = BorrowRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            borrow_date,
            due_date: NaiveDate::from_ymd_opt(2026, 5, 8).unwrap(),
            return_date: None,
            status: BorrowStatus::Borrowed,
            created_at: borrow_date,
        };
        let book = Book {
            id: record.book_id,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: "Science Fiction".to_string(),
            rating: 5,
            cover_url: "https://media.example.com/covers/dune.png".to_string(),
            cover_color: "#a05c22".to_string(),
            description: "Desert planet".to_string(),
            total_copies: 4,
            available_copies: 3,
            video_url: None,
            summary: "Spice".to_string(),
            created_at: borrow_date,
        };

        let receipt = BorrowReceipt::compose(&record, &book, Utc::now());
        assert_eq!(receipt.receipt_id, record.id);
        assert_eq!(receipt.duration_days, 7);
        assert_eq!(receipt.book_title, "Dune");
    }
}
