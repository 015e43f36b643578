//! Borrow record model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Borrow record lifecycle status.
/// "Late" is derived at read time from the due date and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum BorrowStatus {
    Borrowed,
    Returned,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Borrowed => "BORROWED",
            BorrowStatus::Returned => "RETURNED",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BORROWED" => Ok(BorrowStatus::Borrowed),
            "RETURNED" => Ok(BorrowStatus::Returned),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
    }
}

/// Borrow record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: BorrowStatus,
    pub created_at: DateTime<Utc>,
}

impl BorrowRecord {
    /// An outstanding record past its due date counts as late
    pub fn is_late(&self, today: NaiveDate) -> bool {
        self.status == BorrowStatus::Borrowed && self.due_date < today
    }
}

/// Book fields carried by joined borrow listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowedBook {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub cover_url: String,
    pub cover_color: String,
}

/// User fields carried by joined borrow listings (admin views only)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Borrower {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

/// Borrow record with joined book and user details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BorrowRecordDetails {
    pub id: Uuid,
    pub status: BorrowStatus,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    /// Derived display state: outstanding and past due
    pub is_late: bool,
    pub book: BorrowedBook,
    pub user: Option<Borrower>,
}

/// Borrow request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBorrow {
    pub book_id: Uuid,
}

/// Status transition request (admin borrow-requests table)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBorrowStatus {
    pub status: BorrowStatus,
}

/// Sort orders for borrow record lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BorrowSort {
    Newest,
    Oldest,
}

impl BorrowSort {
    pub fn order_clause(&self) -> &'static str {
        match self {
            BorrowSort::Newest => "br.borrow_date DESC",
            BorrowSort::Oldest => "br.borrow_date ASC",
        }
    }
}

/// Borrow record list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BorrowQuery {
    /// Search over book title, borrower name and email
    pub query: Option<String>,
    pub sort: Option<BorrowSort>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
