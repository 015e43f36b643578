//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub rating: i16,
    pub cover_url: String,
    /// Dominant cover color as "#rrggbb", used by list views
    pub cover_color: String,
    pub description: String,
    pub total_copies: i32,
    pub available_copies: i32,
    pub video_url: Option<String>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

/// Create book request (admin console)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Genre is required"))]
    pub genre: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    #[validate(url(message = "Cover URL must be a valid URL or media path"))]
    pub cover_url: String,
    #[validate(length(equal = 7, message = "Cover color must be a #rrggbb value"))]
    pub cover_color: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(range(min = 1, message = "At least one copy is required"))]
    pub total_copies: i32,
    pub video_url: Option<String>,
    #[validate(length(min = 1, message = "Summary is required"))]
    pub summary: String,
}

/// Update book request; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub author: Option<String>,
    #[validate(length(min = 1))]
    pub genre: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i16>,
    pub cover_url: Option<String>,
    #[validate(length(equal = 7))]
    pub cover_color: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub total_copies: Option<i32>,
    pub video_url: Option<String>,
    pub summary: Option<String>,
}

/// Sort orders for book lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookSort {
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
}

impl Default for BookSort {
    fn default() -> Self {
        BookSort::Newest
    }
}

impl BookSort {
    /// Static mapping to an ORDER BY clause
    pub fn order_clause(&self) -> &'static str {
        match self {
            BookSort::Newest => "created_at DESC",
            BookSort::Oldest => "created_at ASC",
            BookSort::NameAsc => "title ASC",
            BookSort::NameDesc => "title DESC",
        }
    }
}

impl std::str::FromStr for BookSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(BookSort::Newest),
            "oldest" => Ok(BookSort::Oldest),
            "name_asc" => Ok(BookSort::NameAsc),
            "name_desc" => Ok(BookSort::NameDesc),
            _ => Err(format!("Invalid sort order: {}", s)),
        }
    }
}

/// Book list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Search over title, author and genre
    pub query: Option<String>,
    pub sort: Option<BookSort>,
    /// Page number (default: 1)
    pub page: Option<i64>,
    /// Items per page (default: 10)
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_query_string_values() {
        assert_eq!("newest".parse::<BookSort>().unwrap(), BookSort::Newest);
        assert_eq!("oldest".parse::<BookSort>().unwrap(), BookSort::Oldest);
        assert_eq!("name_asc".parse::<BookSort>().unwrap(), BookSort::NameAsc);
        assert_eq!("name_desc".parse::<BookSort>().unwrap(), BookSort::NameDesc);
        assert!("rating".parse::<BookSort>().is_err());
    }

    #[test]
    fn sort_maps_to_order_clause() {
        assert_eq!(BookSort::Newest.order_clause(), "created_at DESC");
        assert_eq!(BookSort::Oldest.order_clause(), "created_at ASC");
        assert_eq!(BookSort::NameAsc.order_clause(), "title ASC");
        assert_eq!(BookSort::NameDesc.order_clause(), "title DESC");
    }

    #[test]
    fn create_book_validation() {
        let book = CreateBook {
            title: "The Pragmatic Programmer".to_string(),
            author: "David Thomas".to_string(),
            genre: "Software".to_string(),
            rating: 5,
            cover_url: "https://media.example.com/covers/tpp.png".to_string(),
            cover_color: "#1c1f40".to_string(),
            description: "A classic".to_string(),
            total_copies: 3,
            video_url: None,
            summary: "Tips for working programmers".to_string(),
        };
        assert!(validator::Validate::validate(&book).is_ok());

        let invalid = CreateBook {
            rating: 9,
            total_copies: 0,
            cover_color: "blue".to_string(),
            ..book
        };
        assert!(validator::Validate::validate(&invalid).is_err());
    }
}
