//! Book model and the payloads used to create and update books

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Book record as returned by the library API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub img_url: String,
    pub copies: u32,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// A book can be borrowed only while it is flagged available and has copies left
    pub fn is_borrowable(&self) -> bool {
        self.available && self.copies > 0
    }

    /// Case-insensitive substring match over title, author, genre and ISBN.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        [&self.title, &self.author, &self.genre, &self.isbn]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Create book request (POST /books)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Genre is required"))]
    pub genre: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    pub description: String,
    pub copies: u32,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub img_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

/// Partial update request (PATCH /books/:id); absent fields are left untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Genre is required"))]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub img_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl From<BookInput> for BookUpdate {
    fn from(input: BookInput) -> Self {
        Self {
            title: Some(input.title),
            author: Some(input.author),
            genre: Some(input.genre),
            isbn: Some(input.isbn),
            description: Some(input.description),
            copies: Some(input.copies),
            img_url: Some(input.img_url),
            available: input.available,
        }
    }
}
