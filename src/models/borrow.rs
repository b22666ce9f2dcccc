//! Borrow (loan) model, borrow request and the server-side summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Borrow transaction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrow {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub book_id: String,
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub isbn: String,
    pub quantity: u32,
    pub due_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrow_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Borrow request (POST /borrows)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowInput {
    pub book_id: String,
    pub quantity: u32,
    /// Due date, sent as an ISO 8601 timestamp
    pub due_date: DateTime<Utc>,
}

/// Aggregated borrow figures for one book, computed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowSummary {
    #[serde(rename = "_id", alias = "bookId", default)]
    pub book_id: String,
    pub book_title: String,
    pub isbn: String,
    pub total_quantity_borrowed: u32,
    #[serde(default)]
    pub borrow_count: u32,
}
