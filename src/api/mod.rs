//! Typed bindings for the library REST API
//!
//! Each server capability is one operation with typed input and output.
//! Reads are cached under tags, mutations invalidate tags; see
//! [`endpoints`] for the table.

pub mod books;
pub mod borrows;
pub mod client;
pub mod endpoints;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{ApiResponse, Book, BookInput, BookUpdate, Borrow, BorrowInput, BorrowSummary, Empty},
};

pub use client::{ApiClient, Fetch};

/// Operations the views depend on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LibraryApi: Send + Sync {
    async fn list_books(&self, fetch: Fetch) -> AppResult<ApiResponse<Vec<Book>>>;

    async fn get_book(&self, id: &str, fetch: Fetch) -> AppResult<ApiResponse<Book>>;

    async fn create_book(&self, input: &BookInput) -> AppResult<ApiResponse<Book>>;

    async fn update_book(&self, id: &str, update: &BookUpdate) -> AppResult<ApiResponse<Book>>;

    async fn delete_book(&self, id: &str) -> AppResult<ApiResponse<Empty>>;

    async fn create_borrow(&self, input: &BorrowInput) -> AppResult<ApiResponse<Borrow>>;

    async fn get_borrow_summary(&self, fetch: Fetch) -> AppResult<ApiResponse<Vec<BorrowSummary>>>;
}

#[async_trait]
impl LibraryApi for ApiClient {
    async fn list_books(&self, fetch: Fetch) -> AppResult<ApiResponse<Vec<Book>>> {
        books::list_books(self, fetch).await
    }

    async fn get_book(&self, id: &str, fetch: Fetch) -> AppResult<ApiResponse<Book>> {
        books::get_book(self, id, fetch).await
    }

    async fn create_book(&self, input: &BookInput) -> AppResult<ApiResponse<Book>> {
        books::create_book(self, input).await
    }

    async fn update_book(&self, id: &str, update: &BookUpdate) -> AppResult<ApiResponse<Book>> {
        books::update_book(self, id, update).await
    }

    async fn delete_book(&self, id: &str) -> AppResult<ApiResponse<Empty>> {
        books::delete_book(self, id).await
    }

    async fn create_borrow(&self, input: &BorrowInput) -> AppResult<ApiResponse<Borrow>> {
        borrows::create_borrow(self, input).await
    }

    async fn get_borrow_summary(&self, fetch: Fetch) -> AppResult<ApiResponse<Vec<BorrowSummary>>> {
        borrows::get_borrow_summary(self, fetch).await
    }
}
