//! Data models shared by the API layer and the views

pub mod book;
pub mod borrow;
pub mod envelope;

// Re-export commonly used types
pub use book::{Book, BookInput, BookUpdate};
pub use borrow::{Borrow, BorrowInput, BorrowSummary};
pub use envelope::{ApiResponse, Empty};
