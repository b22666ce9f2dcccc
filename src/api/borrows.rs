//! Borrow endpoints

use crate::{
    error::AppResult,
    models::{ApiResponse, Borrow, BorrowInput, BorrowSummary},
};

use super::{
    client::{ApiClient, Fetch},
    endpoints::{CREATE_BORROW, GET_BORROW_SUMMARY},
};

/// POST /borrows; refreshes both the book list and the summary
pub async fn create_borrow(client: &ApiClient, input: &BorrowInput) -> AppResult<ApiResponse<Borrow>> {
    tracing::info!(
        book_id = %input.book_id,
        quantity = input.quantity,
        due_date = %input.due_date,
        "creating borrow"
    );
    client.mutate(&CREATE_BORROW, None, Some(input)).await
}

/// GET /borrows/summary, cached under `Borrows`
pub async fn get_borrow_summary(
    client: &ApiClient,
    fetch: Fetch,
) -> AppResult<ApiResponse<Vec<BorrowSummary>>> {
    client.query(&GET_BORROW_SUMMARY, None, fetch).await
}
