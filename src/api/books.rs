//! Book endpoints

use crate::{
    error::AppResult,
    models::{ApiResponse, Book, BookInput, BookUpdate, Empty},
};

use super::{
    client::{ApiClient, Fetch},
    endpoints::{CREATE_BOOK, DELETE_BOOK, GET_BOOK, LIST_BOOKS, UPDATE_BOOK},
};

/// GET /books, cached under `Books`
pub async fn list_books(client: &ApiClient, fetch: Fetch) -> AppResult<ApiResponse<Vec<Book>>> {
    client.query(&LIST_BOOKS, None, fetch).await
}

/// GET /books/:id, cached under `Books:<id>`
pub async fn get_book(client: &ApiClient, id: &str, fetch: Fetch) -> AppResult<ApiResponse<Book>> {
    client.query(&GET_BOOK, Some(id), fetch).await
}

pub async fn create_book(client: &ApiClient, input: &BookInput) -> AppResult<ApiResponse<Book>> {
    tracing::info!(title = %input.title, copies = input.copies, "creating book");
    client.mutate(&CREATE_BOOK, None, Some(input)).await
}

/// PATCH /books/:id with only the fields being changed
pub async fn update_book(
    client: &ApiClient,
    id: &str,
    update: &BookUpdate,
) -> AppResult<ApiResponse<Book>> {
    tracing::info!(book_id = %id, "updating book");
    client.mutate(&UPDATE_BOOK, Some(id), Some(update)).await
}

pub async fn delete_book(client: &ApiClient, id: &str) -> AppResult<ApiResponse<Empty>> {
    tracing::info!(book_id = %id, "deleting book");
    client.mutate::<(), Empty>(&DELETE_BOOK, Some(id), None).await
}
