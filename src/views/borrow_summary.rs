//! Read-only borrow summary table

use crate::{
    api::{Fetch, LibraryApi},
    models::BorrowSummary,
};

use super::{render_table, LoadState, Mount};

#[derive(Debug, Clone, PartialEq)]
pub struct BorrowSummaryView {
    pub rows: LoadState<Vec<BorrowSummary>>,
}

impl Default for BorrowSummaryView {
    fn default() -> Self {
        Self::new()
    }
}

impl BorrowSummaryView {
    pub fn new() -> Self {
        Self {
            rows: LoadState::Loading,
        }
    }

    pub async fn load<A: LibraryApi + ?Sized>(&mut self, api: &A, mount: &Mount, fetch: Fetch) {
        let result = api
            .get_borrow_summary(fetch)
            .await
            .map(|resp| resp.data.unwrap_or_default());
        mount.deliver(&mut self.rows, result);
    }

    pub fn render(&self) -> String {
        let rows = match &self.rows {
            LoadState::Loading => return "Loading borrow summary...\n".to_string(),
            LoadState::Failed(msg) => return format!("Error: {}\n", msg),
            LoadState::Loaded(rows) => rows,
        };

        let mut out = String::from("Borrow Summary\n\n");
        if rows.is_empty() {
            out.push_str("No books have been borrowed yet.\n");
            return out;
        }

        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                vec![
                    row.book_title.clone(),
                    row.isbn.clone(),
                    row.total_quantity_borrowed.to_string(),
                    row.borrow_count.to_string(),
                ]
            })
            .collect();
        out.push_str(&render_table(
            &["Book Title", "ISBN", "Total Quantity Borrowed", "Borrow Count"],
            &cells,
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockLibraryApi;
    use crate::error::AppError;
    use crate::models::ApiResponse;
    use crate::views::Mounts;

    #[tokio::test]
    async fn test_renders_rows() {
        let mut api = MockLibraryApi::new();
        api.expect_get_borrow_summary().returning(|_| {
            Ok(ApiResponse {
                success: true,
                data: Some(vec![BorrowSummary {
                    book_id: "b1".into(),
                    book_title: "Dune".into(),
                    isbn: "9780441013593".into(),
                    total_quantity_borrowed: 4,
                    borrow_count: 2,
                }]),
                message: None,
                error: None,
            })
        });

        let mut view = BorrowSummaryView::new();
        view.load(&api, &Mounts::new().mount(), Fetch::Cached).await;
        let out = view.render();
        assert!(out.contains("Total Quantity Borrowed"));
        assert!(out.contains("Dune       | 9780441013593 | 4"));
    }

    #[tokio::test]
    async fn test_empty_and_failed() {
        let mut api = MockLibraryApi::new();
        api.expect_get_borrow_summary().times(1).returning(|_| {
            Ok(ApiResponse {
                success: true,
                data: None,
                message: None,
                error: None,
            })
        });

        let mut view = BorrowSummaryView::new();
        view.load(&api, &Mounts::new().mount(), Fetch::Fresh).await;
        assert!(view.render().contains("No books have been borrowed yet."));

        let mut api = MockLibraryApi::new();
        api.expect_get_borrow_summary()
            .returning(|_| Err(AppError::from_status(500, r#"{"error":"aggregation failed"}"#)));
        view.load(&api, &Mounts::new().mount(), Fetch::Fresh).await;
        assert_eq!(view.render(), "Error: aggregation failed\n");
    }
}
