//! Borrow dialog: quantity and due date for one book

use chrono::{Duration, NaiveDate, NaiveTime};

use crate::{
    api::LibraryApi,
    error::{AppError, AppResult},
    models::{Book, BorrowInput},
};

use super::{Notification, Submitted};

const BORROWED: &str = "Book borrowed successfully!";

#[derive(Debug, Clone, PartialEq)]
pub struct BorrowForm {
    book: Book,
    /// Raw user input; may be zero or negative until validated
    pub quantity: i64,
    pub due_date: Option<NaiveDate>,
    submitting: bool,
}

impl BorrowForm {
    /// Open the dialog with one copy due `loan_days` after `today`.
    /// An out-of-range loan length leaves the due date unset.
    pub fn open(book: Book, today: NaiveDate, loan_days: i64) -> Self {
        let due_date = Duration::try_days(loan_days).and_then(|days| today.checked_add_signed(days));
        if due_date.is_none() {
            tracing::warn!(loan_days, "default loan length out of range");
        }
        Self {
            book,
            quantity: 1,
            due_date,
            submitting: false,
        }
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Check the form, first violation wins, and build the request
    pub fn validate(&self, today: NaiveDate) -> AppResult<BorrowInput> {
        if self.quantity < 1 {
            return Err(AppError::Validation("Quantity must be at least 1.".into()));
        }
        if self.quantity > i64::from(self.book.copies) {
            return Err(AppError::Validation(format!(
                "Cannot borrow {} copies. Only {} available.",
                self.quantity, self.book.copies
            )));
        }
        let Some(due_date) = self.due_date else {
            return Err(AppError::Validation("Please select a due date.".into()));
        };
        if due_date < today {
            return Err(AppError::Validation("Due date cannot be in the past.".into()));
        }

        Ok(BorrowInput {
            book_id: self.book.id.clone(),
            // bounded by `copies` above
            quantity: self.quantity as u32,
            due_date: due_date.and_time(NaiveTime::MIN).and_utc(),
        })
    }

    /// Validate then create the borrow. Validation failures never reach the server.
    pub async fn submit<A: LibraryApi + ?Sized>(
        &mut self,
        api: &A,
        today: NaiveDate,
    ) -> AppResult<Submitted> {
        let input = self.validate(today)?;

        self.submitting = true;
        let result = api.create_borrow(&input).await;
        self.submitting = false;

        let response = result?;
        tracing::info!(book_id = %input.book_id, quantity = input.quantity, "book borrowed");
        Ok(Submitted {
            notification: Notification::Success(response.message_or(BORROWED)),
            redirect: None,
        })
    }

    pub fn render(&self) -> String {
        let due = self
            .due_date
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_else(|| "Pick a date".to_string());
        format!(
            "Borrow \"{}\"\nAvailable copies: {}\nQuantity: {}\nDue Date: {}\n",
            self.book.title, self.book.copies, self.quantity, due
        )
    }
}
