//! Book collection views: card grid (home) and table (`/books`)
//!
//! Rows carry three actions. Edit navigates, delete asks for
//! confirmation first, borrow opens the borrow dialog. A row action moves
//! `Idle -> confirming -> Submitting -> Idle`; only one runs at a time.

use chrono::NaiveDate;

use crate::{
    api::{Fetch, LibraryApi},
    error::{AppError, AppResult},
    models::Book,
    router::Route,
};

use super::{borrow_form::BorrowForm, render_table, LoadState, Mount, Notification};

const DELETED: &str = "Book deleted successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Cards,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Delete,
    Borrow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowAction {
    Idle,
    /// Delete confirmation dialog is open
    ConfirmingDelete { book_id: String },
    /// Borrow dialog is open
    Borrowing(BorrowForm),
    Submitting { book_id: String, kind: ActionKind },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookListView {
    layout: Layout,
    placeholder_image_url: String,
    search: String,
    pub books: LoadState<Vec<Book>>,
    action: RowAction,
    notification: Option<Notification>,
}

impl BookListView {
    pub fn new(layout: Layout, placeholder_image_url: impl Into<String>) -> Self {
        Self {
            layout,
            placeholder_image_url: placeholder_image_url.into(),
            search: String::new(),
            books: LoadState::Loading,
            action: RowAction::Idle,
            notification: None,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub async fn load<A: LibraryApi + ?Sized>(&mut self, api: &A, mount: &Mount, fetch: Fetch) {
        let result = api
            .list_books(fetch)
            .await
            .map(|resp| resp.data.unwrap_or_default());
        mount.deliver(&mut self.books, result);
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.trim().to_string();
    }

    /// Books matching the search term; filtering never hits the server
    pub fn visible(&self) -> Vec<&Book> {
        let needle = self.search.to_lowercase();
        self.books
            .loaded()
            .map(|books| books.iter().filter(|b| b.matches(&needle)).collect())
            .unwrap_or_default()
    }

    pub fn action(&self) -> &RowAction {
        &self.action
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    fn find(&self, book_id: &str) -> AppResult<&Book> {
        self.books
            .loaded()
            .and_then(|books| books.iter().find(|b| b.id == book_id))
            .ok_or_else(|| AppError::Validation("Book not found.".into()))
    }

    fn ensure_idle(&self) -> AppResult<()> {
        match self.action {
            RowAction::Idle => Ok(()),
            _ => Err(AppError::Validation("Another action is in progress.".into())),
        }
    }

    pub fn edit_route(book: &Book) -> Route {
        Route::edit_book(book.id.clone())
    }

    /// Open the delete confirmation for a row
    pub fn request_delete(&mut self, book_id: &str) -> AppResult<()> {
        self.ensure_idle()?;
        self.find(book_id)?;
        self.action = RowAction::ConfirmingDelete {
            book_id: book_id.to_string(),
        };
        Ok(())
    }

    /// Close whichever dialog is open
    pub fn cancel(&mut self) {
        if !matches!(self.action, RowAction::Submitting { .. }) {
            self.action = RowAction::Idle;
        }
    }

    /// Delete the book awaiting confirmation. The list itself refreshes
    /// through cache invalidation.
    pub async fn confirm_delete<A: LibraryApi + ?Sized>(&mut self, api: &A) -> AppResult<Notification> {
        let RowAction::ConfirmingDelete { book_id } = &self.action else {
            return Err(AppError::Validation("No deletion awaiting confirmation.".into()));
        };
        let book_id = book_id.clone();
        self.action = RowAction::Submitting {
            book_id: book_id.clone(),
            kind: ActionKind::Delete,
        };

        let result = api.delete_book(&book_id).await;
        self.action = RowAction::Idle;

        let notification = match result {
            Ok(resp) => {
                tracing::info!(book_id = %book_id, "book deleted");
                Notification::Success(resp.message_or(DELETED))
            }
            Err(e) => {
                tracing::warn!(book_id = %book_id, "delete failed: {}", e);
                Notification::from_error(&e)
            }
        };
        self.notification = Some(notification.clone());
        Ok(notification)
    }

    /// Open the borrow dialog; refused for books without available copies
    pub fn open_borrow(&mut self, book_id: &str, today: NaiveDate, loan_days: i64) -> AppResult<&mut BorrowForm> {
        self.ensure_idle()?;
        let book = self.find(book_id)?;
        if !book.is_borrowable() {
            return Err(AppError::Validation(format!(
                "\"{}\" is not available for borrowing.",
                book.title
            )));
        }
        let form = BorrowForm::open(book.clone(), today, loan_days);
        self.action = RowAction::Borrowing(form);
        self.borrow_form_mut()
            .ok_or_else(|| AppError::Validation("No borrow dialog is open.".into()))
    }

    pub fn borrow_form_mut(&mut self) -> Option<&mut BorrowForm> {
        match &mut self.action {
            RowAction::Borrowing(form) => Some(form),
            _ => None,
        }
    }

    /// Submit the open borrow dialog.
    ///
    /// Local validation failures keep the dialog open; once a request was
    /// sent the row returns to idle whatever the outcome.
    pub async fn submit_borrow<A: LibraryApi + ?Sized>(
        &mut self,
        api: &A,
        today: NaiveDate,
    ) -> AppResult<Notification> {
        let RowAction::Borrowing(form) = &self.action else {
            return Err(AppError::Validation("No borrow dialog is open.".into()));
        };
        if let Err(e) = form.validate(today) {
            self.notification = Some(Notification::from_error(&e));
            return Err(e);
        }

        let mut form = form.clone();
        self.action = RowAction::Submitting {
            book_id: form.book().id.clone(),
            kind: ActionKind::Borrow,
        };
        let result = form.submit(api, today).await;
        self.action = RowAction::Idle;

        let notification = match result {
            Ok(submitted) => submitted.notification,
            Err(e) => Notification::from_error(&e),
        };
        self.notification = Some(notification.clone());
        Ok(notification)
    }

    fn actions_for(&self, book: &Book) -> String {
        let delete = match &self.action {
            RowAction::Submitting { book_id, kind: ActionKind::Delete } if *book_id == book.id => "Deleting...",
            _ => "Delete",
        };
        let borrow = if book.is_borrowable() { "Borrow" } else { "Borrow (disabled)" };
        format!("Edit {} | {} | {}", Self::edit_route(book), delete, borrow)
    }

    fn availability(book: &Book) -> &'static str {
        if book.available {
            "Available"
        } else {
            "Unavailable"
        }
    }

    fn render_cards(&self, books: &[&Book]) -> String {
        let mut out = String::new();
        for book in books {
            let cover = if book.img_url.is_empty() {
                self.placeholder_image_url.as_str()
            } else {
                book.img_url.as_str()
            };
            out.push_str(&format!(
                "[{}] {}\n  by {}\n  Genre: {}\n  ISBN: {}\n  Copies: {}\n  Cover: {}\n  {}\n\n",
                Self::availability(book),
                book.title,
                book.author,
                book.genre,
                book.isbn,
                book.copies,
                cover,
                self.actions_for(book),
            ));
        }
        out
    }

    fn render_rows(&self, books: &[&Book]) -> String {
        let rows: Vec<Vec<String>> = books
            .iter()
            .map(|book| {
                vec![
                    book.title.clone(),
                    book.author.clone(),
                    book.genre.clone(),
                    book.isbn.clone(),
                    book.copies.to_string(),
                    Self::availability(book).to_string(),
                    self.actions_for(book),
                ]
            })
            .collect();
        render_table(
            &["Title", "Author", "Genre", "ISBN", "Copies", "Availability", "Actions"],
            &rows,
        )
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(notification) = &self.notification {
            out.push_str(&format!("{}\n\n", notification));
        }

        match &self.books {
            LoadState::Loading => out.push_str("Loading books...\n"),
            LoadState::Failed(msg) => out.push_str(&format!("Error: {}\n", msg)),
            LoadState::Loaded(_) => {
                let books = self.visible();
                if books.is_empty() {
                    out.push_str("No books found.\n");
                } else {
                    match self.layout {
                        Layout::Cards => out.push_str(&self.render_cards(&books)),
                        Layout::Table => out.push_str(&self.render_rows(&books)),
                    }
                }
            }
        }

        match &self.action {
            RowAction::ConfirmingDelete { book_id } => {
                let title = self.find(book_id).map(|b| b.title.as_str()).unwrap_or(book_id.as_str());
                out.push_str(&format!(
                    "\nAre you sure you want to delete \"{}\"? This action cannot be undone.\n",
                    title
                ));
            }
            RowAction::Borrowing(form) => {
                out.push('\n');
                out.push_str(&form.render());
            }
            RowAction::Submitting { .. } | RowAction::Idle => {}
        }
        out
    }
}
