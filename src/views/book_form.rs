//! Add and edit book forms

use std::time::Duration;

use validator::{Validate, ValidationErrors};

use crate::{
    api::{Fetch, LibraryApi},
    config::UiConfig,
    error::{AppError, AppResult},
    models::{Book, BookInput, BookUpdate},
    router::Route,
};

use super::{LoadState, Mount, Notification, Redirect, Submitted};

const ADDED: &str = "Book added successfully!";
const UPDATED: &str = "Book updated successfully!";

/// Field order used to pick the first validation message
const FIELD_ORDER: [&str; 5] = ["title", "author", "genre", "isbn", "img_url"];

/// Availability actually sent: never true without copies
pub fn derive_available(copies: u32, toggle: bool) -> bool {
    copies > 0 && toggle
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookForm {
    mode: FormMode,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: String,
    pub description: String,
    pub img_url: String,
    copies: u32,
    available_toggle: bool,
    submitting: bool,
}

impl BookForm {
    /// Empty add form: one copy, available
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            title: String::new(),
            author: String::new(),
            genre: String::new(),
            isbn: String::new(),
            description: String::new(),
            img_url: String::new(),
            copies: 1,
            available_toggle: true,
            submitting: false,
        }
    }

    /// Edit form pre-populated from an existing book
    pub fn edit(book: &Book) -> Self {
        Self {
            mode: FormMode::Edit { id: book.id.clone() },
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            isbn: book.isbn.clone(),
            description: book.description.clone(),
            img_url: book.img_url.clone(),
            copies: book.copies,
            available_toggle: book.available,
            submitting: false,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn copies(&self) -> u32 {
        self.copies
    }

    /// Changing copies resets the toggle to "has copies"
    pub fn set_copies(&mut self, copies: u32) {
        self.copies = copies;
        self.available_toggle = copies > 0;
    }

    /// The toggle is ignored while there are no copies
    pub fn toggle_enabled(&self) -> bool {
        self.copies > 0
    }

    pub fn set_available(&mut self, available: bool) {
        if self.toggle_enabled() {
            self.available_toggle = available;
        }
    }

    pub fn available(&self) -> bool {
        derive_available(self.copies, self.available_toggle)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Build the outgoing payload, filling the placeholder cover when empty
    pub fn to_input(&self, placeholder_image_url: &str) -> BookInput {
        let img_url = if self.img_url.trim().is_empty() {
            placeholder_image_url.to_string()
        } else {
            self.img_url.trim().to_string()
        };
        BookInput {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            genre: self.genre.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            description: self.description.clone(),
            copies: self.copies,
            img_url,
            available: Some(self.available()),
        }
    }

    /// Validate and build the payload without sending anything
    pub fn validate(&self, placeholder_image_url: &str) -> AppResult<BookInput> {
        let input = self.to_input(placeholder_image_url);
        input
            .validate()
            .map_err(|errors| AppError::Validation(first_message(&errors)))?;
        Ok(input)
    }

    /// Create or update the book, then schedule the redirect to the book list
    pub async fn submit<A: LibraryApi + ?Sized>(
        &mut self,
        api: &A,
        ui: &UiConfig,
    ) -> AppResult<Submitted> {
        let input = self.validate(&ui.placeholder_image_url)?;

        self.submitting = true;
        let result = match &self.mode {
            FormMode::Create => api.create_book(&input).await.map(|r| r.message_or(ADDED)),
            FormMode::Edit { id } => api
                .update_book(id, &BookUpdate::from(input))
                .await
                .map(|r| r.message_or(UPDATED)),
        };
        self.submitting = false;

        let message = result?;
        if self.mode == FormMode::Create {
            // ready for the next entry
            *self = BookForm::create();
        }

        Ok(Submitted {
            notification: Notification::Success(message),
            redirect: Some(Redirect {
                to: Route::Books,
                after: Duration::from_millis(ui.redirect_delay_ms),
            }),
        })
    }

    pub fn render(&self) -> String {
        let heading = match self.mode {
            FormMode::Create => "Add New Book",
            FormMode::Edit { .. } => "Edit Book",
        };
        let mut out = format!(
            "{}\n\nTitle:       {}\nAuthor:      {}\nGenre:       {}\nISBN:        {}\nDescription: {}\nImage URL:   {}\nCopies:      {}\nAvailable:   {}\n",
            heading,
            self.title,
            self.author,
            self.genre,
            self.isbn,
            self.description,
            self.img_url,
            self.copies,
            if self.available() { "yes" } else { "no" },
        );
        if !self.toggle_enabled() {
            out.push_str("(Automatically set to Unavailable if copies are 0)\n");
        }
        out
    }
}

fn first_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<(usize, String)> = errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            let field: &str = field.as_ref();
            let rank = FIELD_ORDER
                .iter()
                .position(|f| *f == field)
                .unwrap_or(FIELD_ORDER.len());
            errs.iter()
                .find_map(|e| e.message.as_ref().map(|m| (rank, m.to_string())))
        })
        .collect();
    messages.sort_by_key(|(rank, _)| *rank);
    messages
        .into_iter()
        .next()
        .map(|(_, message)| message)
        .unwrap_or_else(|| "Invalid book details.".to_string())
}

/// Edit page: the form once the book has loaded
#[derive(Debug, Clone, PartialEq)]
pub struct EditBookView {
    pub id: String,
    pub state: LoadState<Option<BookForm>>,
}

impl EditBookView {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: LoadState::Loading,
        }
    }

    pub async fn load<A: LibraryApi + ?Sized>(&mut self, api: &A, mount: &Mount, fetch: Fetch) {
        let result = api
            .get_book(&self.id, fetch)
            .await
            .map(|resp| resp.data.as_ref().map(BookForm::edit));
        mount.deliver(&mut self.state, result);
    }

    pub fn form_mut(&mut self) -> Option<&mut BookForm> {
        self.state.loaded_mut().and_then(Option::as_mut)
    }

    pub fn render(&self) -> String {
        match &self.state {
            LoadState::Loading => "Loading book details...\n".to_string(),
            LoadState::Failed(msg) => format!("Error: {}\n", msg),
            LoadState::Loaded(None) => "Book not found.\n".to_string(),
            LoadState::Loaded(Some(form)) => form.render(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockLibraryApi;
    use crate::config::PLACEHOLDER_IMAGE_URL;
    use crate::models::ApiResponse;
    use crate::views::Mounts;

    fn filled() -> BookForm {
        let mut form = BookForm::create();
        form.title = "Dune".into();
        form.author = "Frank Herbert".into();
        form.genre = "SCIENCE".into();
        form.isbn = "9780441013593".into();
        form
    }

    fn stored(copies: u32, available: bool) -> Book {
        Book {
            id: "b1".into(),
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            genre: "SCIENCE".into(),
            isbn: "9780441013593".into(),
            description: "Arrakis".into(),
            img_url: "https://example.com/dune.jpg".into(),
            copies,
            available,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_derive_available() {
        assert!(!derive_available(0, true));
        assert!(!derive_available(0, false));
        assert!(derive_available(1, true));
        assert!(!derive_available(4, false));
    }

    #[test]
    fn test_zero_copies_forces_unavailable() {
        let mut form = filled();
        form.set_copies(0);
        form.set_available(true);
        assert!(!form.toggle_enabled());
        let input = form.validate(PLACEHOLDER_IMAGE_URL).unwrap();
        assert_eq!(input.copies, 0);
        assert_eq!(input.available, Some(false));
    }

    #[test]
    fn test_copies_change_resets_toggle() {
        let mut form = filled();
        form.set_available(false);
        form.set_copies(3);
        assert!(form.available());
    }

    #[test]
    fn test_placeholder_image() {
        let input = filled().to_input(PLACEHOLDER_IMAGE_URL);
        assert_eq!(input.img_url, PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn test_required_fields_in_order() {
        let mut form = filled();
        form.author.clear();
        form.isbn = "  ".into();
        assert_eq!(
            form.validate(PLACEHOLDER_IMAGE_URL).unwrap_err().user_message(),
            "Author is required"
        );

        let mut form = filled();
        form.img_url = "not a url".into();
        assert_eq!(
            form.validate(PLACEHOLDER_IMAGE_URL).unwrap_err().user_message(),
            "Image URL must be a valid URL"
        );
    }

    #[tokio::test]
    async fn test_create_submits_and_redirects() {
        let mut api = MockLibraryApi::new();
        api.expect_create_book()
            .withf(|input| input.copies == 0 && input.available == Some(false))
            .times(1)
            .returning(|_| {
                Ok(ApiResponse {
                    success: true,
                    data: None,
                    message: None,
                    error: None,
                })
            });

        let mut form = filled();
        form.set_copies(0);
        form.set_available(true);
        let ui = UiConfig::default();
        let submitted = form.submit(&api, &ui).await.unwrap();

        assert_eq!(submitted.notification, Notification::Success(ADDED.into()));
        let redirect = submitted.redirect.unwrap();
        assert_eq!(redirect.to, Route::Books);
        assert_eq!(redirect.after, Duration::from_millis(1500));
        assert_eq!(form, BookForm::create());
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let mut api = MockLibraryApi::new();
        api.expect_create_book().never();

        let mut form = BookForm::create();
        let err = form.submit(&api, &UiConfig::default()).await.unwrap_err();
        assert_eq!(err.user_message(), "Title is required");
    }

    #[tokio::test]
    async fn test_edit_loads_and_updates() {
        let mut api = MockLibraryApi::new();
        api.expect_get_book()
            .withf(|id, _| id == "b1")
            .returning(|_, _| {
                Ok(ApiResponse {
                    success: true,
                    data: Some(stored(2, true)),
                    message: None,
                    error: None,
                })
            });
        api.expect_update_book()
            .withf(|id, update| id == "b1" && update.copies == Some(5) && update.available == Some(true))
            .times(1)
            .returning(|_, _| {
                Ok(ApiResponse {
                    success: true,
                    data: Some(stored(5, true)),
                    message: Some("Book updated".into()),
                    error: None,
                })
            });

        let mounts = Mounts::new();
        let mut view = EditBookView::new("b1");
        view.load(&api, &mounts.mount(), Fetch::Cached).await;

        let form = view.form_mut().unwrap();
        assert_eq!(form.mode(), &FormMode::Edit { id: "b1".into() });
        assert_eq!(form.description, "Arrakis");
        form.set_copies(5);

        let submitted = form.submit(&api, &UiConfig::default()).await.unwrap();
        assert_eq!(submitted.notification, Notification::Success("Book updated".into()));
        // edit forms keep their values
        assert_eq!(form.copies(), 5);
    }

    #[tokio::test]
    async fn test_edit_missing_book() {
        let mut api = MockLibraryApi::new();
        api.expect_get_book().returning(|_, _| {
            Ok(ApiResponse {
                success: true,
                data: None,
                message: None,
                error: None,
            })
        });

        let mut view = EditBookView::new("gone");
        view.load(&api, &Mounts::new().mount(), Fetch::Cached).await;
        assert_eq!(view.render(), "Book not found.\n");
    }

    #[tokio::test]
    async fn test_edit_load_failure() {
        let mut api = MockLibraryApi::new();
        api.expect_get_book()
            .returning(|_, _| Err(AppError::from_status(404, r#"{"success":false,"message":"Book not found"}"#)));

        let mut view = EditBookView::new("gone");
        view.load(&api, &Mounts::new().mount(), Fetch::Cached).await;
        assert_eq!(view.render(), "Error: Book not found\n");
    }
}
