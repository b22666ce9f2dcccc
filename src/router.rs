//! Client-side routes

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/` card grid of every book
    Home,
    /// `/books` table of every book
    Books,
    /// `/create-book`
    CreateBook,
    /// `/edit-book/:id`
    EditBook { id: String },
    /// `/borrow-summary`
    BorrowSummary,
    /// Anything else
    NotFound { path: String },
}

impl Route {
    /// Resolve a path, ignoring any query string, fragment and trailing slash
    pub fn resolve(path: &str) -> Self {
        let trimmed = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["books"] => Route::Books,
            ["create-book"] => Route::CreateBook,
            ["edit-book", id] => Route::EditBook { id: id.to_string() },
            ["borrow-summary"] => Route::BorrowSummary,
            _ => Route::NotFound {
                path: trimmed.to_string(),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Books => "/books".to_string(),
            Route::CreateBook => "/create-book".to_string(),
            Route::EditBook { id } => format!("/edit-book/{}", id),
            Route::BorrowSummary => "/borrow-summary".to_string(),
            Route::NotFound { path } => path.clone(),
        }
    }

    pub fn edit_book(id: impl Into<String>) -> Self {
        Route::EditBook { id: id.into() }
    }
}

impl FromStr for Route {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Route::resolve(s))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Links shown in the navigation bar
pub const NAV_LINKS: [(&str, &str); 3] = [
    ("All Books", "/books"),
    ("Add Book", "/create-book"),
    ("Borrow Summary", "/borrow-summary"),
];
