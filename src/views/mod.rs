//! View components rendered as text
//!
//! Views hold their own state, load through a [`LibraryApi`](crate::api::LibraryApi)
//! and render to a string. A [`Mount`] ties a pending load to the view that
//! started it so results arriving after navigation are dropped.

pub mod book_form;
pub mod book_list;
pub mod borrow_form;
pub mod borrow_summary;
pub mod not_found;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::router::Route;

/// Data state of a view
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn from_result(result: AppResult<T>) -> Self {
        match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.user_message()),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn loaded_mut(&mut self) -> Option<&mut T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Toast shown after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    pub fn from_error(err: &AppError) -> Self {
        Notification::Error(err.user_message())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error(_))
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Success(msg) => write!(f, "{}", msg),
            Notification::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Navigation scheduled after a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    pub after: Duration,
}

/// Result of a form submission that succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub notification: Notification,
    pub redirect: Option<Redirect>,
}

/// Hands out mount tokens; mounting a new view retires every earlier token
#[derive(Debug, Clone, Default)]
pub struct Mounts {
    current: Arc<AtomicU64>,
}

impl Mounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&self) -> Mount {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Mount {
            current: self.current.clone(),
            generation,
        }
    }

    /// Retire the mounted view without mounting another
    pub fn unmount_all(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct Mount {
    current: Arc<AtomicU64>,
    generation: u64,
}

impl Mount {
    pub fn is_mounted(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    /// Write `result` into `slot` only while still mounted; returns whether it was applied
    pub fn deliver<T>(&self, slot: &mut LoadState<T>, result: AppResult<T>) -> bool {
        if !self.is_mounted() {
            tracing::debug!(generation = self.generation, "discarding result for unmounted view");
            return false;
        }
        *slot = LoadState::from_result(result);
        true
    }
}

/// Plain text table with columns padded to their widest cell
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}
