//! Application shell: resolves a route to its view, loads it through the
//! shared context and re-renders it when the cache reports invalidations

use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::{
    api::Fetch,
    cache::{Invalidation, Tag, TagType},
    router::{Route, NAV_LINKS},
    views::{
        book_form::{BookForm, EditBookView},
        book_list::{BookListView, Layout},
        borrow_summary::BorrowSummaryView,
        not_found, Mounts, Redirect,
    },
    AppState,
};

/// The mounted view
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    List(BookListView),
    CreateBook(BookForm),
    EditBook(EditBookView),
    BorrowSummary(BorrowSummaryView),
    NotFound(String),
}

impl Page {
    /// Tags whose invalidation makes this page stale
    fn watched_tags(&self) -> Vec<Tag> {
        match self {
            Page::List(_) => vec![Tag::all(TagType::Books)],
            Page::EditBook(view) => vec![Tag::with_id(TagType::Books, view.id.clone())],
            Page::BorrowSummary(_) => vec![Tag::all(TagType::Borrows)],
            Page::CreateBook(_) | Page::NotFound(_) => Vec::new(),
        }
    }
}

pub struct App {
    state: AppState,
    mounts: Mounts,
    route: Route,
    page: Page,
    events: broadcast::Receiver<Invalidation>,
}

impl App {
    pub fn new(state: AppState) -> Self {
        let events = state.api.cache().subscribe();
        Self {
            state,
            mounts: Mounts::new(),
            route: Route::Home,
            page: Page::NotFound(String::new()),
            events,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// Handle used to retire the mounted view from elsewhere
    pub fn mounts(&self) -> Mounts {
        self.mounts.clone()
    }

    /// Mount the view for `path` and load its data
    pub async fn navigate(&mut self, path: &str) -> &Page {
        let route = Route::resolve(path);
        tracing::info!(route = %route, "navigating");

        let fetch = if self.state.config.cache.refetch_on_mount {
            Fetch::Fresh
        } else {
            Fetch::Cached
        };
        self.route = route.clone();
        self.page = self.mount(&route, fetch).await;
        // Events raised before this mount are already reflected
        self.drain_events();
        &self.page
    }

    /// Wait out the redirect delay, then navigate
    pub async fn follow(&mut self, redirect: &Redirect) -> &Page {
        self.mounts.unmount_all();
        tokio::time::sleep(redirect.after).await;
        self.navigate(&redirect.to.path()).await
    }

    async fn mount(&self, route: &Route, fetch: Fetch) -> Page {
        let mount = self.mounts.mount();
        let api = &self.state.api;
        let placeholder = &self.state.config.ui.placeholder_image_url;

        match route {
            Route::Home | Route::Books => {
                let layout = if *route == Route::Home {
                    Layout::Cards
                } else {
                    Layout::Table
                };
                let mut view = BookListView::new(layout, placeholder.clone());
                view.load(api, &mount, fetch).await;
                Page::List(view)
            }
            Route::CreateBook => Page::CreateBook(BookForm::create()),
            Route::EditBook { id } => {
                let mut view = EditBookView::new(id.clone());
                view.load(api, &mount, fetch).await;
                Page::EditBook(view)
            }
            Route::BorrowSummary => {
                let mut view = BorrowSummaryView::new();
                view.load(api, &mount, fetch).await;
                Page::BorrowSummary(view)
            }
            Route::NotFound { path } => Page::NotFound(path.clone()),
        }
    }

    fn drain_events(&mut self) -> Vec<Invalidation> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "invalidation events lagged");
                    // Treat as a full invalidation
                    events.push(Invalidation {
                        tags: vec![Tag::all(TagType::Books), Tag::all(TagType::Borrows)],
                        evicted: 0,
                    });
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        events
    }

    /// Reload the mounted view if a mutation invalidated what it shows.
    /// Returns whether a reload happened.
    pub async fn refresh(&mut self) -> bool {
        let events = self.drain_events();
        let watched = self.page.watched_tags();
        let stale = events.iter().any(|event| {
            event
                .tags
                .iter()
                .any(|invalidated| watched.iter().any(|tag| tag.is_hit_by(invalidated)))
        });
        if !stale {
            return false;
        }

        tracing::debug!(route = %self.route, "reloading invalidated view");
        let mount = self.mounts.mount();
        let api = &self.state.api;
        match &mut self.page {
            Page::List(view) => view.load(api, &mount, Fetch::Cached).await,
            Page::EditBook(view) => view.load(api, &mount, Fetch::Cached).await,
            Page::BorrowSummary(view) => view.load(api, &mount, Fetch::Cached).await,
            Page::CreateBook(_) | Page::NotFound(_) => {}
        }
        true
    }

    /// Navigation bar followed by the mounted view
    pub fn render(&self) -> String {
        let nav = NAV_LINKS
            .iter()
            .map(|(label, path)| format!("{} ({})", label, path))
            .collect::<Vec<_>>()
            .join("  ");

        let body = match &self.page {
            Page::List(view) => view.render(),
            Page::CreateBook(form) => form.render(),
            Page::EditBook(view) => view.render(),
            Page::BorrowSummary(view) => view.render(),
            Page::NotFound(path) => not_found::render(path),
        };

        format!("Library  |  {}\n\n{}\n", nav, body)
    }
}
