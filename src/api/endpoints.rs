//! Declarative endpoint table: request shape and cache tags per operation

use reqwest::Url;

use crate::{
    cache::{Tag, TagType},
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// How a tag is derived from the operation argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRule {
    /// The whole resource type
    All(TagType),
    /// The record named by the operation's id argument
    ById(TagType),
}

impl TagRule {
    pub fn resolve(&self, id: Option<&str>) -> Tag {
        match (self, id) {
            (TagRule::ById(kind), Some(id)) => Tag::with_id(*kind, id),
            (TagRule::ById(kind), None) | (TagRule::All(kind), _) => Tag::all(*kind),
        }
    }
}

/// One server capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path relative to the API base URL; `:id` is substituted
    pub path: &'static str,
    pub provides: &'static [TagRule],
    pub invalidates: &'static [TagRule],
}

impl Endpoint {
    pub fn is_query(&self) -> bool {
        self.method == HttpMethod::Get
    }

    /// Full request URL under `base`. The id becomes one percent-encoded
    /// path segment; ids that would move out of it are rejected.
    pub fn url(&self, base: &Url, id: Option<&str>) -> AppResult<Url> {
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::Config(config::ConfigError::Message(format!(
                    "API base URL {} cannot carry a path",
                    base
                )))
            })?;
            segments.pop_if_empty();
            for part in self.path.split('/').filter(|part| !part.is_empty()) {
                if part != ":id" {
                    segments.push(part);
                    continue;
                }
                match id {
                    Some(id) if !matches!(id.trim(), "" | "." | "..") => {
                        segments.push(id);
                    }
                    _ => {
                        return Err(AppError::Validation(format!(
                            "Invalid id \"{}\".",
                            id.unwrap_or_default()
                        )))
                    }
                }
            }
        }
        Ok(url)
    }

    pub fn provided_tags(&self, id: Option<&str>) -> Vec<Tag> {
        self.provides.iter().map(|rule| rule.resolve(id)).collect()
    }

    pub fn invalidated_tags(&self, id: Option<&str>) -> Vec<Tag> {
        self.invalidates.iter().map(|rule| rule.resolve(id)).collect()
    }
}

pub const LIST_BOOKS: Endpoint = Endpoint {
    name: "getBooks",
    method: HttpMethod::Get,
    path: "/books",
    provides: &[TagRule::All(TagType::Books)],
    invalidates: &[],
};

pub const GET_BOOK: Endpoint = Endpoint {
    name: "getBookById",
    method: HttpMethod::Get,
    path: "/books/:id",
    provides: &[TagRule::ById(TagType::Books)],
    invalidates: &[],
};

pub const CREATE_BOOK: Endpoint = Endpoint {
    name: "createBook",
    method: HttpMethod::Post,
    path: "/books",
    provides: &[],
    invalidates: &[TagRule::All(TagType::Books)],
};

pub const UPDATE_BOOK: Endpoint = Endpoint {
    name: "updateBook",
    method: HttpMethod::Patch,
    path: "/books/:id",
    provides: &[],
    invalidates: &[TagRule::ById(TagType::Books)],
};

pub const DELETE_BOOK: Endpoint = Endpoint {
    name: "deleteBook",
    method: HttpMethod::Delete,
    path: "/books/:id",
    provides: &[],
    invalidates: &[TagRule::All(TagType::Books)],
};

pub const CREATE_BORROW: Endpoint = Endpoint {
    name: "createBorrow",
    method: HttpMethod::Post,
    path: "/borrows",
    provides: &[],
    invalidates: &[TagRule::All(TagType::Books), TagRule::All(TagType::Borrows)],
};

pub const GET_BORROW_SUMMARY: Endpoint = Endpoint {
    name: "getBorrowSummary",
    method: HttpMethod::Get,
    path: "/borrows/summary",
    provides: &[TagRule::All(TagType::Borrows)],
    invalidates: &[],
};

pub const ENDPOINTS: [Endpoint; 7] = [
    LIST_BOOKS,
    GET_BOOK,
    CREATE_BOOK,
    UPDATE_BOOK,
    DELETE_BOOK,
    CREATE_BORROW,
    GET_BORROW_SUMMARY,
];
