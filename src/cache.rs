//! In-process response cache keyed by endpoint and argument, invalidated by tags
//!
//! Reads record the tags they provide; mutations name the tags they
//! invalidate. Every invalidation is broadcast so mounted views can
//! re-render from fresh data.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;

/// Kind of cached resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    Books,
    Borrows,
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagType::Books => write!(f, "Books"),
            TagType::Borrows => write!(f, "Borrows"),
        }
    }
}

/// A class of cached data: a whole resource type or a single record of it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: TagType,
    pub id: Option<String>,
}

impl Tag {
    pub fn all(kind: TagType) -> Self {
        Self { kind, id: None }
    }

    pub fn with_id(kind: TagType, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    /// Whether data providing `self` must be dropped when `invalidated` is invalidated.
    ///
    /// A type-wide tag hits every tag of that type. An id tag hits the same id
    /// and the type-wide providers (lists that may contain the record).
    pub fn is_hit_by(&self, invalidated: &Tag) -> bool {
        self.kind == invalidated.kind
            && (invalidated.id.is_none() || self.id.is_none() || self.id == invalidated.id)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}:{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Cache slot: endpoint name plus the serialized argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub endpoint: &'static str,
    pub arg: String,
}

impl CacheKey {
    pub fn new(endpoint: &'static str, arg: Option<&str>) -> Self {
        Self {
            endpoint,
            arg: arg.unwrap_or_default().to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arg.is_empty() {
            write!(f, "{}", self.endpoint)
        } else {
            write!(f, "{}({})", self.endpoint, self.arg)
        }
    }
}

/// Broadcast to subscribers after a mutation completes
#[derive(Debug, Clone, PartialEq)]
pub struct Invalidation {
    pub tags: Vec<Tag>,
    pub evicted: usize,
}

/// Marks the start of a read; a store with an outdated ticket is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    tags: Vec<Tag>,
    stored_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Entry>,
    generation: u64,
    last_invalidated: HashMap<Tag, u64>,
}

#[derive(Clone)]
pub struct TagCache {
    inner: Arc<Mutex<Inner>>,
    ttl: Duration,
    events: broadcast::Sender<Invalidation>,
}

impl TagCache {
    pub fn new(ttl: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            ttl,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The map stays consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fresh cached value for `key`, if any
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey) -> Option<T> {
        let mut inner = self.lock();
        let expired = match inner.entries.get(key) {
            None => {
                tracing::debug!(key = %key, "cache miss");
                return None;
            }
            Some(entry) => entry.stored_at.elapsed() >= self.ttl,
        };
        if expired {
            tracing::debug!(key = %key, "cache entry expired");
            inner.entries.remove(key);
            return None;
        }
        let value = inner
            .entries
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned();
        if value.is_some() {
            tracing::debug!(key = %key, "cache hit");
        }
        value
    }

    /// Take a ticket before issuing the request whose result will be stored
    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.lock().generation)
    }

    /// Store a read result under `key` providing `tags`.
    ///
    /// Returns false, without storing, when one of `tags` was invalidated
    /// after `ticket` was taken.
    pub fn insert<T: Send + Sync + 'static>(
        &self,
        key: CacheKey,
        tags: Vec<Tag>,
        value: T,
        ticket: FetchTicket,
    ) -> bool {
        let mut inner = self.lock();
        let stale = inner.last_invalidated.iter().any(|(invalidated, generation)| {
            *generation > ticket.0 && tags.iter().any(|tag| tag.is_hit_by(invalidated))
        });
        if stale {
            tracing::debug!(key = %key, "discarding result fetched before invalidation");
            return false;
        }
        inner.entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                tags,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Drop every entry providing a tag hit by one of `tags` and notify subscribers
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let evicted = {
            let mut inner = self.lock();
            inner.generation += 1;
            let generation = inner.generation;
            for tag in tags {
                inner.last_invalidated.insert(tag.clone(), generation);
            }
            let before = inner.entries.len();
            inner
                .entries
                .retain(|_, entry| !entry.tags.iter().any(|p| tags.iter().any(|t| p.is_hit_by(t))));
            before - inner.entries.len()
        };

        let names: Vec<String> = tags.iter().map(ToString::to_string).collect();
        tracing::debug!(tags = ?names, evicted, "cache invalidated");

        // No subscribers is fine
        let _ = self.events.send(Invalidation {
            tags: tags.to_vec(),
            evicted,
        });
        evicted
    }

    /// Receive every future invalidation
    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
