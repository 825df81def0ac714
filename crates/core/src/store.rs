//! Storage collaborator boundary.
//!
//! The engine never issues queries itself: listings hand a resolved
//! [`PageQuery`] to [`PageStore::find`], and handlers load and save whole
//! [`Page`] aggregates. `quire-db` provides the Postgres implementation;
//! [`MemoryPageStore`] backs tests and database-less deployments.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::page::Page;
use crate::query::{PageQuery, PageSort};
use crate::types::DbId;

/// Failures reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (e.g. two pages sharing a path).
    #[error("{0}")]
    Conflict(String),

    /// The aggregate cannot be persisted in its current state.
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// Opaque backend failure (connection, decoding, I/O).
    #[error("Storage backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

/// One window of a listing plus the size of the whole filtered set.
#[derive(Debug, Clone, Default)]
pub struct PageSet {
    pub pages: Vec<Page>,
    /// Count ignoring `offset`/`limit`.
    pub total: i64,
}

/// Load/save primitives required from a storage backend.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Apply the query's filters, ordering, and window.
    async fn find(&self, query: &PageQuery) -> Result<PageSet, StoreError>;

    /// Number of trashed pages.
    async fn count_trashed(&self) -> Result<i64, StoreError>;

    async fn load_by_id(&self, id: DbId) -> Result<Option<Page>, StoreError>;

    /// Load the page whose current revision has canonical path `path`.
    async fn load_by_path(&self, path: &str) -> Result<Option<Page>, StoreError>;

    /// Insert or replace `page`, assigning its id on first save.
    async fn save(&self, page: &mut Page) -> Result<DbId, StoreError>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local [`PageStore`] keyed by page id.
///
/// Writers are serialized by the inner `RwLock`; path uniqueness is checked
/// against the canonical path of every stored page's current revision.
#[derive(Debug)]
pub struct MemoryPageStore {
    pages: RwLock<BTreeMap<DbId, Page>>,
    next_id: AtomicI64,
}

impl Default for MemoryPageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn find(&self, query: &PageQuery) -> Result<PageSet, StoreError> {
        let pages = self.pages.read().await;

        let mut matched: Vec<(f64, &Page)> = pages
            .values()
            .filter(|page| query.matches(page))
            .map(|page| (query.relevance(page), page))
            .collect();
        matched.sort_by(|a, b| compare(query.sort, a, b));

        let total = matched.len() as i64;
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let window = matched.into_iter().skip(offset).map(|(_, page)| page.clone());
        let pages = match query.limit {
            Some(limit) => window.take(usize::try_from(limit).unwrap_or(0)).collect(),
            None => window.collect(),
        };

        Ok(PageSet { pages, total })
    }

    async fn count_trashed(&self) -> Result<i64, StoreError> {
        let pages = self.pages.read().await;
        Ok(pages.values().filter(|p| p.is_trashed()).count() as i64)
    }

    async fn load_by_id(&self, id: DbId) -> Result<Option<Page>, StoreError> {
        Ok(self.pages.read().await.get(&id).cloned())
    }

    async fn load_by_path(&self, path: &str) -> Result<Option<Page>, StoreError> {
        let pages = self.pages.read().await;
        Ok(pages
            .values()
            .find(|p| p.canonical_path().as_deref() == Some(path))
            .cloned())
    }

    async fn save(&self, page: &mut Page) -> Result<DbId, StoreError> {
        let Some(path) = page.canonical_path() else {
            return Err(StoreError::InvalidPage(
                "a page must have at least one revision before it is saved".into(),
            ));
        };

        let mut pages = self.pages.write().await;

        let taken = pages.iter().any(|(id, other)| {
            Some(*id) != page.id() && other.canonical_path().as_deref() == Some(path.as_str())
        });
        if taken {
            return Err(StoreError::Conflict(format!(
                "A page with path '{path}' already exists"
            )));
        }

        let id = match page.id() {
            Some(id) => id,
            None => {
                let id = self.next_id.fetch_add(1, AtomicOrdering::Relaxed);
                page.set_id(id);
                id
            }
        };
        pages.insert(id, page.clone());
        Ok(id)
    }
}

fn title_key(page: &Page) -> String {
    page.title().unwrap_or_default().to_lowercase()
}

/// Listing order for the in-memory store; ties fall back to ascending id.
fn compare(sort: PageSort, (score_a, a): &(f64, &Page), (score_b, b): &(f64, &Page)) -> Ordering {
    let primary = match sort {
        PageSort::CreatedAsc => a.created().cmp(&b.created()),
        PageSort::CreatedDesc => b.created().cmp(&a.created()),
        PageSort::UpdatedAsc => a.updated().cmp(&b.updated()),
        PageSort::UpdatedDesc => b.updated().cmp(&a.updated()),
        PageSort::TitleAsc => title_key(a).cmp(&title_key(b)),
        PageSort::TitleDesc => title_key(b).cmp(&title_key(a)),
        PageSort::Relevance => score_b.partial_cmp(score_a).unwrap_or(Ordering::Equal),
    };
    primary.then_with(|| a.id().cmp(&b.id()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
