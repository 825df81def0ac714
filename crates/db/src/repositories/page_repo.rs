//! Repository for the `pages` table and the Postgres [`PageStore`].

use async_trait::async_trait;
use quire_core::page::Page;
use quire_core::permissions::PermissionLevel;
use quire_core::query::{PageQuery, PageSort};
use quire_core::search::{WEIGHT_BODY, WEIGHT_TITLE};
use quire_core::store::{PageSet, PageStore, StoreError};
use quire_core::types::DbId;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{PgPool, Postgres};

use crate::models::page::{PageRecord, PageRow};

/// Column list for page reads.
const COLUMNS: &str = "id, document";

/// Listing filters. `$1..$9` are bound by [`bind_filters`].
const FILTERS: &str = "($1::BOOL = (trashed_at IS NOT NULL))
   AND ($2::SMALLINT IS NULL OR read_level <= $2)
   AND ($3::TIMESTAMPTZ IS NULL OR created_at < $3)
   AND ($4::TIMESTAMPTZ IS NULL OR created_at > $4)
   AND ($5::TIMESTAMPTZ IS NULL OR updated_at < $5)
   AND ($6::TIMESTAMPTZ IS NULL OR updated_at > $6)
   AND ($7::BIGINT IS NULL OR revision_count >= $7)
   AND ($8::BIGINT IS NULL OR revision_count <= $8)
   AND ($9::TEXT IS NULL OR search_vector @@ plainto_tsquery('english', $9))";

/// Weighted tsvector expression over the given title and body SQL operands.
fn search_vector_sql(title: &str, body: &str) -> String {
    format!(
        "setweight(to_tsvector('english', {title}), '{WEIGHT_TITLE}') || \
         setweight(to_tsvector('english', {body}), '{WEIGHT_BODY}')"
    )
}

/// `ORDER BY` clause for a listing; ties fall back to ascending id.
pub fn order_clause(sort: PageSort) -> &'static str {
    match sort {
        PageSort::CreatedAsc => "created_at ASC, id ASC",
        PageSort::CreatedDesc => "created_at DESC, id ASC",
        PageSort::UpdatedAsc => "updated_at ASC, id ASC",
        PageSort::UpdatedDesc => "updated_at DESC, id ASC",
        PageSort::TitleAsc => "lower(title) ASC, id ASC",
        PageSort::TitleDesc => "lower(title) DESC, id ASC",
        PageSort::Relevance => {
            "ts_rank(search_vector, plainto_tsquery('english', $9)) DESC, id ASC"
        }
    }
}

fn bind_filters<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    query: &'q PageQuery,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    q.bind(query.trashed)
        .bind(query.max_read_level.map(PermissionLevel::rank))
        .bind(query.created_before)
        .bind(query.created_after)
        .bind(query.updated_before)
        .bind(query.updated_after)
        .bind(query.revisions_min)
        .bind(query.revisions_max)
        .bind(query.text.as_deref())
}

/// Provides persistence operations for pages.
pub struct PageRepo;

impl PageRepo {
    /// Insert a new page, returning its id.
    pub async fn insert(pool: &PgPool, record: &PageRecord<'_>) -> Result<DbId, sqlx::Error> {
        let query = format!(
            "INSERT INTO pages
                (path, title, body, read_level, revision_count, document,
                 search_vector, created_at, updated_at, trashed_at)
             VALUES ($1, $2, $3, $4, $5, $6, {}, $7, $8, $9)
             RETURNING id",
            search_vector_sql("$2", "$3")
        );
        let (id,): (DbId,) = sqlx::query_as(&query)
            .bind(&record.path)
            .bind(record.title)
            .bind(record.body)
            .bind(record.read_level)
            .bind(record.revision_count)
            .bind(&record.document)
            .bind(record.created_at)
            .bind(record.updated_at)
            .bind(record.trashed_at)
            .fetch_one(pool)
            .await?;
        Ok(id)
    }

    /// Replace an existing page. Returns `false` if no row has `id`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        record: &PageRecord<'_>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!(
            "UPDATE pages SET
                path = $2,
                title = $3,
                body = $4,
                read_level = $5,
                revision_count = $6,
                document = $7,
                search_vector = {},
                updated_at = $8,
                trashed_at = $9
             WHERE id = $1",
            search_vector_sql("$3", "$4")
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(&record.path)
            .bind(record.title)
            .bind(record.body)
            .bind(record.read_level)
            .bind(record.revision_count)
            .bind(&record.document)
            .bind(record.updated_at)
            .bind(record.trashed_at)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a page by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PageRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, PageRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a page by the canonical path of its current revision.
    pub async fn find_by_path(pool: &PgPool, path: &str) -> Result<Option<PageRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pages WHERE path = $1");
        sqlx::query_as::<_, PageRow>(&query)
            .bind(path)
            .fetch_optional(pool)
            .await
    }

    /// One window of pages matching `query`, in the query's order.
    pub async fn list(pool: &PgPool, query: &PageQuery) -> Result<Vec<PageRow>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM pages
             WHERE {FILTERS}
             ORDER BY {}
             LIMIT $10 OFFSET $11",
            order_clause(query.sort)
        );
        bind_filters(sqlx::query_as::<_, PageRow>(&sql), query)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(pool)
            .await
    }

    /// Number of pages matching `query`, ignoring its window.
    pub async fn count(pool: &PgPool, query: &PageQuery) -> Result<i64, sqlx::Error> {
        let sql = format!("SELECT COUNT(*) FROM pages WHERE {FILTERS}");
        let (count,): (i64,) = bind_filters(sqlx::query_as(&sql), query)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Number of trashed pages.
    pub async fn count_trashed(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM pages WHERE trashed_at IS NOT NULL")
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// PageStore implementation
// ---------------------------------------------------------------------------

/// [`PageStore`] backed by the `pages` table.
#[derive(Debug, Clone)]
pub struct PgPageStore {
    pool: PgPool,
}

impl PgPageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a sqlx error to the storage error surface.
///
/// Unique violations on `uq_` constraints become conflicts; everything else
/// is an opaque backend failure.
fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint == "uq_pages_path" {
                return StoreError::Conflict("A page with this path already exists".into());
            }
            if constraint.starts_with("uq_") {
                return StoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ));
            }
        }
    }
    StoreError::backend(err)
}

#[async_trait]
impl PageStore for PgPageStore {
    async fn find(&self, query: &PageQuery) -> Result<PageSet, StoreError> {
        let total = PageRepo::count(&self.pool, query)
            .await
            .map_err(store_error)?;
        let rows = PageRepo::list(&self.pool, query)
            .await
            .map_err(store_error)?;
        Ok(PageSet {
            pages: rows.into_iter().map(PageRow::into_page).collect(),
            total,
        })
    }

    async fn count_trashed(&self) -> Result<i64, StoreError> {
        PageRepo::count_trashed(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn load_by_id(&self, id: DbId) -> Result<Option<Page>, StoreError> {
        let row = PageRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(PageRow::into_page))
    }

    async fn load_by_path(&self, path: &str) -> Result<Option<Page>, StoreError> {
        let row = PageRepo::find_by_path(&self.pool, path)
            .await
            .map_err(store_error)?;
        Ok(row.map(PageRow::into_page))
    }

    async fn save(&self, page: &mut Page) -> Result<DbId, StoreError> {
        let record = PageRecord::from_page(page).ok_or_else(|| {
            StoreError::InvalidPage(
                "a page must have at least one revision before it is saved".into(),
            )
        })?;

        match page.id() {
            Some(id) => {
                let found = PageRepo::update(&self.pool, id, &record)
                    .await
                    .map_err(store_error)?;
                if !found {
                    return Err(StoreError::InvalidPage(format!(
                        "page {id} does not exist"
                    )));
                }
                tracing::debug!(page_id = id, revisions = record.revision_count, "Page updated");
                Ok(id)
            }
            None => {
                let id = PageRepo::insert(&self.pool, &record)
                    .await
                    .map_err(store_error)?;
                tracing::debug!(page_id = id, "Page inserted");
                page.set_id(id);
                Ok(id)
            }
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await.map_err(store_error)
    }
}
