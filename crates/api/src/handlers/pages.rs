//! Handlers for wiki pages: listing, CRUD, revision history, diff, rollback,
//! and trash.
//!
//! Every read is gated on the read level of the revision it returns; every
//! write on the write level of the current revision. Trashed pages are
//! invisible (404) to everyone but admins.

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use quire_core::diff::{diff_revisions, RevisionDiff};
use quire_core::error::CoreError;
use quire_core::page::{parse_revision_number, Page};
use quire_core::permissions::{PermissionRule, Requester};
use quire_core::query::{list_pages as run_listing, PageListParams};
use quire_core::revision::{AttachmentView, EditorRef, Revision, RevisionInput};
use quire_core::types::{DbId, Timestamp};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, Identity};
use crate::middleware::rbac::RequireAdmin;
use crate::response::{listing_headers, DataResponse};
use crate::state::AppState;

/* --------------------------------------------------------------------------
Response types
-------------------------------------------------------------------------- */

/// One row of a page listing.
#[derive(Debug, Serialize)]
pub struct PageSummary {
    pub id: DbId,
    pub path: String,
    pub title: String,
    pub revision_count: usize,
    pub created: Timestamp,
    pub updated: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trashed: Option<Timestamp>,
}

/// A single revision, numbered chronologically from 1.
#[derive(Debug, Serialize)]
pub struct RevisionView {
    pub number: usize,
    pub title: String,
    pub path: String,
    pub body: String,
    pub permissions: PermissionRule,
    pub file: Option<AttachmentView>,
    pub thumbnail: Option<AttachmentView>,
    pub editor: Option<EditorRef>,
    pub msg: String,
    pub timestamp: Timestamp,
}

impl RevisionView {
    fn new(number: usize, revision: &Revision) -> Self {
        let content = revision.content();
        Self {
            number,
            title: content.title.clone(),
            path: content.canonical_path(),
            body: content.body.clone(),
            permissions: *revision.permissions(),
            file: revision.file().map(|a| a.view()),
            thumbnail: revision.thumbnail().map(|a| a.view()),
            editor: revision.editor().cloned(),
            msg: revision.msg().to_string(),
            timestamp: revision.timestamp(),
        }
    }
}

/// A page with its current revision.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub id: DbId,
    pub revision_count: usize,
    pub created: Timestamp,
    pub updated: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trashed: Option<Timestamp>,
    pub current: RevisionView,
}

/// Entry of a page's revision history (no body).
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub number: usize,
    pub title: String,
    pub editor: Option<EditorRef>,
    pub msg: String,
    pub timestamp: Timestamp,
}

/// Structured comparison between two numbered revisions.
#[derive(Debug, Serialize)]
pub struct DiffView {
    pub from: i64,
    pub to: i64,
    pub unchanged: bool,
    pub diff: RevisionDiff,
}

#[derive(Debug, Serialize)]
pub struct TrashCount {
    pub count: i64,
}

/* --------------------------------------------------------------------------
Query param types
-------------------------------------------------------------------------- */

/// `?from=&to=` for diffs. `to` defaults to the current revision, `from` to
/// the one before `to`.
#[derive(Debug, Deserialize)]
pub struct DiffParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

fn page_id(page: &Page) -> AppResult<DbId> {
    page.id()
        .ok_or_else(|| AppError::InternalError("stored page without an id".into()))
}

fn current(page: &Page) -> AppResult<&Revision> {
    page.current()
        .ok_or_else(|| AppError::InternalError("stored page without revisions".into()))
}

fn summary(page: &Page) -> AppResult<PageSummary> {
    let current = current(page)?;
    Ok(PageSummary {
        id: page_id(page)?,
        path: current.content().canonical_path(),
        title: current.content().title.clone(),
        revision_count: page.revision_count(),
        created: page.created(),
        updated: page.updated(),
        trashed: page.trashed(),
    })
}

fn page_view(page: &Page) -> AppResult<PageView> {
    Ok(PageView {
        id: page_id(page)?,
        revision_count: page.revision_count(),
        created: page.created(),
        updated: page.updated(),
        trashed: page.trashed(),
        current: RevisionView::new(page.revision_count(), current(page)?),
    })
}

fn ensure_can_read(requester: &Requester, revision: &Revision) -> AppResult<()> {
    if requester.can_read(revision) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(format!(
            "Reading this revision requires '{}' access",
            revision.permissions().read
        ))))
    }
}

fn ensure_can_write(requester: &Requester, page: &Page) -> AppResult<()> {
    let current = current(page)?;
    if requester.can_write(current) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(format!(
            "Editing this page requires '{}' access",
            current.permissions().write
        ))))
    }
}

/// Load a page by id or return 404. Trashed pages are hidden from non-admins.
async fn ensure_page(state: &AppState, id: DbId, requester: &Requester) -> AppResult<Page> {
    let not_found = || AppError::Core(CoreError::NotFound { entity: "Page", id });
    let page = state.store.load_by_id(id).await?.ok_or_else(not_found)?;
    if page.is_trashed() && !requester.is_admin() {
        return Err(not_found());
    }
    Ok(page)
}

/// Load a live page the requester may edit.
async fn ensure_writable_page(
    state: &AppState,
    id: DbId,
    requester: &Requester,
) -> AppResult<Page> {
    let page = ensure_page(state, id, requester).await?;
    if page.is_trashed() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Page {id} is in the trash; restore it before editing"
        ))));
    }
    ensure_can_write(requester, &page)?;
    Ok(page)
}

/* --------------------------------------------------------------------------
Listing
-------------------------------------------------------------------------- */

/// GET /pages
///
/// Filtered, sorted, paginated listing. Navigation links are returned in
/// the `Link` header and the unwindowed total in `X-Total-Count`.
pub async fn list_pages(
    Identity(requester): Identity,
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageListParams>,
) -> AppResult<impl IntoResponse> {
    let listing = run_listing(
        state.store.as_ref(),
        &requester,
        &params,
        uri.path(),
        uri.query(),
    )
    .await?;

    let pages = listing
        .pages
        .iter()
        .map(summary)
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(
        user_id = ?requester.id(),
        total = listing.total,
        start = listing.window.start,
        end = listing.window.end,
        "Pages listed"
    );

    Ok((
        listing_headers(&listing.links, listing.total),
        Json(DataResponse { data: pages }),
    ))
}

/// GET /pages/trash/count
pub async fn count_trash(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let count = state.store.count_trashed().await?;
    Ok(Json(DataResponse {
        data: TrashCount { count },
    }))
}

/* --------------------------------------------------------------------------
Page CRUD
-------------------------------------------------------------------------- */

/// POST /pages
///
/// Create a page with its first revision. The path defaults to the slug of
/// the title; a path already in use is a conflict.
pub async fn create_page(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RevisionInput>,
) -> AppResult<impl IntoResponse> {
    let requester = auth.requester();
    let revision = input.into_revision(requester.editor_ref())?;
    revision.permissions().ensure_grantable_by(&requester)?;

    let mut page = Page::with_initial(revision);
    let id = state.store.save(&mut page).await?;

    tracing::info!(
        user_id = auth.user_id,
        page_id = id,
        path = ?page.canonical_path(),
        "Page created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: page_view(&page)? })))
}

/// GET /pages/{id}
pub async fn get_page(
    Identity(requester): Identity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let page = ensure_page(&state, id, &requester).await?;
    ensure_can_read(&requester, current(&page)?)?;
    Ok(Json(DataResponse { data: page_view(&page)? }))
}

/// GET /pages/by-path/{*path}
pub async fn get_page_by_path(
    Identity(requester): Identity,
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<impl IntoResponse> {
    let not_found = || {
        AppError::Core(CoreError::NotFoundAtPath {
            entity: "Page",
            path: path.clone(),
        })
    };
    let page = state
        .store
        .load_by_path(&path)
        .await?
        .ok_or_else(not_found)?;
    if page.is_trashed() && !requester.is_admin() {
        return Err(not_found());
    }

    ensure_can_read(&requester, current(&page)?)?;
    Ok(Json(DataResponse { data: page_view(&page)? }))
}

/// PUT /pages/{id}
///
/// Append a new revision. The requester needs write access to the current
/// revision and may not require levels above their own.
pub async fn update_page(
    Identity(requester): Identity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RevisionInput>,
) -> AppResult<impl IntoResponse> {
    let mut page = ensure_writable_page(&state, id, &requester).await?;

    let revision = input.into_revision(requester.editor_ref())?;
    revision.permissions().ensure_grantable_by(&requester)?;

    page.add_revision(revision);
    state.store.save(&mut page).await?;

    tracing::info!(
        user_id = ?requester.id(),
        page_id = id,
        revision = page.revision_count(),
        "Page revised"
    );

    Ok(Json(DataResponse { data: page_view(&page)? }))
}

/// DELETE /pages/{id}
///
/// Move a page to the trash. History is kept; trashing twice is a no-op.
pub async fn trash_page(
    Identity(requester): Identity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut page = ensure_page(&state, id, &requester).await?;
    ensure_can_write(&requester, &page)?;

    if page.trash() {
        state.store.save(&mut page).await?;
        tracing::info!(user_id = ?requester.id(), page_id = id, "Page trashed");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /pages/{id}/restore
pub async fn restore_page(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let mut page = ensure_page(&state, id, &admin.requester()).await?;

    if page.restore() {
        state.store.save(&mut page).await?;
        tracing::info!(user_id = admin.user_id, page_id = id, "Page restored");
    }

    Ok(Json(DataResponse { data: page_view(&page)? }))
}

/* --------------------------------------------------------------------------
Revision history
-------------------------------------------------------------------------- */

/// GET /pages/{id}/revisions
///
/// History oldest first. Revisions the requester may not read are omitted.
pub async fn list_revisions(
    Identity(requester): Identity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let page = ensure_page(&state, id, &requester).await?;
    ensure_can_read(&requester, current(&page)?)?;

    let history: Vec<HistoryEntry> = page
        .history()
        .filter(|(_, revision)| requester.can_read(revision))
        .map(|(number, revision)| HistoryEntry {
            number,
            title: revision.content().title.clone(),
            editor: revision.editor().cloned(),
            msg: revision.msg().to_string(),
            timestamp: revision.timestamp(),
        })
        .collect();

    Ok(Json(DataResponse { data: history }))
}

/// GET /pages/{id}/revisions/{n}
pub async fn get_revision(
    Identity(requester): Identity,
    State(state): State<AppState>,
    Path((id, raw_number)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let page = ensure_page(&state, id, &requester).await?;
    let number = parse_revision_number(&raw_number, page.revision_count())?;
    let revision = page
        .revision_by_number(number)
        .ok_or_else(|| AppError::InternalError(format!("revision {number} vanished")))?;
    ensure_can_read(&requester, revision)?;

    Ok(Json(DataResponse {
        data: RevisionView::new(number as usize, revision),
    }))
}

/// GET /pages/{id}/diff?from=N&to=M
pub async fn diff_page_revisions(
    Identity(requester): Identity,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<DiffParams>,
) -> AppResult<impl IntoResponse> {
    let page = ensure_page(&state, id, &requester).await?;
    let len = page.revision_count();

    let to = match params.to.as_deref() {
        Some(raw) => parse_revision_number(raw, len)?,
        None => len as i64,
    };
    let from = match params.from.as_deref() {
        Some(raw) => parse_revision_number(raw, len)?,
        None => (to - 1).max(1),
    };

    let (Some(before), Some(after)) =
        (page.revision_by_number(from), page.revision_by_number(to))
    else {
        return Err(AppError::Core(CoreError::Validation(
            "Page has no revisions to compare".into(),
        )));
    };
    ensure_can_read(&requester, before)?;
    ensure_can_read(&requester, after)?;

    let diff = diff_revisions(before, after);
    Ok(Json(DataResponse {
        data: DiffView {
            from,
            to,
            unchanged: diff.is_unchanged(),
            diff,
        },
    }))
}

/// POST /pages/{id}/rollback/{n}
///
/// Append a copy of revision `n` as the new current revision.
pub async fn rollback_page(
    Identity(requester): Identity,
    State(state): State<AppState>,
    Path((id, raw_number)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let mut page = ensure_writable_page(&state, id, &requester).await?;
    let number = parse_revision_number(&raw_number, page.revision_count())?;

    if let Some(target) = page.revision_by_number(number) {
        ensure_can_read(&requester, target)?;
        target.permissions().ensure_grantable_by(&requester)?;
    }

    if !page.rollback(number, requester.editor_ref()) {
        return Err(AppError::InternalError(format!(
            "rollback to revision {number} failed"
        )));
    }
    state.store.save(&mut page).await?;

    tracing::info!(
        user_id = ?requester.id(),
        page_id = id,
        revision = number,
        "Page rolled back"
    );

    Ok(Json(DataResponse { data: page_view(&page)? }))
}
