//! Route definitions for the `/pages` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::pages;
use crate::state::AppState;

/// Routes mounted at `/pages`.
///
/// ```text
/// GET    /                      -> list_pages
/// POST   /                      -> create_page
/// GET    /trash/count           -> count_trash
/// GET    /by-path/{*path}       -> get_page_by_path
/// GET    /{id}                  -> get_page
/// PUT    /{id}                  -> update_page
/// DELETE /{id}                  -> trash_page
/// POST   /{id}/restore          -> restore_page
/// GET    /{id}/revisions        -> list_revisions
/// GET    /{id}/revisions/{n}    -> get_revision
/// GET    /{id}/diff             -> diff_page_revisions
/// POST   /{id}/rollback/{n}     -> rollback_page
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::list_pages).post(pages::create_page))
        .route("/trash/count", get(pages::count_trash))
        .route("/by-path/{*path}", get(pages::get_page_by_path))
        .route(
            "/{id}",
            get(pages::get_page)
                .put(pages::update_page)
                .delete(pages::trash_page),
        )
        .route("/{id}/restore", post(pages::restore_page))
        .route("/{id}/revisions", get(pages::list_revisions))
        .route("/{id}/revisions/{n}", get(pages::get_revision))
        .route("/{id}/diff", get(pages::diff_page_revisions))
        .route("/{id}/rollback/{n}", post(pages::rollback_page))
}
