pub mod health;
pub mod pages;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /pages                                    list, create
/// /pages/trash/count                        trashed page count (admin)
/// /pages/by-path/{*path}                    lookup by canonical path
/// /pages/{id}                               get, revise, trash
/// /pages/{id}/restore                       restore from trash (admin)
/// /pages/{id}/revisions                     history
/// /pages/{id}/revisions/{n}                 one revision
/// /pages/{id}/diff                          compare two revisions
/// /pages/{id}/rollback/{n}                  roll back to revision n
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/pages", pages::router())
}
