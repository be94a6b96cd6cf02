//! Route definitions for the bookmarking API
//!
//! This module assembles the Axum router: the public Yellow Pages endpoint,
//! the authenticated `/api` surface, and the admin moderation actions.

use axum::routing::{get, post};
use axum::Router;

use axum::middleware;

use crate::database::AppState;
use crate::handler::{
    approve_entry, create_entry, delete_entry, get_entry, list_entries, list_pending,
    purge_deleted, reject_entry, restore_entry, submit_entry, update_entry, yellowpages,
};
use crate::middleware::identity_middleware;

/// Creates and configures the application router
///
/// # Route Definitions
///
/// - `GET /yellowpages` - public directory search (no authentication)
/// - `GET /api/entries` - caller's Rolodex with search/pagination
/// - `POST /api/entries` - create a private entry
/// - `GET /api/entries/{id}` - fetch one entry (owner or admin)
/// - `PUT /api/entries/{id}` - edit an entry
/// - `DELETE /api/entries/{id}` - soft-delete
/// - `POST /api/entries/{id}/submit` - submit for public review
/// - `POST /api/entries/{id}/restore` - restore a soft-deleted entry
/// - `GET /api/admin/pending` - review queue (admin)
/// - `POST /api/admin/approve/{id}` - approve + fork into directory (admin)
/// - `POST /api/admin/reject/{id}` - reject a submission (admin)
/// - `POST /api/admin/purge` - hard-delete all soft-deleted rows (admin)
///
/// Everything under `/api` passes through the identity middleware; the
/// admin routes additionally check the capability inside their handlers.
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route(
            "/entries/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/entries/{id}/submit", post(submit_entry))
        .route("/entries/{id}/restore", post(restore_entry))
        .route("/admin/pending", get(list_pending))
        .route("/admin/approve/{id}", post(approve_entry))
        .route("/admin/reject/{id}", post(reject_entry))
        .route("/admin/purge", post(purge_deleted))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new()
        // Public directory - browsable without any identity
        .route("/yellowpages", get(yellowpages))
        // Mount authenticated routes under /api
        .nest("/api", api_routes)
        // Inject the application state into all handlers
        .with_state(state)
}
