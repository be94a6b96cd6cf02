//! HTTP request handlers for the bookmarking API
//!
//! This module implements the request-facing logic for:
//! - Creating, reading and updating Rolodex entries
//! - Searching the personal collection and the public Yellow Pages
//! - The moderation actions (submit / approve / reject / delete /
//!   restore / purge), which delegate to [`crate::workflow`]
//!
//! Handlers return `Result<_, ApiError>`; the error type carries the
//! HTTP mapping, so every failure path is a single `?` or `return Err`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::database::{encode_entry, load_entry, next_entry_id, AppState, TABLE_ENTRIES};
use crate::error::ApiError;
use crate::model::{CreateEntryRequest, Entry, EntryStatus, Identity, SearchParams, UpdateEntryRequest};
use crate::search::{self, SearchPage, SearchQuery, SearchScope};
use crate::tags::normalize_tags;
use crate::workflow;
use redb::ReadableDatabase;

/// Creates a new private entry owned by the caller
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com",
///   "title": "Example",
///   "notes": "optional",
///   "tags": ["Rust", "web"]
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - the stored entry, tags normalized, status `private`
/// - **422 Unprocessable Entity** - empty `url` or `title`
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (url, title, notes) = validate_fields(payload.url, payload.title, payload.notes)?;

    let now = Utc::now();
    let write_txn = state.db.begin_write()?;
    let entry = {
        let mut table = write_txn.open_table(TABLE_ENTRIES)?;
        let entry = Entry {
            id: next_entry_id(&write_txn)?,
            owner_id: identity.user_id.clone(),
            url,
            title,
            notes,
            tags: normalize_tags(payload.tags),
            status: EntryStatus::Private,
            is_public_copy: false,
            original_id: None,
            created_at: now,
            updated_at: now,
        };
        table.insert(entry.id, encode_entry(&entry)?.as_str())?;
        entry
    };
    write_txn.commit()?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Fetches a single entry by id (owner or admin)
pub async fn get_entry(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Entry>, ApiError> {
    let read_txn = state.db.begin_read()?;
    let table = read_txn.open_table(TABLE_ENTRIES)?;
    let entry = load_entry(&table, id)?.ok_or(ApiError::NotFound(id))?;

    if entry.owner_id != identity.user_id && !identity.is_admin {
        return Err(ApiError::NotOwner);
    }
    Ok(Json(entry))
}

/// Updates an entry's url, title, notes and tags
///
/// Owners may edit their own entries while `private` or `rejected`; a
/// `submitted` entry is locked until moderation resolves it. Admins may
/// additionally edit public copies (directory curation). Deleted entries
/// must be restored first.
///
/// # Response
///
/// - **200 OK** - the updated entry
/// - **409 Conflict** - entry is `submitted` or `deleted`
pub async fn update_entry(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<Entry>, ApiError> {
    let (url, title, notes) = validate_fields(payload.url, payload.title, payload.notes)?;

    let write_txn = state.db.begin_write()?;
    let entry = {
        let mut table = write_txn.open_table(TABLE_ENTRIES)?;
        let mut entry = load_entry(&table, id)?.ok_or(ApiError::NotFound(id))?;

        if identity.is_admin {
            if entry.status == EntryStatus::Deleted {
                return Err(ApiError::InvalidTransition {
                    action: "edit",
                    from: entry.status,
                });
            }
        } else {
            if entry.owner_id != identity.user_id || entry.is_public_copy {
                return Err(ApiError::NotOwner);
            }
            // Submitted entries are frozen so moderation never races an edit
            if !matches!(entry.status, EntryStatus::Private | EntryStatus::Rejected) {
                return Err(ApiError::InvalidTransition {
                    action: "edit",
                    from: entry.status,
                });
            }
        }

        entry.url = url;
        entry.title = title;
        entry.notes = notes;
        entry.tags = normalize_tags(payload.tags);
        entry.updated_at = Utc::now();
        table.insert(entry.id, encode_entry(&entry)?.as_str())?;
        entry
    };
    write_txn.commit()?;

    Ok(Json(entry))
}

/// Lists the caller's Rolodex with keyword/tag filtering and pagination
///
/// # Example Request
///
/// `GET /api/entries?q=example&tags=rust,web&page=2&limit=20`
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let query = SearchQuery::from_params(&params)?;
    let scope = SearchScope::Personal {
        owner_id: identity.user_id,
    };
    let page = search::search_entries(&state.db, &scope, &query)?;
    Ok(page_json(page))
}

/// Browses the public Yellow Pages directory (no authentication)
///
/// Only approved forked copies are visible here; private entries never
/// leak into this view regardless of filters.
pub async fn yellowpages(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let query = SearchQuery::from_params(&params)?;
    let page = search::search_entries(&state.db, &SearchScope::Public, &query)?;
    Ok(page_json(page))
}

/// Lists submissions awaiting review (admin only)
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    if !identity.is_admin {
        return Err(ApiError::Forbidden);
    }
    let query = SearchQuery::from_params(&params)?;
    let page = search::list_pending(&state.db, &query)?;
    Ok(page_json(page))
}

/// Submits an entry to the review queue
pub async fn submit_entry(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Entry>, ApiError> {
    let entry = workflow::submit(&state.db, id, &identity)?;
    Ok(Json(entry))
}

/// Approves a submission, forking it into the directory
///
/// # Response
///
/// - **201 Created** - the new public copy (note the fresh `id` and the
///   `original_id` back-reference)
pub async fn approve_entry(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, ApiError> {
    let copy = workflow::approve(&state.db, id, &identity)?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Rejects a submission
pub async fn reject_entry(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Entry>, ApiError> {
    let entry = workflow::reject(&state.db, id, &identity)?;
    Ok(Json(entry))
}

/// Soft-deletes an entry
pub async fn delete_entry(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, ApiError> {
    let entry = workflow::soft_delete(&state.db, id, &identity)?;
    Ok(Json(json!({
        "message": "Entry deleted",
        "deleted_id": entry.id,
    })))
}

/// Restores a soft-deleted entry
pub async fn restore_entry(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Entry>, ApiError> {
    let entry = workflow::restore(&state.db, id, &identity)?;
    Ok(Json(entry))
}

/// Hard-deletes every soft-deleted entry (admin only)
pub async fn purge_deleted(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Value>, ApiError> {
    let purged = workflow::purge(&state.db, &identity)?;
    Ok(Json(json!({
        "message": "Purge complete",
        "purged": purged,
    })))
}

/// Trims and checks the writable entry fields shared by create and update
fn validate_fields(
    url: String,
    title: String,
    notes: Option<String>,
) -> Result<(String, String, Option<String>), ApiError> {
    let url = url.trim().to_string();
    if url.is_empty() {
        return Err(ApiError::Validation("url must not be empty".to_string()));
    }
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("title must not be empty".to_string()));
    }
    let notes = notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Ok((url, title, notes))
}

/// Paginated listing envelope shared by all search endpoints
fn page_json(page: SearchPage) -> Json<Value> {
    let total_pages = page.total_pages();
    Json(json!({
        "page": page.page,
        "limit": page.limit,
        "total": page.total,
        "total_pages": total_pages,
        "data": page.entries,
    }))
}
