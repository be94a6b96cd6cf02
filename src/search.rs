//! Search and filter engine for entry listings
//!
//! One engine backs the personal Rolodex view, the public Yellow Pages
//! directory, and the admin pending queue. The contract: an optional
//! case-insensitive keyword matched as a substring of title, notes or url;
//! an optional tag filter with AND semantics (the entry's tag set must
//! contain every requested tag); deterministic newest-first ordering; and
//! 1-based offset pagination that returns an empty page, not an error,
//! past the end of the result set.
//!
//! All of this is read-only: one read transaction, no side effects.

use std::collections::BTreeSet;

use redb::{ReadableDatabase, ReadableTable};

use crate::database::{decode_entry, TABLE_ENTRIES};
use crate::error::ApiError;
use crate::model::{Entry, EntryStatus, SearchParams};
use crate::tags::parse_tag_filter;

/// Default page size when the caller does not send `limit`
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Hard cap on page size; larger requests are clamped, not rejected
pub const MAX_PAGE_SIZE: usize = 100;

/// Which candidate set a search runs over
pub enum SearchScope {
    /// All non-deleted entries owned by the caller
    Personal { owner_id: String },
    /// The public directory: approved forked copies only
    Public,
}

/// A validated, normalized search request
pub struct SearchQuery {
    /// Lowercased keyword, if any
    keyword: Option<String>,
    /// Normalized requested tags; empty set = no tag filtering
    tags: BTreeSet<String>,
    /// 1-based page number
    pub page: usize,
    /// Items per page, already clamped to [`MAX_PAGE_SIZE`]
    pub limit: usize,
}

impl SearchQuery {
    /// Validates raw query parameters
    ///
    /// Explicit `page` or `limit` values below 1 are an `InvalidQuery`
    /// error; absent values fall back to defaults.
    pub fn from_params(params: &SearchParams) -> Result<Self, ApiError> {
        let page = params.page.unwrap_or(1);
        if page < 1 {
            return Err(ApiError::InvalidQuery(format!(
                "page must be >= 1, got {page}"
            )));
        }

        let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE as i64);
        if limit < 1 {
            return Err(ApiError::InvalidQuery(format!(
                "limit must be >= 1, got {limit}"
            )));
        }

        let keyword = params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let tags = params
            .tags
            .as_deref()
            .map(parse_tag_filter)
            .unwrap_or_default();

        Ok(SearchQuery {
            keyword,
            tags,
            page: page as usize,
            limit: (limit as usize).min(MAX_PAGE_SIZE),
        })
    }
}

/// One page of results plus the total match count
pub struct SearchPage {
    pub entries: Vec<Entry>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

impl SearchPage {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.limit)
    }
}

/// Runs a search over the requested scope
pub fn search_entries(
    db: &redb::Database,
    scope: &SearchScope,
    query: &SearchQuery,
) -> Result<SearchPage, ApiError> {
    let entries = load_all(db)?;
    let matches = entries
        .into_iter()
        .filter(|entry| in_scope(entry, scope) && matches_filters(entry, query))
        .collect();
    Ok(paginate(matches, query))
}

/// Lists the admin review queue: user submissions awaiting a decision
///
/// Approval forks a copy without touching the source, so a submission
/// counts as resolved once a copy references it; those drop out of the
/// queue even though their status is still `submitted`.
pub fn list_pending(db: &redb::Database, query: &SearchQuery) -> Result<SearchPage, ApiError> {
    let entries = load_all(db)?;

    let forked: BTreeSet<u64> = entries
        .iter()
        .filter(|entry| entry.is_public_copy)
        .filter_map(|entry| entry.original_id)
        .collect();

    let matches = entries
        .into_iter()
        .filter(|entry| {
            !entry.is_public_copy
                && entry.status == EntryStatus::Submitted
                && !forked.contains(&entry.id)
                && matches_filters(entry, query)
        })
        .collect();
    Ok(paginate(matches, query))
}

fn in_scope(entry: &Entry, scope: &SearchScope) -> bool {
    match scope {
        SearchScope::Personal { owner_id } => {
            entry.owner_id == *owner_id && entry.status != EntryStatus::Deleted
        }
        SearchScope::Public => entry.is_public_copy && entry.status == EntryStatus::Approved,
    }
}

fn matches_filters(entry: &Entry, query: &SearchQuery) -> bool {
    if let Some(keyword) = &query.keyword {
        let hit = entry.title.to_lowercase().contains(keyword)
            || entry.url.to_lowercase().contains(keyword)
            || entry
                .notes
                .as_deref()
                .is_some_and(|notes| notes.to_lowercase().contains(keyword));
        if !hit {
            return false;
        }
    }

    query.tags.iter().all(|tag| entry.tags.contains(tag))
}

/// Reads every entry row in one read transaction
fn load_all(db: &redb::Database) -> Result<Vec<Entry>, ApiError> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(TABLE_ENTRIES)?;

    let mut entries = Vec::new();
    for item in table.iter()? {
        let (_, value) = item?;
        entries.push(decode_entry(value.value())?);
    }
    Ok(entries)
}

/// Orders matches newest-first (`created_at` desc, ties broken by `id`
/// desc) and slices out the requested page. A page past the end of the
/// result set comes back empty, with the true total still attached.
fn paginate(mut matches: Vec<Entry>, query: &SearchQuery) -> SearchPage {
    matches.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    let total = matches.len();
    // Saturate so an absurdly large page number degrades into an empty
    // page instead of an arithmetic overflow
    let offset = (query.page - 1).saturating_mul(query.limit);
    let entries: Vec<Entry> = matches.into_iter().skip(offset).take(query.limit).collect();

    SearchPage {
        entries,
        total,
        page: query.page,
        limit: query.limit,
    }
}
