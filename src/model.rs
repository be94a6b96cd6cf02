//! Data models for the bookmarking service
//!
//! This module defines the persisted entry record, the moderation status
//! enum, the caller identity attached by the middleware, and the
//! request/query payloads accepted by the API.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Moderation status of an entry.
///
/// Lifecycle for a user-owned entry: `private` → `submitted` →
/// `approved` (via an admin fork) or `rejected`. `deleted` marks a
/// soft-deleted row awaiting restore or purge. Public copies are created
/// directly in `approved`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Private,
    Submitted,
    Approved,
    Rejected,
    Deleted,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Private => "private",
            EntryStatus::Submitted => "submitted",
            EntryStatus::Approved => "approved",
            EntryStatus::Rejected => "rejected",
            EntryStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookmark entry stored in the database
///
/// Entries live in one table regardless of whether they belong to a user's
/// private Rolodex or to the public Yellow Pages directory. Directory rows
/// are distinguished by `is_public_copy`: approving a submission forks a
/// new admin-owned copy rather than mutating the user's original.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Entry {
    /// Unique identifier, assigned from a monotone counter at creation
    pub id: u64,

    /// Identifier of the user who created this row; immutable.
    /// For forked public copies this is the approving admin.
    pub owner_id: String,

    /// Bookmarked URL; required, non-empty
    pub url: String,

    /// Human-readable title; required, non-empty
    pub title: String,

    /// Optional free-text notes
    #[serde(default)]
    pub notes: Option<String>,

    /// Normalized tag set (trimmed, lowercased, deduplicated).
    /// A BTreeSet keeps serialization order stable.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Current moderation status
    pub status: EntryStatus,

    /// True only for rows created by the approve/fork operation
    #[serde(default)]
    pub is_public_copy: bool,

    /// Back-reference to the source entry when `is_public_copy` is true.
    /// Relation only: deleting the source does not cascade here.
    #[serde(default)]
    pub original_id: Option<u64>,

    /// Timestamp when this row was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last mutation
    pub updated_at: DateTime<Utc>,
}

/// Caller identity resolved by the middleware for `/api` requests
///
/// The core never authenticates; it trusts this pair as supplied by the
/// identity layer and evaluates the admin capability once per call.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub is_admin: bool,
}

/// Request payload for creating a new entry
///
/// # Example
/// ```json
/// {
///   "url": "https://example.com",
///   "title": "Example",
///   "notes": "worth a read",
///   "tags": ["Rust", " web "]
/// }
/// ```
#[derive(Deserialize)]
pub struct CreateEntryRequest {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Raw tags as sent by the client; normalized before persistence
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request payload for updating an existing entry
///
/// Replaces url/title/notes/tags wholesale; ownership, status and the
/// fork back-reference are never client-writable.
#[derive(Deserialize)]
pub struct UpdateEntryRequest {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Query parameters shared by the personal listing, the public directory
/// and the admin pending queue
///
/// # Example
/// Query string: `?q=example&tags=rust,web&page=2&limit=20`
#[derive(Deserialize, Default)]
pub struct SearchParams {
    /// Optional keyword; case-insensitive substring over title/notes/url
    pub q: Option<String>,

    /// Optional comma-separated tag list; an entry matches only if its
    /// tag set contains every requested tag
    pub tags: Option<String>,

    /// Page number, 1-based. Signed so that explicit zero or negative
    /// values can be rejected as invalid rather than silently clamped.
    pub page: Option<i64>,

    /// Items per page; defaults to 10, clamped to 100
    pub limit: Option<i64>,
}
