//! Moderation workflow for the public directory
//!
//! State machine: `private → submitted → {approved, rejected}`, with
//! `deleted` reachable by soft delete and reversible via restore. Approval
//! never mutates the submitted entry; it forks a new admin-owned public
//! copy that carries a back-reference to its source.
//!
//! Every operation runs as one redb write transaction. redb serializes
//! writers, so the precondition re-check and the mutation (or fork-insert)
//! commit together; two racing `approve` calls cannot both fork, and an
//! error anywhere aborts the transaction with nothing applied.

use chrono::Utc;
use redb::ReadableTable;

use crate::database::{decode_entry, encode_entry, load_entry, next_entry_id, TABLE_ENTRIES};
use crate::error::ApiError;
use crate::model::{Entry, EntryStatus, Identity};

/// Submits a private entry to the public review queue
///
/// Owner only. One-way: once submitted, the entry is locked until an admin
/// resolves it, and there is at most one outstanding submission per entry.
pub fn submit(db: &redb::Database, entry_id: u64, caller: &Identity) -> Result<Entry, ApiError> {
    let write_txn = db.begin_write()?;
    let entry = {
        let mut table = write_txn.open_table(TABLE_ENTRIES)?;
        let mut entry = load_entry(&table, entry_id)?.ok_or(ApiError::NotFound(entry_id))?;

        if entry.owner_id != caller.user_id {
            return Err(ApiError::NotOwner);
        }
        // Directory copies are managed by admins and never re-enter review
        if entry.is_public_copy || entry.status != EntryStatus::Private {
            return Err(ApiError::InvalidTransition {
                action: "submit",
                from: entry.status,
            });
        }

        entry.status = EntryStatus::Submitted;
        entry.updated_at = Utc::now();
        store(&mut table, &entry)?;
        entry
    };
    write_txn.commit()?;

    tracing::info!(entry_id, owner = %caller.user_id, "entry submitted for review");
    Ok(entry)
}

/// Approves a submission by forking it into the public directory
///
/// Admin only. Creates a new entry owned by the approving admin with
/// `is_public_copy = true`, `status = approved` and `original_id` pointing
/// at the source. The source row itself is not mutated; it stays in the
/// owner's Rolodex as their private history. Returns the new copy.
///
/// Approving the same submission twice fails: the transaction first checks
/// that no copy referencing this source already exists.
pub fn approve(db: &redb::Database, entry_id: u64, caller: &Identity) -> Result<Entry, ApiError> {
    if !caller.is_admin {
        return Err(ApiError::Forbidden);
    }

    let write_txn = db.begin_write()?;
    let copy = {
        let mut table = write_txn.open_table(TABLE_ENTRIES)?;
        let source = load_entry(&table, entry_id)?.ok_or(ApiError::NotFound(entry_id))?;

        if source.is_public_copy || source.status != EntryStatus::Submitted {
            return Err(ApiError::InvalidTransition {
                action: "approve",
                from: source.status,
            });
        }
        if fork_exists(&table, entry_id)? {
            return Err(ApiError::InvalidTransition {
                action: "approve",
                from: source.status,
            });
        }

        let now = Utc::now();
        let copy = Entry {
            id: next_entry_id(&write_txn)?,
            owner_id: caller.user_id.clone(),
            url: source.url.clone(),
            title: source.title.clone(),
            notes: source.notes.clone(),
            tags: source.tags.clone(),
            status: EntryStatus::Approved,
            is_public_copy: true,
            original_id: Some(entry_id),
            created_at: now,
            updated_at: now,
        };
        store(&mut table, &copy)?;
        copy
    };
    write_txn.commit()?;

    tracing::info!(
        source_id = entry_id,
        copy_id = copy.id,
        admin = %caller.user_id,
        "submission approved"
    );
    Ok(copy)
}

/// Rejects a submission without creating a copy
///
/// Admin only. The source transitions to `rejected`; its owner may keep
/// editing it but cannot resubmit it.
pub fn reject(db: &redb::Database, entry_id: u64, caller: &Identity) -> Result<Entry, ApiError> {
    if !caller.is_admin {
        return Err(ApiError::Forbidden);
    }

    let write_txn = db.begin_write()?;
    let entry = {
        let mut table = write_txn.open_table(TABLE_ENTRIES)?;
        let mut entry = load_entry(&table, entry_id)?.ok_or(ApiError::NotFound(entry_id))?;

        if entry.is_public_copy || entry.status != EntryStatus::Submitted {
            return Err(ApiError::InvalidTransition {
                action: "reject",
                from: entry.status,
            });
        }

        entry.status = EntryStatus::Rejected;
        entry.updated_at = Utc::now();
        store(&mut table, &entry)?;
        entry
    };
    write_txn.commit()?;

    tracing::info!(entry_id, admin = %caller.user_id, "submission rejected");
    Ok(entry)
}

/// Soft-deletes an entry
///
/// Owner or admin. The row is kept for restore/purge. Deleting a source
/// entry never touches its forked public copy; the back-reference is a
/// relation, not ownership.
pub fn soft_delete(
    db: &redb::Database,
    entry_id: u64,
    caller: &Identity,
) -> Result<Entry, ApiError> {
    let write_txn = db.begin_write()?;
    let entry = {
        let mut table = write_txn.open_table(TABLE_ENTRIES)?;
        let mut entry = load_entry(&table, entry_id)?.ok_or(ApiError::NotFound(entry_id))?;

        if entry.owner_id != caller.user_id && !caller.is_admin {
            return Err(ApiError::NotOwner);
        }
        if entry.status == EntryStatus::Deleted {
            return Err(ApiError::InvalidTransition {
                action: "delete",
                from: entry.status,
            });
        }

        entry.status = EntryStatus::Deleted;
        entry.updated_at = Utc::now();
        store(&mut table, &entry)?;
        entry
    };
    write_txn.commit()?;

    Ok(entry)
}

/// Restores a soft-deleted entry back to `private`
///
/// Owner or admin. A restored public copy lands on `private` like any
/// other entry, which keeps it out of the directory.
pub fn restore(db: &redb::Database, entry_id: u64, caller: &Identity) -> Result<Entry, ApiError> {
    let write_txn = db.begin_write()?;
    let entry = {
        let mut table = write_txn.open_table(TABLE_ENTRIES)?;
        let mut entry = load_entry(&table, entry_id)?.ok_or(ApiError::NotFound(entry_id))?;

        if entry.owner_id != caller.user_id && !caller.is_admin {
            return Err(ApiError::NotOwner);
        }
        if entry.status != EntryStatus::Deleted {
            return Err(ApiError::InvalidTransition {
                action: "restore",
                from: entry.status,
            });
        }

        entry.status = EntryStatus::Private;
        entry.updated_at = Utc::now();
        store(&mut table, &entry)?;
        entry
    };
    write_txn.commit()?;

    Ok(entry)
}

/// Permanently removes every soft-deleted entry
///
/// Admin only; fails fast otherwise. Succeeds as a no-op when nothing is
/// deleted. Returns the number of rows purged.
pub fn purge(db: &redb::Database, caller: &Identity) -> Result<usize, ApiError> {
    if !caller.is_admin {
        return Err(ApiError::Forbidden);
    }

    let write_txn = db.begin_write()?;
    let purged = {
        let mut table = write_txn.open_table(TABLE_ENTRIES)?;

        let mut doomed = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            let entry = decode_entry(value.value())?;
            if entry.status == EntryStatus::Deleted {
                doomed.push(key.value());
            }
        }

        for id in &doomed {
            table.remove(*id)?;
        }
        doomed.len()
    };
    write_txn.commit()?;

    tracing::info!(purged, admin = %caller.user_id, "purged deleted entries");
    Ok(purged)
}

/// True if a forked copy referencing `original_id` already exists
fn fork_exists<T>(table: &T, original_id: u64) -> Result<bool, ApiError>
where
    T: ReadableTable<u64, &'static str>,
{
    for item in table.iter()? {
        let (_, value) = item?;
        let entry = decode_entry(value.value())?;
        if entry.is_public_copy && entry.original_id == Some(original_id) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn store(
    table: &mut redb::Table<'_, u64, &'static str>,
    entry: &Entry,
) -> Result<(), ApiError> {
    table.insert(entry.id, encode_entry(entry)?.as_str())?;
    Ok(())
}
