//! Database initialization and table definitions
//!
//! The service persists everything in a single embedded redb file. Entries
//! are stored as JSON-serialized records keyed by their numeric id; a small
//! meta table carries the id counter. All mutations run as single write
//! transactions, which redb serializes, so a status check and the mutation
//! it guards are always applied atomically.

use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};

use crate::error::ApiError;
use crate::model::Entry;

/// Main table for entry records
///
/// Key: entry id (monotone u64)
/// Value: JSON-serialized `Entry` as string
pub const TABLE_ENTRIES: TableDefinition<u64, &str> = TableDefinition::new("entries_v1");

/// Meta table for service-level counters
///
/// Currently holds a single key, [`NEXT_ENTRY_ID`], the id the next created
/// entry will receive. Ids are assigned in creation order, which is what
/// makes the `id`-descending tie-break of the search ordering stable.
pub const TABLE_META: TableDefinition<&str, u64> = TableDefinition::new("meta_v1");

const NEXT_ENTRY_ID: &str = "next_entry_id";

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe reference to the embedded database
    pub db: Arc<Database>,

    /// Shared secret granting the admin capability. `None` disables admin
    /// access entirely (no moderation possible on this deployment).
    pub admin_token: Option<String>,
}

/// Creates or opens the database file and ensures both tables exist
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_ENTRIES)?;
        write_txn.open_table(TABLE_META)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Reserves the next entry id within an open write transaction
///
/// The counter advance commits (or aborts) together with the entry insert
/// that consumes it, so ids are never burned by failed requests.
pub fn next_entry_id(txn: &WriteTransaction) -> Result<u64, ApiError> {
    let mut meta = txn.open_table(TABLE_META)?;
    let next = meta.get(NEXT_ENTRY_ID)?.map(|g| g.value()).unwrap_or(1);
    meta.insert(NEXT_ENTRY_ID, next + 1)?;
    Ok(next)
}

/// Looks up and deserializes one entry from any readable entries table
pub fn load_entry<T>(table: &T, id: u64) -> Result<Option<Entry>, ApiError>
where
    T: ReadableTable<u64, &'static str>,
{
    match table.get(id)? {
        Some(guard) => Ok(Some(decode_entry(guard.value())?)),
        None => Ok(None),
    }
}

pub fn decode_entry(raw: &str) -> Result<Entry, ApiError> {
    Ok(serde_json::from_str(raw)?)
}

pub fn encode_entry(entry: &Entry) -> Result<String, ApiError> {
    Ok(serde_json::to_string(entry)?)
}
