//! SQLite persistence for chest records
//!
//! This module owns the only physical connection to the embedded store.
//! Every operation is a single blocking round trip; callers on a
//! latency-sensitive path must offload it to a dedicated worker.
//!
//! Failure contract: once the store is open, any underlying SQLite
//! failure is caught here, logged, and converted to an empty or default
//! result — `get_all` returns an empty vector, `get_by_name` returns
//! `None`, mutations silently do nothing. Callers cannot tell "not
//! found" apart from "store unavailable"; that weak contract is part of
//! the format and deliberately carried forward.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

use crate::models::ChestRecord;

/// Table holding all chest records. One table, no secondary indexes;
/// name lookups scan all rows.
const TABLE_NAME: &str = "mystic_chests";

/// Errors opening the chest database.
///
/// Only construction can fail loudly; every later operation follows the
/// swallow-and-log contract described in the module docs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open chest database at {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
}

/// CRUD store for chest records over one SQLite connection.
#[derive(Debug)]
pub struct ChestStore {
    conn: Connection,
}

impl ChestStore {
    /// Open (or create) the chest database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { conn })
    }

    /// Open a fresh in-memory database. Used by tests and tooling.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self { conn })
    }

    /// Create the chests table if it does not exist. Idempotent.
    pub fn initialize(&self) {
        let create = format!(
            "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                world TEXT NOT NULL,
                x INTEGER NOT NULL,
                y INTEGER NOT NULL,
                z INTEGER NOT NULL,
                locked BOOLEAN DEFAULT true,
                loot TEXT
            )"
        );
        if let Err(e) = self.conn.execute(&create, []) {
            error!("failed to create chest table: {e}");
        }
    }

    /// Insert a new chest, assigning its store id into `record`.
    ///
    /// If a live record with the same name already exists this is a
    /// silent no-op; callers wanting user-facing feedback must pre-check
    /// with [`get_by_name`](Self::get_by_name) themselves. The existence
    /// check and the insert are two separate statements, not a
    /// transaction; concurrent writers can both pass the check.
    pub fn insert_chest(&self, record: &mut ChestRecord) {
        if self.get_by_name(&record.name).is_some() {
            debug!("chest {:?} already exists, skipping insert", record.name);
            return;
        }

        let insert = format!(
            "INSERT INTO {TABLE_NAME} (name, world, x, y, z, locked, loot)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        );
        let result = self.conn.execute(
            &insert,
            params![
                record.name,
                record.world,
                record.x,
                record.y,
                record.z,
                record.locked,
                record.loot,
            ],
        );

        match result {
            Ok(_) => record.id = self.conn.last_insert_rowid(),
            Err(e) => error!("failed to insert chest {:?}: {e}", record.name),
        }
    }

    /// Replace the loot payload of the named chest. No-op if the name is
    /// unknown.
    pub fn update_loot(&self, name: &str, loot: &str) {
        let update = format!("UPDATE {TABLE_NAME} SET loot = ?1 WHERE name = ?2");
        if let Err(e) = self.conn.execute(&update, params![loot, name]) {
            error!("failed to update loot for chest {name:?}: {e}");
        }
    }

    /// Replace the locked flag of the chest with the given id.
    pub fn update_lock_status(&self, id: i64, locked: bool) {
        let update = format!("UPDATE {TABLE_NAME} SET locked = ?1 WHERE id = ?2");
        if let Err(e) = self.conn.execute(&update, params![locked, id]) {
            error!("failed to update lock status for chest {id}: {e}");
        }
    }

    /// Remove the chest with the given id, if any.
    pub fn delete_by_id(&self, id: i64) {
        let delete = format!("DELETE FROM {TABLE_NAME} WHERE id = ?1");
        if let Err(e) = self.conn.execute(&delete, params![id]) {
            error!("failed to delete chest {id}: {e}");
        }
    }

    /// Remove the chest with the given name, if any.
    pub fn delete_by_name(&self, name: &str) {
        let delete = format!("DELETE FROM {TABLE_NAME} WHERE name = ?1");
        if let Err(e) = self.conn.execute(&delete, params![name]) {
            error!("failed to delete chest {name:?}: {e}");
        }
    }

    /// All chest records in insertion order.
    pub fn get_all(&self) -> Vec<ChestRecord> {
        match self.try_get_all() {
            Ok(records) => records,
            Err(e) => {
                error!("failed to load chests: {e}");
                Vec::new()
            }
        }
    }

    /// The chest with the given name, if one exists and the store is
    /// reachable.
    pub fn get_by_name(&self, name: &str) -> Option<ChestRecord> {
        match self.try_get_by_name(name) {
            Ok(record) => record,
            Err(e) => {
                error!("failed to look up chest {name:?}: {e}");
                None
            }
        }
    }

    fn try_get_all(&self) -> rusqlite::Result<Vec<ChestRecord>> {
        let query = format!(
            "SELECT id, name, world, x, y, z, locked, loot FROM {TABLE_NAME} ORDER BY id"
        );
        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map([], row_to_record)?;
        rows.collect()
    }

    fn try_get_by_name(&self, name: &str) -> rusqlite::Result<Option<ChestRecord>> {
        let query = format!(
            "SELECT id, name, world, x, y, z, locked, loot FROM {TABLE_NAME} WHERE name = ?1"
        );
        let mut stmt = self.conn.prepare(&query)?;
        let mut rows = stmt.query_map(params![name], row_to_record)?;
        rows.next().transpose()
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChestRecord> {
    Ok(ChestRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        world: row.get(2)?,
        x: row.get(3)?,
        y: row.get(4)?,
        z: row.get(5)?,
        locked: row.get(6)?,
        loot: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNSAVED_ID;

    fn test_store() -> ChestStore {
        let store = ChestStore::open_in_memory().unwrap();
        store.initialize();
        store
    }

    fn test_record(name: &str) -> ChestRecord {
        ChestRecord::new(name, "overworld", 1, 64, 1, true, "")
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let store = test_store();
        store.initialize();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_insert_assigns_id() {
        let store = test_store();
        let mut record = test_record("vault");
        assert_eq!(record.id, UNSAVED_ID);

        store.insert_chest(&mut record);
        assert_ne!(record.id, UNSAVED_ID);

        let loaded = store.get_by_name("vault").unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_duplicate_name_is_silently_skipped() {
        let store = test_store();
        let mut first = test_record("vault");
        store.insert_chest(&mut first);

        let mut second = ChestRecord::new("vault", "nether", 9, 9, 9, false, "loot");
        store.insert_chest(&mut second);

        // The second insert is skipped: one live record, and the
        // duplicate never received an id.
        assert_eq!(second.id, UNSAVED_ID);
        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].world, "overworld");
    }

    #[test]
    fn test_get_all_in_insertion_order() {
        let store = test_store();
        for name in ["first", "second", "third"] {
            store.insert_chest(&mut test_record(name));
        }

        let names: Vec<_> = store.get_all().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_delete_by_name_leaves_others() {
        let store = test_store();
        for name in ["first", "second", "third"] {
            store.insert_chest(&mut test_record(name));
        }

        store.delete_by_name("second");

        let names: Vec<_> = store.get_all().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["first", "third"]);
        assert!(store.get_by_name("second").is_none());
        assert!(store.get_by_name("first").is_some());
    }

    #[test]
    fn test_delete_by_id() {
        let store = test_store();
        let mut record = test_record("vault");
        store.insert_chest(&mut record);

        store.delete_by_id(record.id);
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn test_update_loot() {
        let store = test_store();
        let mut record = test_record("vault");
        store.insert_chest(&mut record);

        store.update_loot("vault", "RLE:10a");
        assert_eq!(store.get_by_name("vault").unwrap().loot, "RLE:10a");

        // Unknown name is a no-op.
        store.update_loot("ghost", "RLE:10a");
        assert!(store.get_by_name("ghost").is_none());
    }

    #[test]
    fn test_update_lock_status() {
        let store = test_store();
        let mut record = test_record("vault");
        store.insert_chest(&mut record);

        store.update_lock_status(record.id, false);
        assert!(!store.get_by_name("vault").unwrap().locked);

        store.update_lock_status(record.id, true);
        assert!(store.get_by_name("vault").unwrap().locked);
    }

    #[test]
    fn test_get_by_name_absent() {
        let store = test_store();
        assert!(store.get_by_name("nope").is_none());
    }

    #[test]
    fn test_null_loot_reads_as_empty() {
        let store = test_store();
        store
            .conn
            .execute(
                "INSERT INTO mystic_chests (name, world, x, y, z, locked, loot)
                 VALUES ('bare', 'overworld', 0, 0, 0, true, NULL)",
                [],
            )
            .unwrap();

        assert_eq!(store.get_by_name("bare").unwrap().loot, "");
    }
}
