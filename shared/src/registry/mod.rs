//! The working set of chest records
//!
//! [`ChestRegistry`] is the process-scoped repository of all chest
//! records: loaded wholesale at startup, flushed wholesale at shutdown,
//! and the authoritative in-memory source of truth in between. Every
//! in-world check (is this block a protected chest, does this key still
//! open something) consults it.
//!
//! The registry is not internally synchronized. Callers must funnel all
//! access through one exclusive lock or serialized task; concurrent
//! structural mutation while another operation iterates is undefined.

use tracing::{info, warn};

use crate::chest::MysticChest;
use crate::models::{ChestKey, ChestRecord, KeyAccess, Location};
use crate::store::ChestStore;

/// Process-scoped repository over the store and the in-memory record set.
///
/// Owns the only [`ChestStore`]; pass the registry by handle to whichever
/// component needs it rather than reaching for a global.
#[derive(Debug)]
pub struct ChestRegistry {
    store: ChestStore,
    chests: Vec<ChestRecord>,
}

impl ChestRegistry {
    /// Wrap a store; the working set stays empty until [`init`](Self::init).
    pub fn new(store: ChestStore) -> Self {
        Self {
            store,
            chests: Vec::new(),
        }
    }

    /// Create the schema if needed and load the complete working set.
    pub fn init(&mut self) {
        self.store.initialize();
        self.chests = self.store.get_all();
        info!("loaded {} chests", self.chests.len());
    }

    /// Write every record's loot back to the store. Called once at
    /// shutdown; between init and here the working set is authoritative.
    pub fn flush_all(&self) {
        info!("saving {} chests", self.chests.len());
        for chest in &self.chests {
            self.store.update_loot(&chest.name, &chest.loot);
        }
    }

    /// The underlying store, for callers orchestrating their own writes.
    pub fn store(&self) -> &ChestStore {
        &self.store
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[ChestRecord] {
        &self.chests
    }

    pub fn len(&self) -> usize {
        self.chests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chests.is_empty()
    }

    /// Add a record to the working set.
    pub fn add(&mut self, record: ChestRecord) {
        self.chests.push(record);
    }

    /// Remove the named record from the working set. Returns whether a
    /// record was evicted. Does not touch the store.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.chests.len();
        self.chests.retain(|chest| chest.name != name);
        self.chests.len() != before
    }

    /// The named record, if still live.
    pub fn get(&self, name: &str) -> Option<&ChestRecord> {
        self.chests.iter().find(|chest| chest.name == name)
    }

    /// Whether a protected chest occupies the given location.
    pub fn is_chest_at(&self, location: &Location) -> bool {
        self.chests.iter().any(|chest| chest.is_at(location))
    }

    /// Refresh the working-set copy of an aggregate's record and persist
    /// its lock status. No-op if the name is no longer live.
    pub fn update_chest(&mut self, chest: &MysticChest) {
        let Some(record) = self
            .chests
            .iter_mut()
            .find(|record| record.name == chest.name())
        else {
            warn!("chest {:?} is not in the working set", chest.name());
            return;
        };

        record.loot = chest.loot().to_string();
        record.locked = chest.is_locked();
        self.store.update_lock_status(record.id, chest.is_locked());
    }

    /// Validate a presented key against the physical location being
    /// accessed and the live working set.
    pub fn validate_key(&self, key: &ChestKey, accessed: &Location) -> KeyAccess {
        if key.location != *accessed {
            return KeyAccess::WrongLocation;
        }
        if self.get(&key.name).is_none() {
            return KeyAccess::Missing;
        }
        KeyAccess::Granted
    }
}
