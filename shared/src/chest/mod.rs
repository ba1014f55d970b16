//! The chest aggregate
//!
//! [`MysticChest`] combines one persisted [`ChestRecord`] with its
//! derived [`Location`] and the runtime lock flag, and orchestrates the
//! codec → compressor → store pipeline on write and the reverse on read.
//! It owns no identity beyond the record's name and holds no store
//! handle; persistence methods borrow the [`ChestStore`] per call.

use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::codec::{self, CodecError, ItemFormat};
use crate::compress::{self, CompressionError};
use crate::models::{ChestKey, ChestRecord, Location, CHEST_SIZE};
use crate::store::ChestStore;

/// Errors reading or writing one chest's loot payload.
///
/// A corrupted payload invalidates only the one record it belongs to,
/// never the working set or the store.
#[derive(Debug, Error)]
pub enum ChestError {
    #[error("payload codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("compression error: {0}")]
    Compression(#[from] CompressionError),

    /// More present items than the container has slots; random placement
    /// could never finish.
    #[error("loot carries {count} items but the container holds {capacity}")]
    LootOverflow { count: usize, capacity: usize },
}

/// Outcome of a lock-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    /// The flag flipped and was persisted.
    Changed,

    /// The chest was already in the requested state; nothing changed.
    AlreadyInState,
}

/// A chest record plus its derived location and runtime lock state.
#[derive(Debug, Clone)]
pub struct MysticChest {
    record: ChestRecord,
    location: Location,
    locked: bool,
}

impl MysticChest {
    /// Create a chest from freshly captured placement data, encoding and
    /// compressing the initial loot. The record keeps its sentinel id
    /// until [`save_to_database`](Self::save_to_database) runs.
    pub fn create<F: ItemFormat>(
        format: &F,
        name: impl Into<String>,
        world: impl Into<String>,
        x: i32,
        y: i32,
        z: i32,
        locked: bool,
        items: &[Option<F::Item>],
    ) -> Result<Self, ChestError> {
        let loot = encode_loot(format, items)?;
        let record = ChestRecord::new(name, world, x, y, z, locked, loot);
        Ok(Self::from_record(record))
    }

    /// Rehydrate a chest from a stored record.
    pub fn from_record(record: ChestRecord) -> Self {
        let location = record.location();
        let locked = record.locked;
        Self {
            record,
            location,
            locked,
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn record(&self) -> &ChestRecord {
        &self.record
    }

    pub fn loot(&self) -> &str {
        &self.record.loot
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether this chest sits at the given location.
    pub fn is_at(&self, location: &Location) -> bool {
        self.location == *location
    }

    /// Insert this chest into the store, assigning its id. Silently
    /// skipped by the store if a chest with the same name already exists.
    pub fn save_to_database(&mut self, store: &ChestStore) {
        store.insert_chest(&mut self.record);
    }

    /// Wholesale replace of the loot payload: encode, compress, persist.
    pub fn set_items<F: ItemFormat>(
        &mut self,
        format: &F,
        store: &ChestStore,
        items: &[Option<F::Item>],
    ) -> Result<(), ChestError> {
        self.record.loot = encode_loot(format, items)?;
        store.update_loot(&self.record.name, &self.record.loot);
        Ok(())
    }

    /// Decode the stored loot and deal it into a container view.
    ///
    /// Each decoded item lands on a uniformly random empty slot,
    /// retrying collisions. The placement is never persisted and is
    /// recomputed on every call, so two consecutive views of the same
    /// record may differ.
    pub fn inventory_view<F: ItemFormat>(
        &self,
        format: &F,
    ) -> Result<Vec<Option<F::Item>>, ChestError> {
        let mut slots: Vec<Option<F::Item>> = (0..CHEST_SIZE).map(|_| None).collect();
        if self.record.loot.is_empty() {
            return Ok(slots);
        }

        let decoded = compress::decompress(&self.record.loot)?;
        let items = codec::decode_items(format, &decoded)?;

        let count = items.iter().filter(|slot| slot.is_some()).count();
        if count > CHEST_SIZE {
            return Err(ChestError::LootOverflow {
                count,
                capacity: CHEST_SIZE,
            });
        }

        let mut rng = rand::thread_rng();
        for item in items.into_iter().flatten() {
            loop {
                let slot = rng.gen_range(0..CHEST_SIZE);
                if slots[slot].is_none() {
                    slots[slot] = Some(item);
                    break;
                }
            }
        }

        Ok(slots)
    }

    /// Lock the chest and persist the flag. Locking an already-locked
    /// chest changes nothing and says so.
    pub fn lock(&mut self, store: &ChestStore) -> LockTransition {
        if self.locked {
            info!("chest {:?} is already locked", self.record.name);
            return LockTransition::AlreadyInState;
        }
        self.set_locked(store, true);
        info!("chest {:?} has been locked", self.record.name);
        LockTransition::Changed
    }

    /// Unlock the chest and persist the flag. Unlocking an
    /// already-unlocked chest changes nothing and says so.
    pub fn unlock(&mut self, store: &ChestStore) -> LockTransition {
        if !self.locked {
            info!("chest {:?} is already unlocked", self.record.name);
            return LockTransition::AlreadyInState;
        }
        self.set_locked(store, false);
        info!("chest {:?} has been unlocked", self.record.name);
        LockTransition::Changed
    }

    fn set_locked(&mut self, store: &ChestStore, locked: bool) {
        self.locked = locked;
        self.record.locked = locked;
        store.update_lock_status(self.record.id, locked);
    }

    /// Remove this chest's record from the store.
    ///
    /// Does not touch the in-memory working set; the caller is
    /// responsible for evicting the record there, and for dropping any
    /// outstanding UI reference keyed by the chest's name.
    pub fn delete_from_database(&self, store: &ChestStore) {
        store.delete_by_name(&self.record.name);
        info!("chest {:?} has been deleted from the database", self.record.name);
    }

    /// Mint the key bound to this chest's location and name.
    pub fn key(&self) -> ChestKey {
        ChestKey::new(self.location.clone(), self.record.name.clone())
    }
}

fn encode_loot<F: ItemFormat>(
    format: &F,
    items: &[Option<F::Item>],
) -> Result<String, ChestError> {
    if items.is_empty() {
        return Ok(String::new());
    }
    let encoded = codec::encode_items(format, items)?;
    Ok(compress::compress(&encoded))
}
