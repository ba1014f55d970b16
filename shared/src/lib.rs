//! MysticChests Shared Library
//!
//! This crate contains the core of MysticChests: durable, named,
//! lockable chest records carrying an opaque loot payload that survives
//! a compress/decompress and encode/decode round trip on its way into an
//! embedded SQLite store.
//!
//! # Layers
//!
//! - **Models**: the persisted [`ChestRecord`], derived [`Location`],
//!   and the [`ChestKey`] access token
//! - **Payload Codec**: length-framed, base64-rendered sequences of
//!   opaque items supplied by a host [`ItemFormat`]
//! - **Adaptive Compressor**: picks run-length encoding, DEFLATE, or no
//!   encoding per payload, tagged for dispatch on the way back
//! - **Persistence Store**: CRUD over chest records on one SQLite
//!   connection
//! - **Chest Aggregate & Registry**: orchestration and the in-memory
//!   working set
//!
//! # Usage
//!
//! ```no_run
//! use mysticchests_shared::registry::ChestRegistry;
//! use mysticchests_shared::store::ChestStore;
//!
//! let store = ChestStore::open("mystic_chests.db").expect("open database");
//! let mut registry = ChestRegistry::new(store);
//! registry.init();
//!
//! // ... serve lookups and mutations from the working set ...
//!
//! registry.flush_all();
//! ```

pub mod chest;
pub mod codec;
pub mod compress;
pub mod models;
pub mod registry;
pub mod store;

// Re-export commonly used types for convenience
pub use chest::{ChestError, LockTransition, MysticChest};
pub use codec::{CodecError, ItemFormat};
pub use compress::CompressionError;
pub use models::{ChestKey, ChestRecord, KeyAccess, Location, CHEST_SIZE, UNSAVED_ID};
pub use registry::ChestRegistry;
pub use store::{ChestStore, StoreError};

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_reexports_compose() {
        let record = ChestRecord::new("vault", "overworld", 0, 64, 0, true, "");
        let chest = MysticChest::from_record(record);
        assert_eq!(chest.key().name, "vault");
        assert!(chest.is_locked());
    }
}
