//! Data models for MysticChests
//!
//! This module defines the persisted chest record, the derived location
//! value used for spatial comparisons, and the key object that binds a
//! holder's access rights to one specific chest.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel id for a record that has not been inserted yet.
pub const UNSAVED_ID: i64 = -1;

/// Number of slots in a chest container.
pub const CHEST_SIZE: usize = 27;

/// A persisted chest record.
///
/// `name` is unique among live records by convention, not by schema: the
/// store checks for an existing record before inserting (see
/// [`crate::store::ChestStore::insert_chest`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestRecord {
    /// Store-assigned id, [`UNSAVED_ID`] before the first insert.
    pub id: i64,

    /// Chest name, unique among live records.
    pub name: String,

    /// World identifier.
    pub world: String,

    /// Voxel x-coordinate.
    pub x: i32,

    /// Voxel y-coordinate.
    pub y: i32,

    /// Voxel z-coordinate.
    pub z: i32,

    /// Whether the chest is locked.
    pub locked: bool,

    /// Compressed, tagged loot payload. Empty when the chest was created
    /// with no items.
    pub loot: String,
}

impl ChestRecord {
    /// Create a new, not-yet-persisted record.
    pub fn new(
        name: impl Into<String>,
        world: impl Into<String>,
        x: i32,
        y: i32,
        z: i32,
        locked: bool,
        loot: impl Into<String>,
    ) -> Self {
        Self {
            id: UNSAVED_ID,
            name: name.into(),
            world: world.into(),
            x,
            y,
            z,
            locked,
            loot: loot.into(),
        }
    }

    /// The location this record describes.
    pub fn location(&self) -> Location {
        Location {
            world: self.world.clone(),
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }

    /// Whether this record sits at the given location.
    pub fn is_at(&self, location: &Location) -> bool {
        self.world == location.world
            && self.x == location.x
            && self.y == location.y
            && self.z == location.z
    }
}

/// A world position, bundled for spatial comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for Location {
    /// Renders the `world:x:y:z` fingerprint carried by chest keys.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.world, self.x, self.y, self.z)
    }
}

/// Error returned when a location fingerprint cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid location fingerprint: {fingerprint}")]
pub struct LocationParseError {
    pub fingerprint: String,
}

impl FromStr for Location {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LocationParseError {
            fingerprint: s.to_string(),
        };

        // World names may not contain ':', so the last three fields are
        // always the coordinates.
        let mut parts = s.rsplitn(4, ':');
        let z = parts.next().ok_or_else(err)?;
        let y = parts.next().ok_or_else(err)?;
        let x = parts.next().ok_or_else(err)?;
        let world = parts.next().ok_or_else(err)?;
        if world.is_empty() {
            return Err(err());
        }

        Ok(Location {
            world: world.to_string(),
            x: x.parse().map_err(|_| err())?,
            y: y.parse().map_err(|_| err())?,
            z: z.parse().map_err(|_| err())?,
        })
    }
}

/// A key bound to one specific chest.
///
/// Carries the location fingerprint and the chest name; both must check
/// out for access to be granted (see
/// [`crate::registry::ChestRegistry::validate_key`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestKey {
    /// Location fingerprint of the chest this key opens.
    pub location: Location,

    /// Name of the chest this key opens.
    pub name: String,
}

impl ChestKey {
    pub fn new(location: Location, name: impl Into<String>) -> Self {
        Self {
            location,
            name: name.into(),
        }
    }

    /// The `world:x:y:z` fingerprint stamped on the physical key.
    pub fn fingerprint(&self) -> String {
        self.location.to_string()
    }
}

/// Outcome of validating a key against a physical location and the
/// working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAccess {
    /// Fingerprint and name both check out.
    Granted,

    /// The key's fingerprint does not match the accessed location.
    WrongLocation,

    /// No live record with the key's name exists any more. Reported to
    /// the holder as "this chest no longer exists", not as a generic
    /// error.
    Missing,
}
