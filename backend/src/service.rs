//! Chest lifecycle service
//!
//! [`ChestService`] is the daemon's single entry point: it owns the
//! working set behind one async mutex, runs every store round trip on
//! the blocking pool, and keeps the guide trackers keyed by chest name.
//! Hosts call into it from their event glue (block break, key use,
//! container close) and from the command surface.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

use mysticchests_shared::chest::MysticChest;
use mysticchests_shared::models::{ChestKey, KeyAccess, Location};
use mysticchests_shared::registry::ChestRegistry;
use mysticchests_shared::store::ChestStore;
use mysticchests_shared::ChestError;

use crate::config::Config;
use crate::error::{BackendError, BackendResult};
use crate::items::{LootItem, LootItemFormat};
use crate::tracker::{GuideHint, GuideTracker};

/// Result of presenting a key at a physical location.
#[derive(Debug)]
pub enum KeyUseOutcome {
    /// The key matched; here is the freshly dealt container view.
    Opened {
        name: String,
        contents: Vec<Option<LootItem>>,
    },

    /// The key belongs to a chest somewhere else.
    WrongLocation,

    /// The chest this key was minted for no longer exists.
    Missing,

    /// The record exists but its payload could not be read. Only this
    /// one chest is affected.
    Corrupted { name: String, source: ChestError },
}

/// Result of a container view being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Every slot was taken; the chest is destroyed for good.
    Destroyed,

    /// Remaining items were re-encoded and persisted.
    Updated,

    /// No live record carries this name any more.
    Unknown,
}

/// Result of asking to mint a new chest.
#[derive(Debug)]
pub enum CreateOutcome {
    /// The chest was persisted; hand this key to the creator.
    Created(ChestKey),

    /// A chest with this name already exists.
    AlreadyExists,
}

/// Result of toggling the guide for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideToggle {
    Started,
    Stopped,
    UnknownChest,
}

/// The daemon's chest lifecycle facade.
pub struct ChestService {
    registry: Arc<Mutex<ChestRegistry>>,
    format: LootItemFormat,
    config: Config,
    trackers: Mutex<HashMap<String, GuideTracker>>,
    hints: mpsc::UnboundedSender<GuideHint>,
}

impl ChestService {
    /// Open the store and wire up the service. The returned receiver
    /// carries every directional hint the guide trackers emit.
    pub fn new(config: Config) -> BackendResult<(Self, mpsc::UnboundedReceiver<GuideHint>)> {
        let store = ChestStore::open(&config.storage.database_path)?;
        let registry = Arc::new(Mutex::new(ChestRegistry::new(store)));
        let (hints, hint_rx) = mpsc::unbounded_channel();

        let service = Self {
            registry,
            format: LootItemFormat,
            config,
            trackers: Mutex::new(HashMap::new()),
            hints,
        };
        Ok((service, hint_rx))
    }

    /// Create the schema if needed and load the working set.
    pub async fn startup(&self) -> BackendResult<()> {
        let registry = Arc::clone(&self.registry);
        run_blocking(move || {
            registry.blocking_lock().init();
        })
        .await
    }

    /// Stop every tracker, then flush the working set back to the store.
    pub async fn shutdown(&self) -> BackendResult<()> {
        let trackers: Vec<GuideTracker> = {
            let mut trackers = self.trackers.lock().await;
            trackers.drain().map(|(_, tracker)| tracker).collect()
        };
        for tracker in trackers {
            tracker.stop().await;
        }

        let registry = Arc::clone(&self.registry);
        run_blocking(move || {
            registry.blocking_lock().flush_all();
        })
        .await
    }

    /// Number of live records in the working set.
    pub async fn chest_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Whether a chest with this name is live.
    pub async fn chest_exists(&self, name: &str) -> bool {
        self.registry.lock().await.get(name).is_some()
    }

    /// Whether a break at this location must be cancelled because a
    /// protected chest sits there.
    pub async fn handle_block_break(&self, location: &Location) -> bool {
        self.registry.lock().await.is_chest_at(location)
    }

    /// A key was presented at a physical location: validate it against
    /// the working set and, on a match, deal out the container view.
    pub async fn handle_key_use(&self, key: &ChestKey, accessed: &Location) -> KeyUseOutcome {
        let registry = self.registry.lock().await;
        match registry.validate_key(key, accessed) {
            KeyAccess::WrongLocation => return KeyUseOutcome::WrongLocation,
            KeyAccess::Missing => return KeyUseOutcome::Missing,
            KeyAccess::Granted => {}
        }

        // validate_key granted, so the record is present.
        let Some(record) = registry.get(&key.name).cloned() else {
            return KeyUseOutcome::Missing;
        };
        drop(registry);

        let chest = MysticChest::from_record(record);
        match chest.inventory_view(&self.format) {
            Ok(contents) => {
                info!("chest {:?} opened with key {}", key.name, key.fingerprint());
                KeyUseOutcome::Opened {
                    name: key.name.clone(),
                    contents,
                }
            }
            Err(source) => {
                error!("chest {:?} has an unreadable payload: {source}", key.name);
                KeyUseOutcome::Corrupted {
                    name: key.name.clone(),
                    source,
                }
            }
        }
    }

    /// A container view was closed. An emptied view destroys the chest
    /// outright; anything else is re-encoded and persisted.
    pub async fn handle_container_close(
        &self,
        name: &str,
        contents: Vec<Option<LootItem>>,
    ) -> BackendResult<CloseOutcome> {
        let registry = Arc::clone(&self.registry);
        let format = self.format;
        let name_owned = name.to_string();

        if contents.iter().all(Option::is_none) {
            let destroyed = run_blocking(move || {
                let mut registry = registry.blocking_lock();
                let Some(record) = registry.get(&name_owned).cloned() else {
                    return false;
                };
                MysticChest::from_record(record).delete_from_database(registry.store());
                registry.remove(&name_owned);
                true
            })
            .await?;

            if !destroyed {
                return Ok(CloseOutcome::Unknown);
            }
            self.cancel_guide(name).await;
            info!("chest {name:?} was emptied and destroyed");
            return Ok(CloseOutcome::Destroyed);
        }

        let outcome = run_blocking(move || -> BackendResult<CloseOutcome> {
            let mut registry = registry.blocking_lock();
            let Some(record) = registry.get(&name_owned).cloned() else {
                return Ok(CloseOutcome::Unknown);
            };

            let mut chest = MysticChest::from_record(record);
            chest.set_items(&format, registry.store(), &contents)?;
            registry.update_chest(&chest);
            Ok(CloseOutcome::Updated)
        })
        .await??;

        Ok(outcome)
    }

    /// Mint a new chest at the given location with the captured loot,
    /// persist it and hand back its key.
    ///
    /// The existence check and the insert are two separate store trips;
    /// the store itself also skips duplicate names.
    pub async fn create_chest(
        &self,
        name: &str,
        location: Location,
        items: Vec<Option<LootItem>>,
    ) -> BackendResult<CreateOutcome> {
        let registry = Arc::clone(&self.registry);
        let format = self.format;
        let name_owned = name.to_string();

        let outcome = run_blocking(move || -> BackendResult<CreateOutcome> {
            let mut registry = registry.blocking_lock();
            if registry.get(&name_owned).is_some() {
                return Ok(CreateOutcome::AlreadyExists);
            }

            let mut chest = MysticChest::create(
                &format,
                name_owned,
                location.world,
                location.x,
                location.y,
                location.z,
                true,
                &items,
            )?;
            chest.save_to_database(registry.store());
            registry.add(chest.record().clone());
            info!("created chest {:?} at {}", chest.name(), chest.location());
            Ok(CreateOutcome::Created(chest.key()))
        })
        .await??;

        Ok(outcome)
    }

    /// Toggle the guide tracker for the named chest.
    pub async fn toggle_guide(&self, name: &str) -> GuideToggle {
        let mut trackers = self.trackers.lock().await;

        // Drop trackers that already cancelled themselves.
        trackers.retain(|_, tracker| !tracker.is_finished());

        if let Some(tracker) = trackers.remove(name) {
            tracker.stop().await;
            info!("guide for chest {name:?} stopped");
            return GuideToggle::Stopped;
        }

        if self.registry.lock().await.get(name).is_none() {
            return GuideToggle::UnknownChest;
        }

        let tracker = GuideTracker::spawn(
            Arc::clone(&self.registry),
            name.to_string(),
            self.config.hint_period(),
            self.config.guide.hint_range,
            self.hints.clone(),
        );
        trackers.insert(name.to_string(), tracker);
        info!("guide for chest {name:?} started");
        GuideToggle::Started
    }

    /// Cancel the guide tracker for one chest, if any.
    async fn cancel_guide(&self, name: &str) {
        let tracker = self.trackers.lock().await.remove(name);
        if let Some(tracker) = tracker {
            tracker.stop().await;
        }
    }
}

/// Run a store round trip on the blocking pool.
async fn run_blocking<T, F>(work: F) -> BackendResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BackendError::Internal {
            message: format!("blocking task failed: {e}"),
        })
}
