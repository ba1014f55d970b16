//! MysticChests backend service
//!
//! Hosts the working-set lifecycle around the core library: one
//! [`ChestService`](service::ChestService) owns the store and the
//! in-memory record set, guide trackers run as cancellable tasks, and
//! the admin command surface drives creation and guidance. The binary
//! in `main.rs` wires this to configuration, logging and signals.

pub mod commands;
pub mod config;
pub mod error;
pub mod items;
pub mod service;
pub mod tracker;

pub use config::Config;
pub use error::{BackendError, BackendResult, ConfigError};
pub use items::{LootItem, LootItemFormat};
pub use service::{ChestService, CloseOutcome, CreateOutcome, GuideToggle, KeyUseOutcome};
pub use tracker::{GuideHint, GuideTracker};
