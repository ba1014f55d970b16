//! Guide tracker tasks
//!
//! A [`GuideTracker`] periodically emits a directional hint toward one
//! chest until it is cancelled or the chest's record disappears from the
//! working set. Cancellation is carried by a watch channel the task
//! holds, not by a shared flag: the task observes it within one period
//! and never touches a record after deletion.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

use mysticchests_shared::models::Location;
use mysticchests_shared::registry::ChestRegistry;

/// One directional hint toward a tracked chest.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideHint {
    /// Name of the tracked chest.
    pub chest: String,

    /// Where the hint should point.
    pub location: Location,

    /// Maximum trail length the host should render, in blocks.
    pub range: f64,
}

/// Handle to one running tracker task.
#[derive(Debug)]
pub struct GuideTracker {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl GuideTracker {
    /// Spawn a tracker for the named chest.
    ///
    /// Every `period` the task looks the record up in the working set
    /// and sends a [`GuideHint`]; it stops on cancellation, when the
    /// record is gone, or when nobody listens to the hint channel any
    /// more.
    pub fn spawn(
        registry: Arc<Mutex<ChestRegistry>>,
        name: String,
        period: Duration,
        range: f64,
        hints: mpsc::UnboundedSender<GuideHint>,
    ) -> Self {
        let (cancel, mut cancelled) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let location = {
                            let registry = registry.lock().await;
                            match registry.get(&name) {
                                Some(record) => record.location(),
                                None => {
                                    debug!("chest {name:?} is gone, stopping tracker");
                                    break;
                                }
                            }
                        };

                        let hint = GuideHint {
                            chest: name.clone(),
                            location,
                            range,
                        };
                        if hints.send(hint).is_err() {
                            break;
                        }
                    }
                    changed = cancelled.changed() => {
                        if changed.is_err() || *cancelled.borrow() {
                            debug!("tracker for chest {name:?} cancelled");
                            break;
                        }
                    }
                }
            }
        });

        Self { cancel, handle }
    }

    /// Request cancellation; the task observes it within one period.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Cancel and wait for the task to finish.
    pub async fn stop(self) {
        self.cancel();
        let _ = self.handle.await;
    }

    /// Whether the task has already exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
