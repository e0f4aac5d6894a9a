//! State store: the single writer of the synchronized state.
//!
//! The store owns the merged tree and the connectivity flag and publishes
//! both as a [`StateSnapshot`] over a `tokio::sync::watch` channel. Readers
//! subscribe and get read-only snapshots; only `on_message` and
//! `on_connectivity_change` write.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::error::MalformedUpdate;
use crate::tree::{StateTree, merge_into, parse_update};

/// Read-only view handed to presentation code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateSnapshot {
    /// True exactly while the active connection is open.
    pub connected: bool,
    /// Accumulated server state.
    pub tree: StateTree,
    /// Incremented every time `tree` actually changes.
    pub revision: u64,
    /// When `tree` last changed. `None` until the first update lands.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of applying one well-formed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The tree changed and subscribers were notified.
    Changed,
    /// Every key already held the incoming value.
    Unchanged,
}

/// Owner of the merged state tree and connectivity flag.
///
/// Writes go through `&self` so the store can be shared (`Arc<StateStore>`)
/// between the connection supervisor and any number of readers.
#[derive(Debug)]
pub struct StateStore {
    tx: watch::Sender<StateSnapshot>,
}

impl StateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StateSnapshot::default());
        Self { tx }
    }

    /// Record a connectivity transition. Subscribers are only woken when
    /// the flag actually flips.
    pub fn on_connectivity_change(&self, is_open: bool) {
        self.tx.send_if_modified(|snap| {
            if snap.connected == is_open {
                return false;
            }
            snap.connected = is_open;
            true
        });
    }

    /// Parse `raw_payload` and deep-merge it into the tree.
    ///
    /// On error the tree is left exactly as it was.
    pub fn on_message(&self, raw_payload: &str) -> Result<MergeOutcome, MalformedUpdate> {
        let update = parse_update(raw_payload)?;
        let changed = self.tx.send_if_modified(|snap| {
            let changed = merge_into(&mut snap.tree, update);
            if changed {
                snap.revision += 1;
                snap.updated_at = Some(Utc::now());
            }
            changed
        });
        Ok(if changed {
            MergeOutcome::Changed
        } else {
            MergeOutcome::Unchanged
        })
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.tx.subscribe()
    }

    /// Clone of the current snapshot.
    pub fn snapshot(&self) -> StateSnapshot {
        self.tx.borrow().clone()
    }

    pub fn connected(&self) -> bool {
        self.tx.borrow().connected
    }

    /// Clone of the current tree.
    pub fn tree(&self) -> StateTree {
        self.tx.borrow().tree.clone()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
