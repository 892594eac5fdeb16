//! Snapshots and change-suppressed broadcasting

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use super::player::{Player, PlayerId, PlayerView};
use super::world::World;
use crate::ws::protocol::{Frame, ServerMsg};

/// Connection-free copy of every participant's public fields.
///
/// Keyed in ascending id order so the serialized form is canonical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    players: BTreeMap<PlayerId, PlayerView>,
}

impl Snapshot {
    pub fn from_players<'a>(players: impl IntoIterator<Item = &'a Player>) -> Self {
        Self {
            players: players
                .into_iter()
                .map(|p| (p.id.clone(), p.view()))
                .collect(),
        }
    }

    pub fn get(&self, id: &PlayerId) -> Option<&PlayerView> {
        self.players.get(id)
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Delivery seam between the simulation and whatever holds live connections
pub trait FanOut {
    /// Deliver `frame` to each listed participant that has a live connection,
    /// skipping `except`. Returns how many connections accepted the frame.
    fn fan_out(&self, recipients: &[PlayerId], except: Option<&PlayerId>, frame: Frame) -> usize;
}

/// Result of one synchronization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Serialized state matched the last broadcast; nothing sent
    Unchanged,
    /// Full state sent to this many connections
    Broadcast(usize),
}

/// Republishes world state only when its serialized form changes
pub struct Synchronizer {
    last_sent: Mutex<Option<Frame>>,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self {
            last_sent: Mutex::new(None),
        }
    }

    /// Snapshot, compare against the last broadcast, and fan out if different.
    ///
    /// The world lock is held only while copying; sends happen after release.
    pub fn sync(&self, world: &World, out: &impl FanOut) -> SyncOutcome {
        let snapshot = world.all();
        let recipients = snapshot.ids();

        let frame = match ServerMsg::GameState(snapshot).to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to serialize game state");
                return SyncOutcome::Unchanged;
            }
        };

        {
            let mut last = self.last_sent.lock();
            if last.as_deref() == Some(&*frame) {
                return SyncOutcome::Unchanged;
            }
            *last = Some(frame.clone());
        }

        let delivered = out.fan_out(&recipients, None, frame);
        trace!(delivered, players = recipients.len(), "Broadcast game state");
        SyncOutcome::Broadcast(delivered)
    }
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}
