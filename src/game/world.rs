//! Shared world state store
//!
//! A single reader/writer lock guards the participant table. Writers (tick,
//! input, lifecycle, reconciliation) take it exclusively; snapshotting and
//! lookups take it shared. Nothing performs I/O while holding it.

use std::collections::HashMap;

use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use super::physics::{Body, PhysicsSystem};
use super::player::{default_name, Player, PlayerId};
use super::snapshot::Snapshot;
use crate::util::time;

/// How renumbering treats display names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenamePolicy {
    /// Every participant is reset to "Player N"
    ResetAll,
    /// Only participants that never chose a name are reset
    KeepCustom,
}

/// Table contents; only reachable through `World` accessors
pub struct WorldState {
    players: HashMap<PlayerId, Player>,
    /// Ordinals currently handed out; equals the live count after renumbering
    player_count: u32,
    next_join_seq: u64,
    rename_policy: RenamePolicy,
    rng: ChaCha8Rng,
}

impl WorldState {
    fn new(rng: ChaCha8Rng, rename_policy: RenamePolicy) -> Self {
        Self {
            players: HashMap::new(),
            player_count: 0,
            next_join_seq: 0,
            rename_policy,
            rng,
        }
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn player_count(&self) -> u32 {
        self.player_count
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> + Clone {
        self.players.values()
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> + Clone {
        self.players.values().map(|p| &p.body)
    }

    /// Bodies of everyone except `id`
    pub fn bodies_except<'a>(&'a self, id: &'a PlayerId) -> impl Iterator<Item = &'a Body> + Clone {
        self.players
            .values()
            .filter(move |p| &p.id != id)
            .map(|p| &p.body)
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Admit a participant: next ordinal, default name if none, fresh stamps
    pub fn insert(&mut self, mut player: Player) -> &Player {
        let player_num = self.players.len() as u32 + 1;
        player.player_num = player_num;
        if player.name.is_empty() {
            player.name = default_name(player_num);
            player.custom_name = false;
        }

        let now = time::now();
        player.joined_at = now;
        player.last_seen = now;
        player.join_seq = self.next_join_seq;
        self.next_join_seq += 1;

        let id = player.id.clone();
        self.players.insert(id.clone(), player);
        self.player_count = self.players.len() as u32;
        &self.players[&id]
    }

    /// Delete an entry and renumber the rest
    pub fn delete(&mut self, id: &PlayerId) -> Option<Player> {
        let removed = self.players.remove(id)?;
        self.renumber();
        Some(removed)
    }

    /// Reassign ordinals 1..N in join order and refresh default names
    fn renumber(&mut self) {
        let mut order: Vec<(chrono::DateTime<chrono::Utc>, u64, PlayerId)> = self
            .players
            .values()
            .map(|p| (p.joined_at, p.join_seq, p.id.clone()))
            .collect();
        order.sort();

        for (index, (_, _, id)) in order.into_iter().enumerate() {
            if let Some(player) = self.players.get_mut(&id) {
                player.player_num = index as u32 + 1;
                let reset = match self.rename_policy {
                    RenamePolicy::ResetAll => true,
                    RenamePolicy::KeepCustom => !player.custom_name,
                };
                if reset {
                    player.name = default_name(player.player_num);
                    player.custom_name = false;
                }
            }
        }

        self.player_count = self.players.len() as u32;
    }

    /// One physics step over every participant, in ascending id order
    pub fn step(&mut self) -> usize {
        let mut players: Vec<&mut Player> = self.players.values_mut().collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));
        let mut bodies: Vec<&mut Body> = players.into_iter().map(|p| &mut p.body).collect();
        PhysicsSystem::step(&mut bodies)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_players(self.players.values())
    }
}

/// The world state store
pub struct World {
    state: RwLock<WorldState>,
}

impl World {
    pub fn new(seed: Option<u64>, rename_policy: RenamePolicy) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            state: RwLock::new(WorldState::new(rng, rename_policy)),
        }
    }

    /// Add a participant; returns the admitted record
    pub fn add(&self, player: Player) -> Player {
        self.state.write().insert(player).clone()
    }

    /// Remove a participant, renumbering the rest
    pub fn remove(&self, id: &PlayerId) -> Option<Player> {
        self.state.write().delete(id)
    }

    pub fn get(&self, id: &PlayerId) -> Option<Player> {
        self.state.read().get(id).cloned()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.state.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Connection-free copy of every participant
    pub fn all(&self) -> Snapshot {
        self.state.read().snapshot()
    }

    /// Exclusive read-modify-write of the whole table
    pub fn write<T>(&self, f: impl FnOnce(&mut WorldState) -> T) -> T {
        f(&mut self.state.write())
    }

    /// Shared read of the whole table
    pub fn read<T>(&self, f: impl FnOnce(&WorldState) -> T) -> T {
        f(&self.state.read())
    }

    /// Exclusive mutation of one participant; `None` if it is absent
    pub fn update<T>(&self, id: &PlayerId, f: impl FnOnce(&mut Player) -> T) -> Option<T> {
        self.state.write().get_mut(id).map(f)
    }

    /// Run one tick as a single exclusive transaction
    pub fn tick(&self) {
        let collisions = self.state.write().step();
        if collisions > 0 {
            trace!(collisions, "Resolved body collisions");
        }
    }
}
