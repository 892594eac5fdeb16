//! Input application: discrete keys and continuous velocity

use super::arena::KEY_SPEED;
use super::player::PlayerId;
use super::world::World;

/// Movement keys understood by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Left,
    Down,
    Right,
}

impl Key {
    /// Map a client key string; anything outside w/a/s/d is ignored
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "w" => Some(Self::Up),
            "a" => Some(Self::Left),
            "s" => Some(Self::Down),
            "d" => Some(Self::Right),
            _ => None,
        }
    }

    /// Velocity delta for one press (screen coordinates, +y is down)
    pub fn delta(self) -> (f64, f64) {
        match self {
            Self::Up => (0.0, -KEY_SPEED),
            Self::Left => (-KEY_SPEED, 0.0),
            Self::Down => (0.0, KEY_SPEED),
            Self::Right => (KEY_SPEED, 0.0),
        }
    }
}

/// Apply a key press. Silently does nothing if the player is gone.
pub fn apply_key(world: &World, id: &PlayerId, key: Key) -> bool {
    let (dvx, dvy) = key.delta();
    world
        .update(id, |player| {
            player.body.vx += dvx;
            player.body.vy += dvy;
        })
        .is_some()
}

/// Overwrite velocity. Non-finite components are rejected.
pub fn apply_velocity(world: &World, id: &PlayerId, vx: f64, vy: f64) -> bool {
    if !vx.is_finite() || !vy.is_finite() {
        return false;
    }
    world
        .update(id, |player| {
            player.body.vx = vx;
            player.body.vy = vy;
        })
        .is_some()
}
