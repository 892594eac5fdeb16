//! Player lifecycle: admission, reconnection and departure

use tracing::debug;

use super::arena::clamp_to_bounds;
use super::player::{random_color, Player, PlayerId};
use super::spawn::{find_spawn_position, is_clear};
use super::world::{World, WorldState};
use crate::util::time;

/// Per-connection participant phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Socket open, not yet authenticated
    Pending,
    /// Present in the world with an ordinal
    Active,
    /// Terminal
    Removed,
}

/// Decoded login request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginRequest {
    /// Empty means "use the default name"
    pub name: String,
    pub color: Option<String>,
    pub last_position: Option<(f64, f64)>,
}

/// Admit a pending participant under `id`.
///
/// Color is the client's pick or a random swatch entry. A client-supplied
/// last position is clamped into the arena and kept if it is clear of every
/// other body; otherwise the spawn search picks a point. Placement and
/// insertion share one lock window so concurrent logins cannot pick the same
/// free spot.
pub fn admit(world: &World, id: PlayerId, request: LoginRequest) -> Player {
    world.write(|state| {
        let color = match request.color.filter(|c| !c.trim().is_empty()) {
            Some(color) => color,
            None => random_color(state.rng()),
        };

        let remembered = request
            .last_position
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(x, y)| clamp_to_bounds(x, y))
            .filter(|&(x, y)| is_clear(x, y, state.bodies()));

        let (x, y) = match remembered {
            Some(position) => position,
            None => {
                let occupied: Vec<_> = state.bodies().copied().collect();
                find_spawn_position(state.rng(), &occupied)
            }
        };

        debug!(player_id = %id, x, y, "Placing player");
        state
            .insert(Player::new(id, request.name.trim(), color, x, y))
            .clone()
    })
}

/// Resume an existing participant for a reconnecting client.
///
/// Refreshes last activity. `None` if the id is unknown. Takes the locked
/// table so the caller can claim the id in the same window.
pub fn resume(state: &mut WorldState, prior: &PlayerId) -> Option<Player> {
    let player = state.get_mut(prior)?;
    player.last_seen = time::now();
    Some(player.clone())
}

/// Remove a departed participant; the store renumbers the rest
pub fn depart(state: &mut WorldState, id: &PlayerId) -> Option<Player> {
    state.delete(id)
}
