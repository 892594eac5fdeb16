//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON text message `{"type": ..., "payload": {...}}`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::game::collision::CollisionReport;
use crate::game::lifecycle::LoginRequest;
use crate::game::player::{Player, PlayerId};
use crate::game::snapshot::Snapshot;

/// Pre-serialized outbound text frame, shared across recipients
pub type Frame = Arc<str>;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Authenticate as a new participant
    Login(LoginPayload),
    /// Movement input for the current participant
    Input(InputPayload),
    /// Client-detected collision with another participant
    Collision(CollisionPayload),
    /// Resume a participant from an earlier connection
    Reconnect(ReconnectPayload),
}

impl ClientMsg {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub last_position: Option<Position>,
}

impl From<LoginPayload> for LoginRequest {
    fn from(payload: LoginPayload) -> Self {
        Self {
            name: payload.name,
            color: payload.color,
            last_position: payload.last_position.map(|p| (p.x, p.y)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Either a discrete key, a velocity vector, or both
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputPayload {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub vx: Option<f64>,
    #[serde(default)]
    pub vy: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionPayload {
    pub my_id: PlayerId,
    pub partner_id: PlayerId,
    pub my_new_x: f64,
    pub my_new_y: f64,
    pub partner_x: f64,
    pub partner_y: f64,
    #[serde(default)]
    pub collision_angle: Option<f64>,
}

impl From<CollisionPayload> for CollisionReport {
    fn from(payload: CollisionPayload) -> Self {
        Self {
            reporter: payload.my_id,
            partner: payload.partner_id,
            my_new_x: payload.my_new_x,
            my_new_y: payload.my_new_y,
            partner_x: payload.partner_x,
            partner_y: payload.partner_y,
            angle: payload.collision_angle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectPayload {
    pub id: PlayerId,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Sent to a participant once it is active
    Welcome(WelcomePayload),
    /// Full world state, keyed by participant id
    GameState(Snapshot),
    /// Another participant joined
    PlayerJoin(PlayerJoinPayload),
    /// A participant left
    PlayerLeave(PlayerLeavePayload),
    /// A participant was moved outside the tick (collision reconciliation)
    PlayerMove(PlayerMovePayload),
}

impl ServerMsg {
    pub fn welcome(player: &Player) -> Self {
        Self::Welcome(WelcomePayload {
            id: player.id.clone(),
            player_num: player.player_num,
            name: player.name.clone(),
            color: player.color.clone(),
        })
    }

    pub fn player_join(player: &Player) -> Self {
        Self::PlayerJoin(PlayerJoinPayload {
            id: player.id.clone(),
            player_num: player.player_num,
            name: player.name.clone(),
            x: player.body.x,
            y: player.body.y,
            color: player.color.clone(),
        })
    }

    pub fn player_leave(id: PlayerId) -> Self {
        Self::PlayerLeave(PlayerLeavePayload { id })
    }

    pub fn player_move(id: PlayerId, x: f64, y: f64) -> Self {
        Self::PlayerMove(PlayerMovePayload { id, x, y })
    }

    /// Serialize once for fan-out
    pub fn to_frame(&self) -> Result<Frame, ProtocolError> {
        serde_json::to_string(self)
            .map(Frame::from)
            .map_err(ProtocolError::Encode)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomePayload {
    pub id: PlayerId,
    pub player_num: u32,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerJoinPayload {
    pub id: PlayerId,
    pub player_num: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLeavePayload {
    pub id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMovePayload {
    pub id: PlayerId,
    pub x: f64,
    pub y: f64,
}

/// Wire encoding errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Failed to decode client message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode server message: {0}")]
    Encode(#[source] serde_json::Error),
}
