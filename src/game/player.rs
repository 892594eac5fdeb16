//! Participant records and their public projection

use std::fmt;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::physics::Body;

/// Length of generated participant identifiers
pub const ID_LEN: usize = 8;

/// Fixed color swatch used when the client does not pick one
pub const COLORS: [&str; 8] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
];

/// Opaque participant identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Draw an 8-character case-sensitive alphanumeric token.
    ///
    /// Uniqueness is probabilistic; collisions are not detected.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let token = rng
            .sample_iter(&Alphanumeric)
            .take(ID_LEN)
            .map(char::from)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick a random color from the swatch
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    COLORS[rng.gen_range(0..COLORS.len())].to_string()
}

/// Default display name for an ordinal
pub fn default_name(player_num: u32) -> String {
    format!("Player {}", player_num)
}

/// Authoritative participant state (owned by the world store)
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    /// 1-based, contiguous, join-ordered
    pub player_num: u32,
    pub name: String,
    /// True when the name came from the client rather than `default_name`
    pub custom_name: bool,
    pub color: String,
    pub body: Body,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Tiebreak for equal join timestamps
    pub join_seq: u64,
}

impl Player {
    /// Create a participant that has not been admitted to the world yet.
    ///
    /// An empty `name` means "assign the default on admission".
    pub fn new(id: PlayerId, name: impl Into<String>, color: impl Into<String>, x: f64, y: f64) -> Self {
        let now = crate::util::time::now();
        let name = name.into();
        Self {
            id,
            player_num: 0,
            custom_name: !name.is_empty(),
            name,
            color: color.into(),
            body: Body::at(x, y),
            joined_at: now,
            last_seen: now,
            join_seq: 0,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id.clone(),
            player_num: self.player_num,
            name: self.name.clone(),
            x: self.body.x,
            y: self.body.y,
            vx: self.body.vx,
            vy: self.body.vy,
            color: self.color.clone(),
            joined_at: self.joined_at,
            last_seen: self.last_seen,
        }
    }
}

/// Connection-free copy of a participant's public fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub player_num: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub color: String,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn generated_ids_are_eight_alphanumerics() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..32 {
            let id = PlayerId::generate(&mut rng);
            assert_eq!(id.as_str().len(), ID_LEN);
            assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn random_color_comes_from_swatch() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let color = random_color(&mut rng);
        assert!(COLORS.contains(&color.as_str()));
    }

    #[test]
    fn view_uses_camel_case_fields() {
        let player = Player::new(PlayerId::from("abcd1234"), "", "#FF6B6B", 100.0, 200.0);
        let json = serde_json::to_value(player.view()).unwrap();
        assert_eq!(json["id"], "abcd1234");
        assert_eq!(json["playerNum"], 0);
        assert_eq!(json["x"], 100.0);
        assert!(json.get("joinedAt").is_some());
        assert!(json.get("lastSeen").is_some());
        assert!(!player.custom_name);
    }
}
