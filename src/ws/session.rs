//! Per-connection session: routes decoded client messages into the game core

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::game::collision::CollisionReport;
use crate::game::input::{apply_key, apply_velocity, Key};
use crate::game::lifecycle::{admit, depart, resume, Phase};
use crate::game::player::PlayerId;
use crate::ws::protocol::{ClientMsg, CollisionPayload, Frame, InputPayload, LoginPayload, ServerMsg};
use crate::ws::registry::{ConnId, ConnectionHandle, SendError};

/// One connection's view of its participant
pub struct Session {
    state: AppState,
    conn_id: ConnId,
    id: PlayerId,
    phase: Phase,
}

impl Session {
    /// Register a new pending connection under a fresh id
    pub fn open(state: AppState, tx: mpsc::Sender<Frame>) -> Self {
        let conn_id = state.connections.next_conn_id();
        let id = state.world.write(|world| PlayerId::generate(world.rng()));
        state
            .connections
            .register(id.clone(), ConnectionHandle::new(conn_id, tx));

        info!(player_id = %id, conn_id, "New connection established");

        Self {
            state,
            conn_id,
            id,
            phase: Phase::Pending,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once a newer connection has taken over this participant
    fn superseded(&self) -> bool {
        self.state.connections.owner(&self.id) != Some(self.conn_id)
    }

    /// Handle one decoded message. An `Err` means this connection is dead.
    pub fn handle(&mut self, msg: ClientMsg) -> Result<(), SendError> {
        if self.phase == Phase::Removed || self.superseded() {
            debug!(player_id = %self.id, conn_id = self.conn_id, "Ignoring message on superseded connection");
            return Ok(());
        }

        match msg {
            ClientMsg::Login(payload) => self.login(payload),
            ClientMsg::Input(payload) => {
                self.input(payload);
                Ok(())
            }
            ClientMsg::Collision(payload) => {
                self.collision(payload);
                Ok(())
            }
            ClientMsg::Reconnect(payload) => self.reconnect(payload.id),
        }
    }

    fn login(&mut self, payload: LoginPayload) -> Result<(), SendError> {
        if self.phase != Phase::Pending {
            warn!(player_id = %self.id, "Ignoring login on active session");
            return Ok(());
        }

        info!(player_id = %self.id, name = %payload.name, "Login attempt");
        let player = admit(&self.state.world, self.id.clone(), payload.into());
        self.phase = Phase::Active;

        self.reply(&ServerMsg::welcome(&player))?;

        let others = self.state.world.all().ids();
        self.state
            .connections
            .broadcast(&others, Some(&self.id), &ServerMsg::player_join(&player));

        self.reply(&ServerMsg::GameState(self.state.world.all()))?;

        info!(
            player_id = %player.id,
            name = %player.name,
            player_num = player.player_num,
            "Player joined the game"
        );
        Ok(())
    }

    fn input(&self, payload: InputPayload) {
        if let Some(key) = payload.key.as_deref() {
            match Key::parse(key) {
                Some(key) => {
                    apply_key(&self.state.world, &self.id, key);
                }
                None => debug!(player_id = %self.id, key, "Ignoring unknown key"),
            }
        }

        if let (Some(vx), Some(vy)) = (payload.vx, payload.vy) {
            if !apply_velocity(&self.state.world, &self.id, vx, vy) {
                debug!(player_id = %self.id, "Velocity input not applied");
            }
        }
    }

    fn collision(&self, payload: CollisionPayload) {
        if self.phase != Phase::Active || payload.my_id != self.id {
            warn!(
                player_id = %self.id,
                claimed = %payload.my_id,
                "Dropping collision report for another participant"
            );
            return;
        }

        let report = CollisionReport::from(payload);
        let outcome = self.state.reconciler.apply(&self.state.world, &report);
        if outcome.reporter.is_none() {
            warn!(player_id = %self.id, "Rejected implausible collision position");
        }

        let everyone = self.state.world.all().ids();
        for (id, x, y) in [outcome.reporter, outcome.partner].into_iter().flatten() {
            self.state
                .connections
                .broadcast(&everyone, Some(&id), &ServerMsg::player_move(id.clone(), x, y));
        }

        debug!(player_id = %self.id, partner_id = %report.partner, "Collision reconciled");
    }

    fn reconnect(&mut self, prior: PlayerId) -> Result<(), SendError> {
        if prior == self.id {
            return Ok(());
        }

        // Takeover and the prior connection's teardown both run under the
        // world lock, so `prior` is either still present and claimed here, or
        // already gone and this session stays as it was.
        let own = self.id.clone();
        let discard_own = self.phase == Phase::Active;
        let connections = &self.state.connections;
        let taken = self.state.world.write(|world| {
            let player = resume(world, &prior)?;
            let discarded = discard_own.then(|| depart(world, &own)).flatten();
            connections.rebind(&own, &prior);
            Some((player, discarded))
        });

        let Some((player, discarded)) = taken else {
            debug!(player_id = %self.id, prior = %prior, "Reconnect target not found");
            return Ok(());
        };

        // the participant this connection created for itself is gone
        if discarded.is_some() {
            let everyone = self.state.world.all().ids();
            self.state
                .connections
                .broadcast(&everyone, None, &ServerMsg::player_leave(own));
        }

        self.id = prior;
        self.phase = Phase::Active;

        self.reply(&ServerMsg::welcome(&player))?;
        self.reply(&ServerMsg::GameState(self.state.world.all()))?;

        info!(player_id = %self.id, conn_id = self.conn_id, "Player reconnected");
        Ok(())
    }

    /// Send to this connection only. A full queue drops the frame; a closed
    /// one ends the session.
    fn reply(&self, msg: &ServerMsg) -> Result<(), SendError> {
        match self.state.connections.send_to(&self.id, msg) {
            Err(SendError::Full) => {
                warn!(player_id = %self.id, "Outbound queue full, dropping reply");
                Ok(())
            }
            other => other,
        }
    }

    /// Tear down after the transport ends
    pub fn close(&mut self) {
        let was_active = self.phase == Phase::Active;
        self.phase = Phase::Removed;

        let (id, conn_id) = (&self.id, self.conn_id);
        let connections = &self.state.connections;
        let released = self.state.world.write(|world| {
            if !connections.release_if_owner(id, conn_id) {
                return None;
            }
            Some(if was_active { depart(world, id) } else { None })
        });

        match released {
            None => {
                debug!(player_id = %self.id, conn_id = self.conn_id, "Connection superseded; participant kept");
            }
            Some(None) => {
                info!(player_id = %self.id, "Pending connection closed");
            }
            Some(Some(player)) => {
                let everyone = self.state.world.all().ids();
                self.state
                    .connections
                    .broadcast(&everyone, None, &ServerMsg::player_leave(self.id.clone()));
                info!(player_id = %self.id, name = %player.name, "Player left the game");
            }
        }
    }
}
