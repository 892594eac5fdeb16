//! Connection registry: participant id -> send-capable handle
//!
//! Kept apart from the world table so the simulation never sees transport
//! types. The two are joined only when fanning out a frame.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::game::player::PlayerId;
use crate::game::snapshot::FanOut;
use crate::ws::protocol::{Frame, ServerMsg};

/// Serial number distinguishing successive connections
pub type ConnId = u64;

/// Outbound side of one live connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub conn_id: ConnId,
    tx: mpsc::Sender<Frame>,
}

impl ConnectionHandle {
    pub fn new(conn_id: ConnId, tx: mpsc::Sender<Frame>) -> Self {
        Self { conn_id, tx }
    }

    /// Queue a frame without waiting
    pub fn try_send(&self, frame: Frame) -> Result<(), SendError> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// Outbound delivery failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("Outbound queue full")]
    Full,

    #[error("Connection closed")]
    Closed,

    #[error("No connection for participant")]
    NotConnected,
}

/// All live connections, keyed by the participant id they currently serve
pub struct ConnectionRegistry {
    connections: DashMap<PlayerId, ConnectionHandle>,
    next_conn_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    pub fn next_conn_id(&self) -> ConnId {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn register(&self, id: PlayerId, handle: ConnectionHandle) {
        if let Some(old) = self.connections.insert(id.clone(), handle) {
            debug!(player_id = %id, old_conn = old.conn_id, "Replaced connection handle");
        }
    }

    /// Move the connection registered under `from` to serve `to`, replacing
    /// whatever stale handle `to` had. Returns false if `from` is not registered.
    pub fn rebind(&self, from: &PlayerId, to: &PlayerId) -> bool {
        match self.connections.remove(from) {
            Some((_, handle)) => {
                self.register(to.clone(), handle);
                true
            }
            None => false,
        }
    }

    /// Drop the entry for `id` only if `conn_id` still owns it.
    ///
    /// A connection superseded by a reconnect must not tear down the
    /// participant its successor now serves.
    pub fn release_if_owner(&self, id: &PlayerId, conn_id: ConnId) -> bool {
        self.connections
            .remove_if(id, |_, handle| handle.conn_id == conn_id)
            .is_some()
    }

    pub fn owner(&self, id: &PlayerId) -> Option<ConnId> {
        self.connections.get(id).map(|h| h.conn_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn send_to(&self, id: &PlayerId, msg: &ServerMsg) -> Result<(), SendError> {
        let handle = self
            .connections
            .get(id)
            .map(|h| h.value().clone())
            .ok_or(SendError::NotConnected)?;
        match msg.to_frame() {
            Ok(frame) => handle.try_send(frame),
            Err(e) => {
                warn!(player_id = %id, error = %e, "Dropping unencodable message");
                Ok(())
            }
        }
    }

    /// Serialize once and fan out to `recipients`
    pub fn broadcast(&self, recipients: &[PlayerId], except: Option<&PlayerId>, msg: &ServerMsg) -> usize {
        match msg.to_frame() {
            Ok(frame) => self.fan_out(recipients, except, frame),
            Err(e) => {
                warn!(error = %e, "Dropping unencodable broadcast");
                0
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FanOut for ConnectionRegistry {
    fn fan_out(&self, recipients: &[PlayerId], except: Option<&PlayerId>, frame: Frame) -> usize {
        // copy handles out so no map shard stays locked while sending
        let handles: Vec<(PlayerId, ConnectionHandle)> = recipients
            .iter()
            .filter(|id| Some(*id) != except)
            .filter_map(|id| {
                self.connections
                    .get(id)
                    .map(|h| (id.clone(), h.value().clone()))
            })
            .collect();

        let mut delivered = 0;
        for (id, handle) in handles {
            match handle.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(SendError::Full) => {
                    warn!(player_id = %id, "Outbound queue full, dropping frame");
                }
                Err(e) => {
                    debug!(player_id = %id, error = %e, "Skipping closed connection");
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(registry: &ConnectionRegistry, id: &str, depth: usize) -> (ConnId, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(depth);
        let conn_id = registry.next_conn_id();
        registry.register(PlayerId::from(id), ConnectionHandle::new(conn_id, tx));
        (conn_id, rx)
    }

    #[test]
    fn fan_out_skips_excluded_and_unconnected() {
        let registry = ConnectionRegistry::new();
        let (_, mut a) = connect(&registry, "aaaaaaaa", 4);
        let (_, mut b) = connect(&registry, "bbbbbbbb", 4);

        let recipients = vec![
            PlayerId::from("aaaaaaaa"),
            PlayerId::from("bbbbbbbb"),
            PlayerId::from("nobody00"),
        ];
        let sent = registry.fan_out(&recipients, Some(&PlayerId::from("bbbbbbbb")), Frame::from("hi"));

        assert_eq!(sent, 1);
        assert_eq!(&*a.try_recv().unwrap(), "hi");
        assert!(b.try_recv().is_err());
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let registry = ConnectionRegistry::new();
        let (_, _rx) = connect(&registry, "slow0000", 1);
        let recipients = vec![PlayerId::from("slow0000")];

        assert_eq!(registry.fan_out(&recipients, None, Frame::from("1")), 1);
        assert_eq!(registry.fan_out(&recipients, None, Frame::from("2")), 0);
    }

    #[test]
    fn superseded_connection_cannot_release_rebound_id() {
        let registry = ConnectionRegistry::new();
        let (old_conn, _old_rx) = connect(&registry, "original", 4);
        let (new_conn, _new_rx) = connect(&registry, "pending0", 4);

        assert!(registry.rebind(&PlayerId::from("pending0"), &PlayerId::from("original")));
        assert_eq!(registry.owner(&PlayerId::from("original")), Some(new_conn));
        assert_eq!(registry.owner(&PlayerId::from("pending0")), None);

        assert!(!registry.release_if_owner(&PlayerId::from("original"), old_conn));
        assert!(registry.release_if_owner(&PlayerId::from("original"), new_conn));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn send_to_unknown_reports_not_connected() {
        let registry = ConnectionRegistry::new();
        let msg = ServerMsg::player_leave(PlayerId::from("x"));
        assert_eq!(registry.send_to(&PlayerId::from("ghost000"), &msg), Err(SendError::NotConnected));
    }

    #[test]
    fn closed_receiver_is_reported() {
        let registry = ConnectionRegistry::new();
        let (_, rx) = connect(&registry, "gone0000", 4);
        drop(rx);
        let msg = ServerMsg::player_leave(PlayerId::from("x"));
        assert_eq!(registry.send_to(&PlayerId::from("gone0000"), &msg), Err(SendError::Closed));
    }
}
