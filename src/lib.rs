//! Arena server library
//!
//! Holds the single source of truth for every connected participant's
//! position and velocity, advances the physics at a fixed rate, applies
//! client input and collision reports, and republishes world state to
//! every connection only when it changed.
//!
//! - `game`: world store, physics, spawn search, input, lifecycle,
//!   collision reconciliation, snapshots and the tick loop
//! - `ws`: wire protocol, connection registry, per-connection sessions
//! - `http`: router with the WebSocket endpoint, health and static assets
//! - `app`, `config`, `util`: wiring, environment config, time and rate limits

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
