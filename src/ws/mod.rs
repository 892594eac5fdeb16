//! WebSocket transport, wire protocol and connection bookkeeping

pub mod handler;
pub mod protocol;
pub mod registry;
pub mod session;
