//! Time utilities for the arena simulation

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Fixed simulation step (~60 Hz)
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Wall-clock timestamp used for join and last-activity stamps
pub fn now() -> DateTime<Utc> {
    Utc::now()
}
