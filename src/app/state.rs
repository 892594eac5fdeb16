//! Application state shared across routes and connections

use std::sync::Arc;

use crate::config::Config;
use crate::game::collision::Reconciler;
use crate::game::snapshot::Synchronizer;
use crate::game::ticker::TickLoop;
use crate::game::world::{RenamePolicy, World};
use crate::ws::registry::ConnectionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub world: Arc<World>,
    pub connections: Arc<ConnectionRegistry>,
    pub sync: Arc<Synchronizer>,
    pub ticker: Arc<TickLoop>,
    pub reconciler: Reconciler,
}

impl AppState {
    /// Build the state and start the tick loop. Must run inside a Tokio runtime.
    pub fn new(config: Config) -> Self {
        let state = Self::idle(config);
        state.ticker.start(
            state.world.clone(),
            state.sync.clone(),
            state.connections.clone(),
        );
        state
    }

    /// Build the state without starting the tick loop
    pub fn idle(config: Config) -> Self {
        let rename_policy = if config.preserve_custom_names {
            RenamePolicy::KeepCustom
        } else {
            RenamePolicy::ResetAll
        };

        let world = Arc::new(World::new(config.world_seed, rename_policy));
        let reconciler = Reconciler::new(config.max_reconcile_distance);

        Self {
            config: Arc::new(config),
            world,
            connections: Arc::new(ConnectionRegistry::new()),
            sync: Arc::new(Synchronizer::new()),
            ticker: Arc::new(TickLoop::new()),
            reconciler,
        }
    }
}
