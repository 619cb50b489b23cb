//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::{Gateway, RoomRegistry};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub room_registry: Arc<RoomRegistry>,
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // One registry for the process lifetime, shared by the gateway and the tick driver
        let room_registry = Arc::new(RoomRegistry::new());
        let gateway = Gateway::new(room_registry.clone());

        Self {
            config,
            room_registry,
            gateway,
        }
    }
}
