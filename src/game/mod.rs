//! Game simulation modules

pub mod combat;
pub mod gateway;
pub mod physics;
pub mod registry;
pub mod room;
pub mod simulation;
pub mod snapshot;
pub mod state;

pub use gateway::{ConnectionHandle, ConnectionId, Gateway, GatewayError};
pub use registry::RoomRegistry;
pub use room::Room;
pub use state::{GameState, Player, PlayerInput, Slot};
