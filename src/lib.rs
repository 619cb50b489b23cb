//! Authoritative server for a two-player arena shooter.
//!
//! Connections join rooms by id; the first two take slots 0 and 1. A single
//! tick driver advances every room at a fixed rate and pushes sparse state
//! deltas to the room's occupants after each tick.
//!
//! - `game`: entity model, simulation, delta tracking, rooms, registry and gateway
//! - `ws`: wire protocol and the WebSocket session
//! - `http`: router, health check, CORS and static client
//! - `config`, `app`, `util`: environment config, shared state, time and rate limiting

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
