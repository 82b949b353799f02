//! Connection hub: WebSocket upgrades, session tasks, inbound translation.

mod connection;
mod handler;

pub use handler::websocket_handler;
