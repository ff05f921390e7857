//! WebSocket module for the relay server
//!
//! One actor per connection. Inbound text frames are user turns; each reply
//! goes back as a single HTML text frame.

mod connection;

pub use connection::{websocket_route, ChatConnection, HeartbeatConfig};
