//! Coedit Transport Layer
//!
//! WebSocket transport for coedit: one task per connection, one
//! lifecycle handler per participant.

pub mod handler;
pub mod websocket;

pub use handler::ConnectionHandler;
pub use websocket::WebSocketServer;
