//! Coedit wire protocol
//!
//! One JSON object per WebSocket text frame, tagged by an `"event"`
//! field.
//!
//! ## Client -> server
//! ```text
//! {"event":"join-document","documentId":"..."}
//! {"event":"send-changes","documentId":"...","delta":...}
//! {"event":"save-document","documentId":"...","content":"..."}
//! ```
//!
//! ## Server -> client
//! ```text
//! {"event":"load-document","content":"..."}
//! {"event":"receive-changes","delta":...}
//! {"event":"error","code":"...","message":"..."}
//! ```

pub mod error;
pub mod event;
pub mod response;

pub use error::{ProtocolError, ProtocolResult};
pub use event::{ClientEvent, MAX_FRAME_SIZE};
pub use response::ServerEvent;
