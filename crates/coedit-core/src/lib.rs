//! Coedit Core - Collaboration Session Engine
//!
//! This crate provides the core functionality for coedit:
//! - Document records with unique identifiers
//! - Per-document session membership tracking
//! - Ordered fan-out of edit deltas among session participants

pub mod document;
pub mod error;
pub mod relay;
pub mod session;

pub use document::{Document, DocumentId, DocumentMeta};
pub use error::{Error, Result};
pub use relay::{ChangeRelay, Delta};
pub use session::{DeltaReceiver, DeltaSender, ParticipantHandle, ParticipantId, SessionRegistry};
