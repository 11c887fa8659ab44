//! babelcall-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alle Nachrichtentypen die zwischen Client und
//! Server ueber den WebSocket ausgetauscht werden.

pub mod encoding;
pub mod messages;

pub use messages::{ClientMessage, ServerMessage};
