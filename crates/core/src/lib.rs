//! babelcall-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Babelcall-Crates gemeinsam genutzt werden: ID-Newtypes, den
//! Session-Zustand einer Verbindung und die Auftrags-Typen der Pipeline.
//! Fehlertypen leben bewusst in den Crates deren Operationen fehlschlagen
//! koennen (Engine, Pipeline) – der Hub selbst arbeitet best-effort.

pub mod session;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use session::SessionState;
pub use types::{AudioChunk, ChunkAuftrag, ConnectionId, RoomId};
