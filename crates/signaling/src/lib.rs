//! babelcall-signaling – WebSocket Control Layer
//!
//! Dieser Crate implementiert den Signaling-Hub fuer Babelcall. Er
//! verwaltet WebSocket-Verbindungen, Raum-Mitgliedschaften und leitet
//! WebRTC-Negotiations-Nachrichten (Offer/Answer/ICE) zwischen Peers
//! weiter, ohne deren Payloads zu interpretieren.
//!
//! ## Architektur
//!
//! ```text
//! Axum /ws-Endpunkt (Server-Crate)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  Lebenszyklus: Verbunden -> ImRaum -> Getrennt
//!     |
//!     v
//! MessageDispatcher
//!     |
//!     +-- SignalingHub    (Join, Leave, Relay, Trennung)
//!     +-- SessionState    (Sprache, Modelle – lokal im Kontext)
//!     +-- Pipeline-Queue  (Audio-Chunks an den Worker der Verbindung)
//!
//! RoomRegistry     – Wer ist in welchem Raum
//! EventBroadcaster – Events an alle relevanten Verbindungen senden
//! ```
//!
//! ## Ordnungs-Garantien
//! Pro Verbindung existiert genau eine FIFO-Send-Queue; Relay-Nachrichten
//! zwischen einem festen Verbindungs-Paar behalten dadurch ihre
//! Sende-Reihenfolge. Raum-Mutationen sind sofort fuer nachfolgende
//! Relay- und Broadcast-Aufrufe sichtbar.

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod hub;
pub mod rooms;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use dispatcher::{DispatcherContext, MessageDispatcher};
pub use hub::SignalingHub;
pub use rooms::RoomRegistry;
