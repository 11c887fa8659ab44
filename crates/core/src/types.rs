//! Gemeinsame Identifikationstypen fuer Babelcall
//!
//! Verbindungs-IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Raum-IDs sind
//! clientgewaehlte Strings (der Raum entsteht beim ersten Join).

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Verbindungs-ID
///
/// Wird beim WebSocket-Connect serverseitig vergeben und in allen
/// Signaling-Nachrichten als Absender-/Empfaenger-Kennung verwendet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Eindeutige Raum-ID
///
/// Raeume werden vom Client benannt und existieren nur solange mindestens
/// ein Teilnehmer Mitglied ist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Erstellt eine RoomId aus einem beliebigen String
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt den inneren String zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "raum:{}", self.0)
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Ein Audio-Stueck eines Sprechers
///
/// Transient: existiert nur fuer die Dauer einer Pipeline-Verarbeitung
/// und wird nie persistiert. `Bytes` haelt die Rohdaten ohne Kopie beim
/// Clone zwischen Dispatch und Worker.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Absender der Audiodaten
    pub sprecher: ConnectionId,
    /// Zielraum fuer die Uebersetzungs-Ausgabe
    pub raum_id: RoomId,
    /// Rohe Audiodaten (Codec-opak, wie vom Client geliefert)
    pub daten: Bytes,
}

/// Auftrag an den Pipeline-Worker einer Verbindung
///
/// Traegt neben dem Chunk den Session-Schnappschuss des Sprechers zum
/// Dispatch-Zeitpunkt, damit eine gleichzeitige Sprach- oder
/// Modellaenderung eine laufende Verarbeitung nicht beeinflusst.
#[derive(Debug, Clone)]
pub struct ChunkAuftrag {
    pub chunk: AudioChunk,
    pub session: crate::session::SessionState,
}
