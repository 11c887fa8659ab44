//! WebSocket-Protokoll
//!
//! Definiert alle Nachrichten die ueber die WebSocket-Verbindung zwischen
//! Client und Server ausgetauscht werden.
//!
//! ## Design
//! - JSON-Serialisierung via serde: `{"event": "...", "data": ...}`
//! - Event-Namen in kebab-case, Feldnamen in camelCase (Browser-Konvention)
//! - SDP-Offers/-Answers und ICE-Kandidaten sind fuer den Server opak und
//!   werden als rohes JSON (`serde_json::Value`) unveraendert weitergereicht
//! - Binaere Audiodaten reisen Base64-kodiert (siehe [`crate::encoding`])

use babelcall_core::types::{ConnectionId, RoomId};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::encoding::base64_bytes;

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// Alle Nachrichten die ein Client an den Server senden kann
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Raum betreten (Raum entsteht beim ersten Join)
    JoinRoom(RoomId),

    /// SDP-Offer an einen bestimmten Peer weiterleiten
    #[serde(rename_all = "camelCase")]
    Offer {
        to: ConnectionId,
        offer: serde_json::Value,
    },

    /// SDP-Answer an einen bestimmten Peer weiterleiten
    #[serde(rename_all = "camelCase")]
    Answer {
        to: ConnectionId,
        answer: serde_json::Value,
    },

    /// ICE-Kandidat an einen bestimmten Peer weiterleiten
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        to: ConnectionId,
        candidate: serde_json::Value,
    },

    /// Zielsprache fuer Untertitel/Synthese setzen (ISO-artiger Code)
    SetLanguage(String),

    /// Transkriptions-Modell der eigenen Session setzen
    SetTranscriptionModel(String),

    /// Uebersetzungs-Modell der eigenen Session setzen
    SetTranslationModel(String),

    /// Uebersetzung im Raum starten (rein informativ, wird nur geloggt)
    StartTranslation(RoomId),

    /// Ein Audio-Stueck zur Uebersetzung einreichen
    #[serde(rename_all = "camelCase")]
    AudioChunk {
        room_id: RoomId,
        #[serde(with = "base64_bytes")]
        chunk: Bytes,
    },
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// Alle Nachrichten die der Server an einen Client senden kann
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// SDP-Offer eines anderen Peers
    #[serde(rename_all = "camelCase")]
    Offer {
        from: ConnectionId,
        offer: serde_json::Value,
    },

    /// SDP-Answer eines anderen Peers
    #[serde(rename_all = "camelCase")]
    Answer {
        from: ConnectionId,
        answer: serde_json::Value,
    },

    /// ICE-Kandidat eines anderen Peers
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        from: ConnectionId,
        candidate: serde_json::Value,
    },

    /// Ein neuer Peer ist dem Raum beigetreten
    UserConnected(ConnectionId),

    /// Ein Peer hat den Raum verlassen oder die Verbindung getrennt
    UserDisconnected(ConnectionId),

    /// Synthetisiertes Audio einer Uebersetzung (MP3-kodiert)
    #[serde(rename_all = "camelCase")]
    TranslatedAudio {
        #[serde(with = "base64_bytes")]
        audio_data: Bytes,
    },

    /// Untertitel: uebersetzter Text mit Sprecher-Zuordnung
    Subtitles {
        speaker: ConnectionId,
        text: String,
    },
}

impl ServerMessage {
    /// Baut eine Untertitel-Nachricht
    pub fn untertitel(speaker: ConnectionId, text: impl Into<String>) -> Self {
        Self::Subtitles {
            speaker,
            text: text.into(),
        }
    }

    /// Baut eine Audio-Nachricht aus synthetisierten MP3-Bytes
    pub fn uebersetztes_audio(audio: impl Into<Bytes>) -> Self {
        Self::TranslatedAudio {
            audio_data: audio.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use babelcall_core::types::ConnectionId;

    #[test]
    fn join_room_wire_format() {
        let json = r#"{"event":"join-room","data":"r1"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::JoinRoom(ref r) if r.as_str() == "r1"));
    }

    #[test]
    fn offer_traegt_opakes_sdp() {
        let ziel = ConnectionId::new();
        let json = format!(
            r#"{{"event":"offer","data":{{"to":"{}","offer":{{"type":"offer","sdp":"v=0"}}}}}}"#,
            ziel.inner()
        );
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        match msg {
            ClientMessage::Offer { to, offer } => {
                assert_eq!(to, ziel);
                // Payload bleibt unangetastetes JSON
                assert_eq!(offer["sdp"], "v=0");
            }
            andere => panic!("Offer erwartet, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn audio_chunk_dekodiert_base64() {
        let json = r#"{"event":"audio-chunk","data":{"roomId":"r1","chunk":"AQI="}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::AudioChunk { room_id, chunk } => {
                assert_eq!(room_id.as_str(), "r1");
                assert_eq!(chunk.as_ref(), &[0x01, 0x02]);
            }
            andere => panic!("AudioChunk erwartet, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn server_events_verwenden_kebab_case() {
        let sprecher = ConnectionId::new();
        let json =
            serde_json::to_value(ServerMessage::untertitel(sprecher, "bonjour")).unwrap();
        assert_eq!(json["event"], "subtitles");
        assert_eq!(json["data"]["text"], "bonjour");

        let json = serde_json::to_value(ServerMessage::UserDisconnected(sprecher)).unwrap();
        assert_eq!(json["event"], "user-disconnected");

        let json =
            serde_json::to_value(ServerMessage::uebersetztes_audio(vec![0x01, 0x02])).unwrap();
        assert_eq!(json["event"], "translated-audio");
        assert_eq!(json["data"]["audioData"], "AQI=");
    }
}
