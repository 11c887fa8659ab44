//! Message-Dispatcher – Routet ClientMessages an die richtigen Hub-Operationen
//!
//! Der Dispatcher empfaengt dekodierte ClientMessages von einer
//! ClientConnection und setzt sie in Hub-Operationen, Session-Mutationen
//! oder Pipeline-Auftraege um.
//!
//! ## Zustandsdisziplin
//! - Der `SessionState` lebt im [`DispatcherContext`] und gehoert damit
//!   exklusiv dem Verbindungs-Task – keine andere Verbindung kann ihn
//!   mutieren.
//! - Audio-Chunks blockieren den Dispatch nie: sie werden mit einem
//!   Session-Schnappschuss in die begrenzte Worker-Queue gelegt
//!   (`try_send`); ist sie voll, wird der neue Chunk verworfen.

use babelcall_core::session::SessionState;
use babelcall_core::types::{AudioChunk, ChunkAuftrag, ConnectionId};
use babelcall_protocol::{ClientMessage, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::hub::SignalingHub;

/// Dispatcher-Kontext – Zustand der aktuellen Verbindung
pub struct DispatcherContext {
    /// ID dieser Verbindung
    pub verbindungs_id: ConnectionId,
    /// Session-Konfiguration, exklusiv von diesem Task mutiert
    pub session: SessionState,
    /// Begrenzte Queue zum Pipeline-Worker dieser Verbindung
    pub chunk_tx: mpsc::Sender<ChunkAuftrag>,
}

/// Zentraler Message-Dispatcher
///
/// Routet eingehende ClientMessages an Hub, Session oder Pipeline-Queue.
pub struct MessageDispatcher {
    hub: Arc<SignalingHub>,
}

impl MessageDispatcher {
    /// Erstellt einen neuen Dispatcher
    pub fn neu(hub: Arc<SignalingHub>) -> Self {
        Self { hub }
    }

    /// Verarbeitet eine eingehende ClientMessage
    ///
    /// Alle Operationen sind nicht-blockierend; langsame Engine-Aufrufe
    /// laufen ausschliesslich im Pipeline-Worker.
    pub fn dispatch(&self, nachricht: ClientMessage, ctx: &mut DispatcherContext) {
        let von = ctx.verbindungs_id;

        match nachricht {
            // ---------------------------------------------------------------
            // Raum-Verwaltung
            // ---------------------------------------------------------------
            ClientMessage::JoinRoom(raum_id) => {
                self.hub.beitreten(von, raum_id);
            }

            // ---------------------------------------------------------------
            // Signaling-Relay (Payloads bleiben unangetastet)
            // ---------------------------------------------------------------
            ClientMessage::Offer { to, offer } => {
                tracing::debug!(von = %von, zu = %to, "Offer weitergeleitet");
                self.hub
                    .weiterleiten(&von, &to, ServerMessage::Offer { from: von, offer });
            }

            ClientMessage::Answer { to, answer } => {
                tracing::debug!(von = %von, zu = %to, "Answer weitergeleitet");
                self.hub
                    .weiterleiten(&von, &to, ServerMessage::Answer { from: von, answer });
            }

            ClientMessage::IceCandidate { to, candidate } => {
                tracing::debug!(von = %von, zu = %to, "ICE-Kandidat weitergeleitet");
                self.hub.weiterleiten(
                    &von,
                    &to,
                    ServerMessage::IceCandidate {
                        from: von,
                        candidate,
                    },
                );
            }

            // ---------------------------------------------------------------
            // Session-Konfiguration (rein lokale Mutationen)
            // ---------------------------------------------------------------
            ClientMessage::SetLanguage(sprache) => {
                tracing::info!(verbindung = %von, sprache = %sprache, "Zielsprache gesetzt");
                ctx.session.sprache_setzen(sprache);
            }

            ClientMessage::SetTranscriptionModel(modell) => {
                tracing::info!(verbindung = %von, modell = %modell, "Transkriptions-Modell gesetzt");
                ctx.session.transkriptions_modell_setzen(modell);
            }

            ClientMessage::SetTranslationModel(modell) => {
                tracing::info!(verbindung = %von, modell = %modell, "Uebersetzungs-Modell gesetzt");
                ctx.session.uebersetzungs_modell_setzen(modell);
            }

            ClientMessage::StartTranslation(raum_id) => {
                tracing::info!(verbindung = %von, raum = %raum_id, "Uebersetzung gestartet");
            }

            // ---------------------------------------------------------------
            // Audio-Chunks -> Pipeline-Worker
            // ---------------------------------------------------------------
            ClientMessage::AudioChunk { room_id, chunk } => {
                tracing::debug!(
                    verbindung = %von,
                    raum = %room_id,
                    bytes = chunk.len(),
                    "Audio-Chunk empfangen"
                );

                let auftrag = ChunkAuftrag {
                    chunk: AudioChunk {
                        sprecher: von,
                        raum_id: room_id,
                        daten: chunk,
                    },
                    session: ctx.session.clone(),
                };

                match ctx.chunk_tx.try_send(auftrag) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(
                            verbindung = %von,
                            "Pipeline-Queue voll – Chunk verworfen"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!(
                            verbindung = %von,
                            "Pipeline-Worker beendet – Chunk verworfen"
                        );
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
