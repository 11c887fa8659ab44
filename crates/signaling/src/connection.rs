//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede WebSocket-Verbindung bekommt eine `ClientConnection` in einem
//! eigenen tokio-Task. Der Task liest eingehende JSON-Nachrichten,
//! dispatcht sie und schreibt ausgehende Events aus der Broadcaster-Queue
//! zurueck auf den Socket.
//!
//! ## Lebenszyklus
//! ```text
//! Verbunden -> ImRaum (via join-room) -> Getrennt
//! ```
//! Beim Verbindungsende raeumt der Task kaskadiert auf: Raum verlassen
//! (mit `user-disconnected` an die Restmitglieder) und Broadcaster-
//! Deregistrierung. Den Pipeline-Worker bricht der Aufrufer nach
//! Rueckkehr von [`ClientConnection::verarbeiten`] ab, damit laufende
//! Engine-Aufrufe dieser Verbindung nicht mehr zu Ende gefuehrt werden.
//!
//! ## Keepalive
//! Der Server sendet periodisch WebSocket-Pings; bleibt der Socket
//! schreibunfaehig, endet der Task.

use axum::extract::ws::{Message, WebSocket};
use babelcall_core::session::SessionState;
use babelcall_core::types::{ChunkAuftrag, ConnectionId};
use babelcall_protocol::ClientMessage;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::hub::SignalingHub;

/// Intervall fuer serverseitige WebSocket-Pings
const KEEPALIVE_INTERVALL: Duration = Duration::from_secs(30);

/// Verarbeitet eine einzelne WebSocket-Verbindung
///
/// Liest JSON-Frames, dispatcht an den [`MessageDispatcher`] und sendet
/// Events aus der Broadcaster-Queue zurueck. Laeuft in einem eigenen
/// tokio-Task.
pub struct ClientConnection {
    verbindungs_id: ConnectionId,
    hub: Arc<SignalingHub>,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection mit frischer ID
    pub fn neu(hub: Arc<SignalingHub>) -> Self {
        Self {
            verbindungs_id: ConnectionId::new(),
            hub,
        }
    }

    /// Gibt die ID dieser Verbindung zurueck
    pub fn verbindungs_id(&self) -> ConnectionId {
        self.verbindungs_id
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client die Verbindung schliesst, ein Schreibfehler
    /// auftritt oder ein Shutdown-Signal eingeht.
    pub async fn verarbeiten(
        self,
        socket: WebSocket,
        chunk_tx: mpsc::Sender<ChunkAuftrag>,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let verbindungs_id = self.verbindungs_id;
        tracing::info!(verbindung = %verbindungs_id, "Neue Verbindung");

        let (mut ws_tx, mut ws_rx) = socket.split();

        // Empfangs-Queue des Broadcasters (Hub -> WebSocket)
        let mut sende_rx = self.hub.verbindung_registrieren(verbindungs_id);

        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.hub));
        let mut ctx = DispatcherContext {
            verbindungs_id,
            session: SessionState::default(),
            chunk_tx,
        };

        let mut ping_intervall = tokio::time::interval(KEEPALIVE_INTERVALL);
        ping_intervall.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // Erster Tick feuert sofort – verbrauchen
        ping_intervall.tick().await;

        loop {
            tokio::select! {
                // Eingehende Nachricht vom Client
                eingehend = ws_rx.next() => {
                    match eingehend {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(nachricht) => dispatcher.dispatch(nachricht, &mut ctx),
                                Err(e) => {
                                    // Ungueltige Nachrichten trennen die
                                    // Verbindung nicht
                                    tracing::warn!(
                                        verbindung = %verbindungs_id,
                                        fehler = %e,
                                        "Ungueltige Nachricht verworfen"
                                    );
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(verbindung = %verbindungs_id, "Verbindung vom Client getrennt");
                            break;
                        }
                        Some(Ok(Message::Binary(_))) => {
                            tracing::trace!(verbindung = %verbindungs_id, "Binaerframe ignoriert");
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                            // Pings beantwortet die WebSocket-Schicht selbst
                        }
                        Some(Err(e)) => {
                            tracing::warn!(
                                verbindung = %verbindungs_id,
                                fehler = %e,
                                "WebSocket-Lesefehler"
                            );
                            break;
                        }
                    }
                }

                // Ausgehendes Event aus dem Broadcaster
                Some(ausgehend) = sende_rx.recv() => {
                    let text = match serde_json::to_string(&ausgehend) {
                        Ok(t) => t,
                        Err(e) => {
                            tracing::error!(
                                verbindung = %verbindungs_id,
                                fehler = %e,
                                "Event nicht serialisierbar"
                            );
                            continue;
                        }
                    };
                    if let Err(e) = ws_tx.send(Message::Text(text)).await {
                        tracing::warn!(
                            verbindung = %verbindungs_id,
                            fehler = %e,
                            "Senden fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Keepalive-Ping
                _ = ping_intervall.tick() => {
                    if let Err(e) = ws_tx.send(Message::Ping(Vec::new())).await {
                        tracing::warn!(
                            verbindung = %verbindungs_id,
                            fehler = %e,
                            "Ping-Senden fehlgeschlagen"
                        );
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(verbindung = %verbindungs_id, "Shutdown-Signal – Verbindung wird getrennt");
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende
        self.hub.getrennt(&verbindungs_id);
        tracing::info!(verbindung = %verbindungs_id, "Verbindungs-Task beendet");
    }
}
