//! Event-Broadcaster – Sendet Events an alle relevanten Verbindungen
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen
//! Clients und stellt Methoden bereit, um Nachrichten gezielt oder an
//! einen ganzen Raum zu senden.
//!
//! ## Selektives Broadcasting
//! - An eine Verbindung: `an_verbindung_senden`
//! - An einen Raum: `an_raum_senden`
//! - An einen Raum ausser einer Verbindung: `an_raum_ausser_senden`
//!
//! Die Raum-Zugehoerigkeit wird hier redundant zur [`RoomRegistry`]
//! gefuehrt, damit der Fan-out ohne Umweg ueber die Registry auskommt;
//! beide werden ausschliesslich vom [`SignalingHub`] mutiert.
//!
//! [`RoomRegistry`]: crate::rooms::RoomRegistry
//! [`SignalingHub`]: crate::hub::SignalingHub

use babelcall_core::types::{ConnectionId, RoomId};
use babelcall_protocol::ServerMessage;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Verbindung
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer verbundenen Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung: ConnectionId,
    pub tx: mpsc::Sender<ServerMessage>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an die Verbindung
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: ServerMessage) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.verbindung, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.verbindung, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Client-Sender, indiziert nach Verbindungs-ID
    clients: DashMap<ConnectionId, ClientSender>,
    /// Raum-Mitgliedschaft: raum_id -> Vec<ConnectionId>
    raum_mitglieder: DashMap<RoomId, Vec<ConnectionId>>,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                raum_mitglieder: DashMap::new(),
            }),
        }
    }

    /// Registriert eine neue Verbindung und gibt ihre Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via WebSocket.
    pub fn client_registrieren(&self, verbindung: ConnectionId) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(SEND_QUEUE_GROESSE);
        let sender = ClientSender { verbindung, tx };
        self.inner.clients.insert(verbindung, sender);
        tracing::debug!(verbindung = %verbindung, "Client im Broadcaster registriert");
        rx
    }

    /// Entfernt eine Verbindung aus dem Broadcaster
    pub fn client_entfernen(&self, verbindung: &ConnectionId) {
        self.inner.clients.remove(verbindung);
        // Aus allen Raeumen entfernen
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|id| id != verbindung);
        });
        // Leere Raum-Eintraege aufraeumen
        self.inner
            .raum_mitglieder
            .retain(|_, mitglieder| !mitglieder.is_empty());
        tracing::debug!(verbindung = %verbindung, "Client aus Broadcaster entfernt");
    }

    /// Fuegt eine Verbindung einem Raum hinzu (fuer selektives Broadcasting)
    pub fn raum_beitreten(&self, verbindung: ConnectionId, raum_id: RoomId) {
        // Aus altem Raum entfernen
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|id| id != &verbindung);
        });

        self.inner
            .raum_mitglieder
            .entry(raum_id)
            .or_default()
            .push(verbindung);
    }

    /// Entfernt eine Verbindung aus ihrem Raum
    pub fn raum_verlassen(&self, verbindung: &ConnectionId) {
        self.inner.raum_mitglieder.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|id| id != verbindung);
        });
        self.inner
            .raum_mitglieder
            .retain(|_, mitglieder| !mitglieder.is_empty());
    }

    /// Sendet eine Nachricht an eine einzelne Verbindung
    ///
    /// Gibt `true` zurueck wenn die Verbindung gefunden und die Nachricht
    /// eingereiht wurde.
    pub fn an_verbindung_senden(
        &self,
        verbindung: &ConnectionId,
        nachricht: ServerMessage,
    ) -> bool {
        match self.inner.clients.get(verbindung) {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(verbindung = %verbindung, "Senden an unbekannte Verbindung");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle Verbindungen in einem Raum
    ///
    /// Die Empfaengerliste wird zum Sendezeitpunkt gelesen – nicht frueher.
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_raum_senden(&self, raum_id: &RoomId, nachricht: ServerMessage) -> usize {
        let mitglieder = match self.inner.raum_mitglieder.get(raum_id) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for verbindung in &mitglieder {
            if let Some(sender) = self.inner.clients.get(verbindung) {
                if sender.senden(nachricht.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Sendet eine Nachricht an alle Verbindungen eines Raums ausser einer
    ///
    /// Nuetzlich um Join/Leave-Events zu verteilen ohne den Ausloeser zu
    /// informieren.
    pub fn an_raum_ausser_senden(
        &self,
        raum_id: &RoomId,
        ausgeschlossen: &ConnectionId,
        nachricht: ServerMessage,
    ) -> usize {
        let mitglieder = match self.inner.raum_mitglieder.get(raum_id) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for verbindung in &mitglieder {
            if verbindung == ausgeschlossen {
                continue;
            }
            if let Some(sender) = self.inner.clients.get(verbindung) {
                if sender.senden(nachricht.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Gibt die Anzahl der registrierten Verbindungen zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn ist_registriert(&self, verbindung: &ConnectionId) -> bool {
        self.inner.clients.contains_key(verbindung)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
