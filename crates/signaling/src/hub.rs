//! Signaling-Hub – Raum-Mitgliedschaft und Nachrichten-Relay
//!
//! Der Hub besitzt die Raum-Registry und den Broadcaster und ist die
//! einzige Stelle die beide mutiert. Relay-Operationen reichen Payloads
//! unveraendert weiter und interpretieren sie nicht.
//!
//! ## Fehlerverhalten
//! Alle Operationen sind best-effort: ein Relay an eine nicht (mehr)
//! verbundene Gegenstelle wird geloggt und verworfen, nie als Fehler an
//! den Absender gemeldet. Der browserseitige Verbindungs-Timeout ist das
//! sichtbare Signal fuer haengengebliebene Negotiations.

use babelcall_core::types::{ConnectionId, RoomId};
use babelcall_protocol::ServerMessage;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::broadcast::EventBroadcaster;
use crate::rooms::RoomRegistry;

/// Zentraler Signaling-Hub
///
/// Thread-safe; wird als `Arc<SignalingHub>` zwischen allen
/// Verbindungs-Tasks und Pipeline-Workern geteilt.
pub struct SignalingHub {
    /// Autoritative Raum-Mitgliedschaft
    pub raeume: RoomRegistry,
    /// Send-Queues und Raum-Fan-out
    pub broadcaster: EventBroadcaster,
}

impl SignalingHub {
    /// Erstellt einen neuen SignalingHub
    pub fn neu() -> Arc<Self> {
        Arc::new(Self {
            raeume: RoomRegistry::neu(),
            broadcaster: EventBroadcaster::neu(),
        })
    }

    /// Registriert eine neue Verbindung und gibt ihre Empfangs-Queue zurueck
    pub fn verbindung_registrieren(
        &self,
        verbindung: ConnectionId,
    ) -> mpsc::Receiver<ServerMessage> {
        self.broadcaster.client_registrieren(verbindung)
    }

    /// Fuegt eine Verbindung einem Raum hinzu
    ///
    /// Der Raum entsteht beim ersten Beitritt. Bestehende Mitglieder werden
    /// mit `user-connected` benachrichtigt. Ist die Verbindung bereits in
    /// einem anderen Raum, wird sie automatisch migriert: der alte Raum
    /// wird sauber verlassen (inklusive `user-disconnected` an dessen
    /// Mitglieder) bevor der neue betreten wird.
    pub fn beitreten(&self, verbindung: ConnectionId, raum_id: RoomId) {
        let vorheriger = self.raeume.raum_von_verbindung(&verbindung);
        if vorheriger.as_ref() == Some(&raum_id) {
            tracing::debug!(verbindung = %verbindung, raum = %raum_id, "Beitritt ignoriert – bereits Mitglied");
            return;
        }
        if vorheriger.is_some() {
            self.verlassen(&verbindung);
        }

        self.raeume.beitreten(verbindung, raum_id.clone());
        self.broadcaster.raum_beitreten(verbindung, raum_id.clone());

        let benachrichtigt = self.broadcaster.an_raum_ausser_senden(
            &raum_id,
            &verbindung,
            ServerMessage::UserConnected(verbindung),
        );

        tracing::info!(
            verbindung = %verbindung,
            raum = %raum_id,
            bestehende_mitglieder = benachrichtigt,
            "Raum beigetreten"
        );
    }

    /// Entfernt eine Verbindung aus ihrem Raum
    ///
    /// Verbliebene Mitglieder erhalten `user-disconnected`, damit sie ihre
    /// Seite der nun veralteten Peer-Verbindung abbauen koennen. Leert sich
    /// der Raum, verschwindet er.
    pub fn verlassen(&self, verbindung: &ConnectionId) {
        let Some(raum_id) = self.raeume.verlassen(verbindung) else {
            return;
        };
        self.broadcaster.raum_verlassen(verbindung);

        let benachrichtigt = self
            .broadcaster
            .an_raum_senden(&raum_id, ServerMessage::UserDisconnected(*verbindung));

        tracing::info!(
            verbindung = %verbindung,
            raum = %raum_id,
            benachrichtigt,
            "Raum verlassen"
        );
    }

    /// Leitet eine Negotiations-Nachricht an eine Zielverbindung weiter
    ///
    /// Die Nachricht traegt bereits die Absender-Kennung. Ein unbekanntes
    /// Ziel ist kein Fehler: die Nachricht wird verworfen und der Hub
    /// bleibt benutzbar.
    pub fn weiterleiten(
        &self,
        von: &ConnectionId,
        zu: &ConnectionId,
        nachricht: ServerMessage,
    ) {
        if !self.broadcaster.an_verbindung_senden(zu, nachricht) {
            tracing::debug!(von = %von, zu = %zu, "Relay-Ziel nicht erreichbar – Nachricht verworfen");
        }
    }

    /// Kaskadiertes Aufraeumen beim Verbindungsende
    ///
    /// Entfernt die Verbindung aus ihrem Raum (mit Abmelde-Event an die
    /// verbliebenen Mitglieder) und aus dem Broadcaster.
    pub fn getrennt(&self, verbindung: &ConnectionId) {
        self.verlassen(verbindung);
        self.broadcaster.client_entfernen(verbindung);
        tracing::info!(verbindung = %verbindung, "Verbindungs-Ressourcen bereinigt");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use babelcall_protocol::ServerMessage;

    /// Liest alle aktuell wartenden Nachrichten einer Queue
    fn abfluss(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut nachrichten = Vec::new();
        while let Ok(n) = rx.try_recv() {
            nachrichten.push(n);
        }
        nachrichten
    }

    #[tokio::test]
    async fn beitritt_benachrichtigt_nur_bestehende_mitglieder() {
        let hub = SignalingHub::neu();
        let raum = RoomId::from("r1");

        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut rx_a = hub.verbindung_registrieren(a);
        let mut rx_b = hub.verbindung_registrieren(b);

        hub.beitreten(a, raum.clone());
        assert!(abfluss(&mut rx_a).is_empty(), "Erstes Mitglied sieht nichts");

        hub.beitreten(b, raum.clone());
        let bei_a = abfluss(&mut rx_a);
        assert_eq!(bei_a.len(), 1);
        assert!(matches!(bei_a[0], ServerMessage::UserConnected(id) if id == b));
        assert!(
            abfluss(&mut rx_b).is_empty(),
            "Der Beitretende selbst erhaelt kein user-connected"
        );
    }

    #[tokio::test]
    async fn relay_erreicht_genau_das_ziel() {
        let hub = SignalingHub::neu();
        let raum = RoomId::from("r1");

        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let c = ConnectionId::new();
        let mut rx_a = hub.verbindung_registrieren(a);
        let mut rx_b = hub.verbindung_registrieren(b);
        let mut rx_c = hub.verbindung_registrieren(c);

        hub.beitreten(a, raum.clone());
        hub.beitreten(b, raum.clone());
        hub.beitreten(c, raum.clone());
        abfluss(&mut rx_a);
        abfluss(&mut rx_b);
        abfluss(&mut rx_c);

        let sdp = serde_json::json!({"type": "offer", "sdp": "v=0"});
        hub.weiterleiten(
            &a,
            &b,
            ServerMessage::Offer {
                from: a,
                offer: sdp.clone(),
            },
        );

        let bei_b = abfluss(&mut rx_b);
        assert_eq!(bei_b.len(), 1);
        match &bei_b[0] {
            ServerMessage::Offer { from, offer } => {
                assert_eq!(*from, a, "Relay traegt die Absender-Kennung");
                assert_eq!(offer, &sdp, "Payload bleibt unveraendert");
            }
            andere => panic!("Offer erwartet, erhalten: {andere:?}"),
        }
        assert!(abfluss(&mut rx_a).is_empty());
        assert!(abfluss(&mut rx_c).is_empty(), "Nur das Ziel empfaengt");
    }

    #[tokio::test]
    async fn relay_an_geist_ist_kein_fehler() {
        let hub = SignalingHub::neu();
        let a = ConnectionId::new();
        let geist = ConnectionId::new();
        let mut rx_a = hub.verbindung_registrieren(a);

        hub.weiterleiten(
            &a,
            &geist,
            ServerMessage::IceCandidate {
                from: a,
                candidate: serde_json::json!({"candidate": "..."}),
            },
        );

        // Hub bleibt danach voll benutzbar
        hub.beitreten(a, RoomId::from("r1"));
        assert!(hub.raeume.raum_existiert(&RoomId::from("r1")));
        assert!(abfluss(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn trennung_des_letzten_mitglieds_verwirft_den_raum() {
        let hub = SignalingHub::neu();
        let raum = RoomId::from("solo");
        let a = ConnectionId::new();
        let _rx = hub.verbindung_registrieren(a);

        hub.beitreten(a, raum.clone());
        assert!(hub.raeume.raum_existiert(&raum));

        hub.getrennt(&a);
        assert!(!hub.raeume.raum_existiert(&raum));
        assert!(!hub.broadcaster.ist_registriert(&a));
    }

    #[tokio::test]
    async fn trennung_benachrichtigt_jedes_restmitglied_genau_einmal() {
        let hub = SignalingHub::neu();
        let raum = RoomId::from("r1");

        let gehend = ConnectionId::new();
        let bleibend1 = ConnectionId::new();
        let bleibend2 = ConnectionId::new();
        let _rx_gehend = hub.verbindung_registrieren(gehend);
        let mut rx_b1 = hub.verbindung_registrieren(bleibend1);
        let mut rx_b2 = hub.verbindung_registrieren(bleibend2);

        hub.beitreten(gehend, raum.clone());
        hub.beitreten(bleibend1, raum.clone());
        hub.beitreten(bleibend2, raum.clone());
        abfluss(&mut rx_b1);
        abfluss(&mut rx_b2);

        hub.getrennt(&gehend);

        assert!(hub.raeume.raum_existiert(&raum), "Raum mit Restmitgliedern bleibt");
        for rx in [&mut rx_b1, &mut rx_b2] {
            let nachrichten = abfluss(rx);
            let abmeldungen = nachrichten
                .iter()
                .filter(|n| matches!(n, ServerMessage::UserDisconnected(id) if *id == gehend))
                .count();
            assert_eq!(abmeldungen, 1);
        }
    }

    #[tokio::test]
    async fn auto_migration_verlaesst_alten_raum() {
        let hub = SignalingHub::neu();
        let raum_a = RoomId::from("a");
        let raum_b = RoomId::from("b");

        let wechsler = ConnectionId::new();
        let zuschauer = ConnectionId::new();
        let _rx_w = hub.verbindung_registrieren(wechsler);
        let mut rx_z = hub.verbindung_registrieren(zuschauer);

        hub.beitreten(zuschauer, raum_a.clone());
        hub.beitreten(wechsler, raum_a.clone());
        abfluss(&mut rx_z);

        hub.beitreten(wechsler, raum_b.clone());

        // Der Zuschauer im alten Raum sieht die Abmeldung
        let bei_z = abfluss(&mut rx_z);
        assert_eq!(bei_z.len(), 1);
        assert!(matches!(bei_z[0], ServerMessage::UserDisconnected(id) if id == wechsler));

        assert_eq!(hub.raeume.raum_von_verbindung(&wechsler), Some(raum_b));
        assert_eq!(hub.raeume.mitglieder(&raum_a).len(), 1);
    }
}
