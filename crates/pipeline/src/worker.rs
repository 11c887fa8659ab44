//! Pipeline-Worker – Pro-Sprecher-Verarbeitung von Audio-Chunks
//!
//! Jede Verbindung bekommt beim Connect einen eigenen Worker-Task mit
//! begrenzter Chunk-Queue. Der Worker verarbeitet die Chunks seines
//! Sprechers strikt nacheinander – damit behalten dessen Untertitel ihre
//! Reihenfolge, und ein langsamer Engine-Aufruf staut sich in der Queue
//! statt den Dispatch zu blockieren.
//!
//! ## Eine Verarbeitung
//! ```text
//! Transkription -> Uebersetzung -> Synthese -> Raum-Broadcast
//! ```
//! Schlaegt eine Stufe fehl (oder ist die Transkription leer), bricht nur
//! diese Verarbeitung ab: kein Broadcast, kein Retry, naechster Chunk.
//!
//! ## Abbruch
//! Beim Verbindungsende wird der Worker ueber [`WorkerHandle::abbrechen`]
//! hart beendet; ein gerade laufender Engine-Aufruf wird damit verworfen
//! und sein Ergebnis nie gesendet. Die Empfaengerliste eines Broadcasts
//! wird ohnehin erst zum Sendezeitpunkt gelesen.

use babelcall_core::session::SessionState;
use babelcall_core::types::{AudioChunk, ChunkAuftrag, ConnectionId};
use babelcall_engine::TranslationEngine;
use babelcall_protocol::ServerMessage;
use babelcall_signaling::EventBroadcaster;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{PipelineFehler, PipelineResult};

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Standard-Tiefe der Chunk-Queue pro Sprecher
///
/// Laeuft die Uebersetzung langsamer als der Sprecher redet, werden
/// ueberzaehlige Chunks beim Einreihen verworfen (verpasste Sekunden
/// werden nicht nachgesendet).
pub const STANDARD_QUEUE_TIEFE: usize = 8;

// ---------------------------------------------------------------------------
// WorkerHandle
// ---------------------------------------------------------------------------

/// Handle auf den laufenden Worker einer Verbindung
pub struct WorkerHandle {
    /// Begrenzte Chunk-Queue (Dispatch -> Worker)
    pub chunk_tx: mpsc::Sender<ChunkAuftrag>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Bricht den Worker hart ab
    ///
    /// Ein laufender Engine-Aufruf wird an seinem naechsten Await-Punkt
    /// verworfen; eingereihte Chunks verfallen.
    pub fn abbrechen(&self) {
        self.task.abort();
    }
}

// ---------------------------------------------------------------------------
// PipelineWorker
// ---------------------------------------------------------------------------

/// Verarbeitet die Audio-Chunks genau eines Sprechers
pub struct PipelineWorker {
    verbindungs_id: ConnectionId,
    engine: Arc<dyn TranslationEngine>,
    broadcaster: EventBroadcaster,
}

impl PipelineWorker {
    /// Erstellt einen neuen Worker (ohne ihn zu starten)
    pub fn neu(
        verbindungs_id: ConnectionId,
        engine: Arc<dyn TranslationEngine>,
        broadcaster: EventBroadcaster,
    ) -> Self {
        Self {
            verbindungs_id,
            engine,
            broadcaster,
        }
    }

    /// Startet den Worker-Task und gibt sein Handle zurueck
    pub fn starten(self, queue_tiefe: usize) -> WorkerHandle {
        let (chunk_tx, chunk_rx) = mpsc::channel(queue_tiefe);
        let task = tokio::spawn(self.lauf(chunk_rx));
        WorkerHandle { chunk_tx, task }
    }

    /// Worker-Schleife: verarbeitet Chunks strikt nacheinander
    async fn lauf(self, mut chunk_rx: mpsc::Receiver<ChunkAuftrag>) {
        tracing::debug!(verbindung = %self.verbindungs_id, "Pipeline-Worker gestartet");

        while let Some(auftrag) = chunk_rx.recv().await {
            self.auftrag_verarbeiten(auftrag).await;
        }

        tracing::debug!(verbindung = %self.verbindungs_id, "Pipeline-Worker beendet");
    }

    /// Verarbeitet einen Auftrag und sendet das Ergebnis in den Raum
    ///
    /// Fehler bleiben auf diesen einen Chunk begrenzt: sie werden geloggt,
    /// es wird nichts gesendet, der Worker laeuft weiter.
    pub async fn auftrag_verarbeiten(&self, auftrag: ChunkAuftrag) {
        let ChunkAuftrag { chunk, session } = auftrag;
        let raum_id = chunk.raum_id.clone();
        let sprecher = chunk.sprecher;

        match self.stufen_ausfuehren(&chunk, &session).await {
            Ok((untertitel, audio)) => {
                // Empfaenger sind die aktuellen Raum-Mitglieder zum
                // Sendezeitpunkt – nicht die vom Chunk-Eingang
                let audio_empfaenger = self.broadcaster.an_raum_senden(
                    &raum_id,
                    ServerMessage::uebersetztes_audio(Bytes::from(audio)),
                );
                self.broadcaster.an_raum_senden(
                    &raum_id,
                    ServerMessage::untertitel(sprecher, untertitel),
                );

                tracing::debug!(
                    sprecher = %sprecher,
                    raum = %raum_id,
                    empfaenger = audio_empfaenger,
                    "Uebersetzung gesendet"
                );
            }
            Err(fehler) => {
                tracing::warn!(
                    sprecher = %sprecher,
                    raum = %raum_id,
                    fehler = %fehler,
                    "Chunk-Verarbeitung abgebrochen"
                );
            }
        }
    }

    /// Fuehrt die drei Engine-Stufen fuer einen Chunk aus
    ///
    /// Gibt den uebersetzten Text und das synthetisierte Audio zurueck.
    /// Modellwahl und Zielsprache kommen aus dem Session-Schnappschuss
    /// des Sprechers.
    async fn stufen_ausfuehren(
        &self,
        chunk: &AudioChunk,
        session: &SessionState,
    ) -> PipelineResult<(String, Vec<u8>)> {
        let text = self
            .engine
            .transkribieren(&chunk.daten, &session.transkriptions_modell)
            .await?;

        if text.trim().is_empty() {
            return Err(PipelineFehler::LeereTranskription);
        }

        let uebersetzt = self
            .engine
            .uebersetzen(&text, &session.ziel_sprache, &session.uebersetzungs_modell)
            .await?;

        let audio = self.engine.synthetisieren(&uebersetzt).await?;

        Ok((uebersetzt, audio))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use babelcall_core::types::RoomId;
    use babelcall_engine::mock::MockEngine;
    use std::sync::atomic::Ordering;

    fn auftrag(
        sprecher: ConnectionId,
        raum: &str,
        session: SessionState,
    ) -> ChunkAuftrag {
        ChunkAuftrag {
            chunk: AudioChunk {
                sprecher,
                raum_id: RoomId::from(raum),
                daten: Bytes::from_static(&[0x00, 0x01]),
            },
            session,
        }
    }

    /// Liest alle wartenden Nachrichten einer Queue
    fn abfluss(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut nachrichten = Vec::new();
        while let Ok(n) = rx.try_recv() {
            nachrichten.push(n);
        }
        nachrichten
    }

    #[tokio::test]
    async fn erfolg_sendet_audio_und_untertitel_an_alle_mitglieder() {
        // Szenario: Raum "r1" mit A und B, A spricht mit Zielsprache "fr"
        let broadcaster = EventBroadcaster::neu();
        let raum = RoomId::from("r1");

        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let mut rx_a = broadcaster.client_registrieren(a);
        let mut rx_b = broadcaster.client_registrieren(b);
        broadcaster.raum_beitreten(a, raum.clone());
        broadcaster.raum_beitreten(b, raum.clone());

        let engine = Arc::new(MockEngine::erfolgreich("hello", "bonjour", vec![0x01, 0x02]));
        let worker = PipelineWorker::neu(a, Arc::clone(&engine) as Arc<dyn TranslationEngine>, broadcaster);

        let mut session = SessionState::default();
        session.sprache_setzen("fr");
        worker.auftrag_verarbeiten(auftrag(a, "r1", session)).await;

        // Die Uebersetzung lief in die Sprache des Sprechers
        assert_eq!(engine.letzte_zielsprache().as_deref(), Some("fr"));

        for rx in [&mut rx_a, &mut rx_b] {
            let nachrichten = abfluss(rx);
            assert_eq!(nachrichten.len(), 2, "genau ein Audio- und ein Untertitel-Event");
            assert!(matches!(
                &nachrichten[0],
                ServerMessage::TranslatedAudio { audio_data } if audio_data.as_ref() == [0x01, 0x02]
            ));
            assert!(matches!(
                &nachrichten[1],
                ServerMessage::Subtitles { speaker, text } if *speaker == a && text == "bonjour"
            ));
        }
    }

    #[tokio::test]
    async fn nicht_mitglieder_empfangen_nichts() {
        let broadcaster = EventBroadcaster::neu();
        let raum = RoomId::from("r1");

        let sprecher = ConnectionId::new();
        let aussenstehend = ConnectionId::new();
        let _rx_sprecher = broadcaster.client_registrieren(sprecher);
        let mut rx_aussen = broadcaster.client_registrieren(aussenstehend);
        broadcaster.raum_beitreten(sprecher, raum.clone());
        // aussenstehend ist in keinem Raum

        let engine = Arc::new(MockEngine::erfolgreich("hi", "hola", vec![0xaa]));
        let worker = PipelineWorker::neu(
            sprecher,
            engine as Arc<dyn TranslationEngine>,
            broadcaster,
        );
        worker
            .auftrag_verarbeiten(auftrag(sprecher, "r1", SessionState::default()))
            .await;

        assert!(abfluss(&mut rx_aussen).is_empty());
    }

    #[tokio::test]
    async fn broadcast_geht_an_aktuelle_mitgliedschaft() {
        let broadcaster = EventBroadcaster::neu();
        let raum = RoomId::from("r1");

        let sprecher = ConnectionId::new();
        let gegangen = ConnectionId::new();
        let _rx_sprecher = broadcaster.client_registrieren(sprecher);
        let mut rx_gegangen = broadcaster.client_registrieren(gegangen);
        broadcaster.raum_beitreten(sprecher, raum.clone());
        broadcaster.raum_beitreten(gegangen, raum.clone());

        // Das Mitglied verlaesst den Raum bevor der Broadcast passiert
        broadcaster.raum_verlassen(&gegangen);

        let engine = Arc::new(MockEngine::erfolgreich("hi", "hola", vec![0xaa]));
        let worker = PipelineWorker::neu(
            sprecher,
            engine as Arc<dyn TranslationEngine>,
            broadcaster,
        );
        worker
            .auftrag_verarbeiten(auftrag(sprecher, "r1", SessionState::default()))
            .await;

        assert!(
            abfluss(&mut rx_gegangen).is_empty(),
            "Wer vor dem Sendezeitpunkt ging, empfaengt nichts"
        );
    }

    #[tokio::test]
    async fn transkriptions_fehler_bricht_ohne_broadcast_ab() {
        let broadcaster = EventBroadcaster::neu();
        let raum = RoomId::from("r1");

        let sprecher = ConnectionId::new();
        let mut rx = broadcaster.client_registrieren(sprecher);
        broadcaster.raum_beitreten(sprecher, raum.clone());

        let engine = Arc::new(
            MockEngine::erfolgreich("hello", "bonjour", vec![0x01]).mit_transkriptions_fehler(),
        );
        let worker = PipelineWorker::neu(
            sprecher,
            Arc::clone(&engine) as Arc<dyn TranslationEngine>,
            broadcaster,
        );
        worker
            .auftrag_verarbeiten(auftrag(sprecher, "r1", SessionState::default()))
            .await;

        assert!(abfluss(&mut rx).is_empty(), "kein Broadcast bei Fehlschlag");
        // Spaetere Stufen wurden gar nicht erst aufgerufen
        assert_eq!(engine.uebersetzungs_aufrufe.load(Ordering::SeqCst), 0);
        assert_eq!(engine.synthese_aufrufe.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn leere_transkription_bricht_vor_der_uebersetzung_ab() {
        let broadcaster = EventBroadcaster::neu();
        let sprecher = ConnectionId::new();
        let mut rx = broadcaster.client_registrieren(sprecher);
        broadcaster.raum_beitreten(sprecher, RoomId::from("r1"));

        let engine = Arc::new(MockEngine::erfolgreich("   ", "bonjour", vec![0x01]));
        let worker = PipelineWorker::neu(
            sprecher,
            Arc::clone(&engine) as Arc<dyn TranslationEngine>,
            broadcaster,
        );
        worker
            .auftrag_verarbeiten(auftrag(sprecher, "r1", SessionState::default()))
            .await;

        assert!(abfluss(&mut rx).is_empty());
        assert_eq!(engine.uebersetzungs_aufrufe.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn uebersetzungs_fehler_verhindert_synthese_und_broadcast() {
        let broadcaster = EventBroadcaster::neu();
        let sprecher = ConnectionId::new();
        let mut rx = broadcaster.client_registrieren(sprecher);
        broadcaster.raum_beitreten(sprecher, RoomId::from("r1"));

        let engine = Arc::new(
            MockEngine::erfolgreich("hello", "bonjour", vec![0x01]).mit_uebersetzungs_fehler(),
        );
        let worker = PipelineWorker::neu(
            sprecher,
            Arc::clone(&engine) as Arc<dyn TranslationEngine>,
            broadcaster,
        );
        worker
            .auftrag_verarbeiten(auftrag(sprecher, "r1", SessionState::default()))
            .await;

        assert!(abfluss(&mut rx).is_empty());
        assert_eq!(engine.transkriptions_aufrufe.load(Ordering::SeqCst), 1);
        assert_eq!(engine.synthese_aufrufe.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn synthese_fehler_verhindert_broadcast() {
        let broadcaster = EventBroadcaster::neu();
        let sprecher = ConnectionId::new();
        let mut rx = broadcaster.client_registrieren(sprecher);
        broadcaster.raum_beitreten(sprecher, RoomId::from("r1"));

        let engine = Arc::new(
            MockEngine::erfolgreich("hello", "bonjour", vec![0x01]).mit_synthese_fehler(),
        );
        let worker = PipelineWorker::neu(
            sprecher,
            engine as Arc<dyn TranslationEngine>,
            broadcaster,
        );
        worker
            .auftrag_verarbeiten(auftrag(sprecher, "r1", SessionState::default()))
            .await;

        assert!(abfluss(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn worker_laeuft_nach_fehlschlag_weiter() {
        let broadcaster = EventBroadcaster::neu();
        let sprecher = ConnectionId::new();
        let _rx = broadcaster.client_registrieren(sprecher);
        broadcaster.raum_beitreten(sprecher, RoomId::from("r1"));

        // Jede Uebersetzung schlaegt fehl – der Worker darf trotzdem
        // jeden Chunk anfassen
        let engine = Arc::new(
            MockEngine::erfolgreich("hello", "bonjour", vec![0x01]).mit_uebersetzungs_fehler(),
        );
        let worker = PipelineWorker::neu(
            sprecher,
            Arc::clone(&engine) as Arc<dyn TranslationEngine>,
            broadcaster,
        );
        let handle = worker.starten(STANDARD_QUEUE_TIEFE);

        for _ in 0..3 {
            handle
                .chunk_tx
                .send(auftrag(sprecher, "r1", SessionState::default()))
                .await
                .expect("Worker nimmt Chunks an");
        }

        // Warten bis alle drei Chunks verarbeitet wurden
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while engine.uebersetzungs_aufrufe.load(Ordering::SeqCst) < 3 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("Worker hat alle Chunks verarbeitet");

        handle.abbrechen();
    }

    #[tokio::test]
    async fn abbrechen_schliesst_die_queue() {
        let broadcaster = EventBroadcaster::neu();
        let sprecher = ConnectionId::new();

        let engine = Arc::new(MockEngine::erfolgreich("hi", "hola", vec![0x01]));
        let worker = PipelineWorker::neu(
            sprecher,
            engine as Arc<dyn TranslationEngine>,
            broadcaster,
        );
        let handle = worker.starten(STANDARD_QUEUE_TIEFE);

        handle.abbrechen();

        // Nach dem Abbruch nimmt die Queue irgendwann nichts mehr an
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while !handle.chunk_tx.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("Queue wurde geschlossen");
    }
}
