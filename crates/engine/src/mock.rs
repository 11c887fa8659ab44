//! Vorprogrammierte Engine fuer deterministische Tests ohne API-Aufrufe
//!
//! Jede Stufe kann einzeln auf Erfolg oder Fehlschlag gestellt werden;
//! Aufrufzaehler erlauben Assertions darueber, welche Stufen ueberhaupt
//! erreicht wurden.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{EngineError, EngineResult};
use crate::TranslationEngine;

/// Vorprogrammierte Antwort einer Stufe
#[derive(Debug, Clone)]
enum StufenAntwort<T> {
    Erfolg(T),
    Fehlschlag,
}

/// Mock-Engine mit vorprogrammierten Antworten pro Stufe
pub struct MockEngine {
    transkript: StufenAntwort<String>,
    uebersetzung: StufenAntwort<String>,
    synthese: StufenAntwort<Vec<u8>>,

    /// Aufrufzaehler pro Stufe
    pub transkriptions_aufrufe: AtomicUsize,
    pub uebersetzungs_aufrufe: AtomicUsize,
    pub synthese_aufrufe: AtomicUsize,

    /// Zuletzt angefragte Zielsprache (fuer Session-Schnappschuss-Tests)
    letzte_zielsprache: std::sync::Mutex<Option<String>>,
}

impl MockEngine {
    /// Engine bei der alle drei Stufen erfolgreich sind
    pub fn erfolgreich(
        transkript: impl Into<String>,
        uebersetzung: impl Into<String>,
        synthese: Vec<u8>,
    ) -> Self {
        Self {
            transkript: StufenAntwort::Erfolg(transkript.into()),
            uebersetzung: StufenAntwort::Erfolg(uebersetzung.into()),
            synthese: StufenAntwort::Erfolg(synthese),
            transkriptions_aufrufe: AtomicUsize::new(0),
            uebersetzungs_aufrufe: AtomicUsize::new(0),
            synthese_aufrufe: AtomicUsize::new(0),
            letzte_zielsprache: std::sync::Mutex::new(None),
        }
    }

    /// Laesst die Transkription fehlschlagen
    pub fn mit_transkriptions_fehler(mut self) -> Self {
        self.transkript = StufenAntwort::Fehlschlag;
        self
    }

    /// Laesst die Uebersetzung fehlschlagen
    pub fn mit_uebersetzungs_fehler(mut self) -> Self {
        self.uebersetzung = StufenAntwort::Fehlschlag;
        self
    }

    /// Laesst die Synthese fehlschlagen
    pub fn mit_synthese_fehler(mut self) -> Self {
        self.synthese = StufenAntwort::Fehlschlag;
        self
    }

    /// Gibt die zuletzt angefragte Zielsprache zurueck
    pub fn letzte_zielsprache(&self) -> Option<String> {
        self.letzte_zielsprache
            .lock()
            .expect("Mutex nicht vergiftet")
            .clone()
    }

    fn stufen_fehler() -> EngineError {
        EngineError::Api {
            status: 500,
            meldung: "vorprogrammierter Fehlschlag".to_string(),
        }
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    async fn transkribieren(&self, _audio: &[u8], _modell: &str) -> EngineResult<String> {
        self.transkriptions_aufrufe.fetch_add(1, Ordering::SeqCst);
        match &self.transkript {
            StufenAntwort::Erfolg(text) => Ok(text.clone()),
            StufenAntwort::Fehlschlag => Err(Self::stufen_fehler()),
        }
    }

    async fn uebersetzen(
        &self,
        _text: &str,
        ziel_sprache: &str,
        _modell: &str,
    ) -> EngineResult<String> {
        self.uebersetzungs_aufrufe.fetch_add(1, Ordering::SeqCst);
        *self
            .letzte_zielsprache
            .lock()
            .expect("Mutex nicht vergiftet") = Some(ziel_sprache.to_string());
        match &self.uebersetzung {
            StufenAntwort::Erfolg(text) => Ok(text.clone()),
            StufenAntwort::Fehlschlag => Err(Self::stufen_fehler()),
        }
    }

    async fn synthetisieren(&self, _text: &str) -> EngineResult<Vec<u8>> {
        self.synthese_aufrufe.fetch_add(1, Ordering::SeqCst);
        match &self.synthese {
            StufenAntwort::Erfolg(audio) => Ok(audio.clone()),
            StufenAntwort::Fehlschlag => Err(Self::stufen_fehler()),
        }
    }
}
