//! babelcall-engine – Anbindung der externen Sprach-Engines
//!
//! Dieses Crate kapselt die drei extern laufenden Verarbeitungsschritte
//! der Uebersetzungs-Pipeline hinter dem [`TranslationEngine`]-Trait:
//!
//! 1. Transkription (Audio -> Text)
//! 2. Uebersetzung (Text -> Text in Zielsprache)
//! 3. Sprachsynthese (Text -> MP3-Bytes)
//!
//! Die Produktiv-Implementierung [`GeminiEngine`] spricht die Gemini-API
//! fuer Transkription/Uebersetzung und einen Cloud-TTS-Endpunkt fuer die
//! Synthese. Alle Aufrufe sind zustandslos; Modellwahl und Zielsprache
//! kommen pro Aufruf als Parameter herein (keine prozessweiten
//! Modell-Einstellungen).

pub mod error;
pub mod gemini;
pub mod mock;

pub use error::{EngineError, EngineResult};
pub use gemini::{GeminiEngine, SyntheseKonfig};

use async_trait::async_trait;

/// Schnittstelle zu den externen Sprach-Engines
///
/// Implementierungen muessen zustandslos pro Aufruf sein: saemtliche
/// Konfiguration die sich je Verbindung unterscheidet (Modelle,
/// Zielsprache) wird als Parameter uebergeben.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Transkribiert ein Audio-Stueck zu Text
    async fn transkribieren(&self, audio: &[u8], modell: &str) -> EngineResult<String>;

    /// Uebersetzt Text in die Zielsprache
    async fn uebersetzen(
        &self,
        text: &str,
        ziel_sprache: &str,
        modell: &str,
    ) -> EngineResult<String>;

    /// Synthetisiert Sprache aus Text (MP3-kodiert)
    async fn synthetisieren(&self, text: &str) -> EngineResult<Vec<u8>>;
}
