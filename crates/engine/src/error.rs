//! Fehlertypen fuer die Engine-Anbindung

use thiserror::Error;

/// Fehlertyp fuer Engine-Aufrufe
#[derive(Debug, Error)]
pub enum EngineError {
    /// Transportfehler beim HTTP-Aufruf (DNS, Timeout, TLS)
    #[error("HTTP-Fehler: {0}")]
    Http(#[from] reqwest::Error),

    /// Die API hat einen Fehlerstatus geliefert
    #[error("API-Fehler (Status {status}): {meldung}")]
    Api { status: u16, meldung: String },

    /// Die Antwort war syntaktisch valide, enthielt aber nicht die
    /// erwarteten Felder
    #[error("Unerwartete API-Antwort: {0}")]
    UngueltigeAntwort(String),

    /// Fehlende oder unbrauchbare Konfiguration (z.B. leerer API-Key)
    #[error("Engine-Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

impl EngineError {
    /// Erstellt einen Antwort-Formatfehler
    pub fn ungueltige_antwort(msg: impl Into<String>) -> Self {
        Self::UngueltigeAntwort(msg.into())
    }
}

/// Result-Typ fuer Engine-Aufrufe
pub type EngineResult<T> = Result<T, EngineError>;
