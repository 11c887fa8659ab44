//! Session-Zustand einer Verbindung
//!
//! Jede Verbindung besitzt genau einen `SessionState`, der ausschliesslich
//! vom eigenen Verbindungs-Task mutiert wird. Die Pipeline erhaelt pro
//! Audio-Chunk einen Klon als Schnappschuss – eine Sprach- oder
//! Modellaenderung waehrend einer laufenden Verarbeitung wirkt erst ab dem
//! naechsten Chunk.

use serde::{Deserialize, Serialize};

/// Standard-Zielsprache wenn der Client keine gewaehlt hat
pub const STANDARD_ZIELSPRACHE: &str = "es";

/// Standard-Modell fuer Transkription und Uebersetzung
pub const STANDARD_MODELL: &str = "gemini-pro";

/// Pro-Verbindungs-Konfiguration fuer die Uebersetzungs-Pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Zielsprache fuer Untertitel und Sprachsynthese (ISO-artiger Code)
    pub ziel_sprache: String,
    /// Modell-Kennung fuer die Transkription
    pub transkriptions_modell: String,
    /// Modell-Kennung fuer die Uebersetzung
    pub uebersetzungs_modell: String,
}

impl SessionState {
    /// Setzt die Zielsprache
    pub fn sprache_setzen(&mut self, sprache: impl Into<String>) {
        self.ziel_sprache = sprache.into();
    }

    /// Setzt das Transkriptions-Modell
    pub fn transkriptions_modell_setzen(&mut self, modell: impl Into<String>) {
        self.transkriptions_modell = modell.into();
    }

    /// Setzt das Uebersetzungs-Modell
    pub fn uebersetzungs_modell_setzen(&mut self, modell: impl Into<String>) {
        self.uebersetzungs_modell = modell.into();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            ziel_sprache: STANDARD_ZIELSPRACHE.to_string(),
            transkriptions_modell: STANDARD_MODELL.to_string(),
            uebersetzungs_modell: STANDARD_MODELL.to_string(),
        }
    }
}
