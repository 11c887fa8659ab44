//! Fehlertypen fuer die Uebersetzungspipeline

use babelcall_engine::EngineError;
use thiserror::Error;

/// Fehler einer einzelnen Pipeline-Verarbeitung
///
/// Jeder dieser Fehler bricht genau die betroffene Verarbeitung ab –
/// andere Chunks, Verbindungen und Raeume bleiben unberuehrt, es gibt
/// keinen Retry.
#[derive(Debug, Error)]
pub enum PipelineFehler {
    /// Die Transkription lieferte keinen verwertbaren Text
    #[error("Leere Transkription")]
    LeereTranskription,

    /// Eine der drei Engine-Stufen ist fehlgeschlagen
    #[error("Engine-Stufe fehlgeschlagen: {0}")]
    Engine(#[from] EngineError),
}

/// Result-Typ der Pipeline
pub type PipelineResult<T> = Result<T, PipelineFehler>;
