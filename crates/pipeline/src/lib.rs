//! babelcall-pipeline – Uebersetzungspipeline pro Sprecher
//!
//! Dieser Crate verbindet die Audio-Chunks eines Sprechers mit den
//! externen Engine-Stufen und dem Raum-Broadcast:
//!
//! ```text
//! Dispatch (Signaling)
//!     |  begrenzte Chunk-Queue (try_send, Verwerfen bei Stau)
//!     v
//! PipelineWorker (pro Verbindung ein Task, strikt sequenziell)
//!     |
//!     +-- Transkription  (Engine)
//!     +-- Uebersetzung   (Engine, Zielsprache des Sprechers)
//!     +-- Synthese       (Engine, MP3)
//!     |
//!     v
//! EventBroadcaster – translated-audio + subtitles an den Raum
//! ```
//!
//! Jede Verarbeitung ist eine unabhaengige best-effort-Einheit: Fehler
//! brechen nur sie ab und der naechste Chunk heilt die Luecke.

pub mod error;
pub mod worker;

pub use error::{PipelineFehler, PipelineResult};
pub use worker::{PipelineWorker, WorkerHandle, STANDARD_QUEUE_TIEFE};
