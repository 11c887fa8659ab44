//! HTTP- und WebSocket-Oberflaeche des Servers
//!
//! Endpunkte:
//! - `GET /ws` – WebSocket-Upgrade, danach uebernimmt die
//!   `ClientConnection` des Signaling-Crates
//! - `POST /translate` – zustandsloser Uebersetzen+Synthese-Aufruf
//! - `GET /health` – Serverstatus fuer Probes
//!
//! `/translate` beruehrt weder Raum- noch Session-Zustand; fehlende
//! Pflichtfelder ergeben HTTP 400, Engine-Fehler HTTP 500.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use babelcall_core::session::STANDARD_MODELL;
use babelcall_engine::TranslationEngine;
use babelcall_pipeline::PipelineWorker;
use babelcall_protocol::encoding::base64_bytes;
use babelcall_signaling::{ClientConnection, SignalingHub};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Geteilter Zustand aller Axum-Handler
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<SignalingHub>,
    pub engine: Arc<dyn TranslationEngine>,
    /// Tiefe der Chunk-Queue pro Sprecher
    pub queue_tiefe: usize,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_clients: u32,
    pub shutdown_rx: tokio::sync::watch::Receiver<bool>,
    pub start_zeit: Instant,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Baut den Axum-Router mit allen Endpunkten und Layern
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    // CORS: entweder spezifische Origins oder Any (Entwicklung)
    let cors = if cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/translate", post(uebersetzen_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

/// `GET /ws` – Upgrade auf die Signaling-Verbindung
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Client-Limit pruefen bevor das Upgrade passiert
    let online = state.hub.broadcaster.client_anzahl() as u32;
    if online >= state.max_clients {
        tracing::warn!(online, max = state.max_clients, "Server voll – Upgrade abgelehnt");
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    ws.on_upgrade(move |socket| verbindung_betreuen(socket, state))
}

/// Betreut eine aufgebaute WebSocket-Verbindung bis zu ihrem Ende
///
/// Startet den Pipeline-Worker der Verbindung und bricht ihn nach dem
/// Verbindungsende ab, damit laufende Engine-Aufrufe verworfen werden.
async fn verbindung_betreuen(socket: axum::extract::ws::WebSocket, state: AppState) {
    let verbindung = ClientConnection::neu(Arc::clone(&state.hub));

    let worker = PipelineWorker::neu(
        verbindung.verbindungs_id(),
        Arc::clone(&state.engine),
        state.hub.broadcaster.clone(),
    )
    .starten(state.queue_tiefe);

    verbindung
        .verarbeiten(socket, worker.chunk_tx.clone(), state.shutdown_rx.clone())
        .await;

    worker.abbrechen();
}

// ---------------------------------------------------------------------------
// POST /translate
// ---------------------------------------------------------------------------

/// Anfrage an `POST /translate`
///
/// Beide Felder sind Pflicht; die Validierung passiert im Handler damit
/// ein fehlendes Feld ein sauberes 400 mit Fehlertext ergibt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UebersetzenAnfrage {
    pub text: Option<String>,
    pub target_language: Option<String>,
}

/// Erfolgsantwort von `POST /translate`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UebersetzenAntwort {
    pub translated_text: String,
    #[serde(with = "base64_bytes")]
    pub audio_data: Bytes,
}

/// `POST /translate` – uebersetzt Text und synthetisiert das Ergebnis
pub async fn uebersetzen_handler(
    State(state): State<AppState>,
    Json(anfrage): Json<UebersetzenAnfrage>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (text, ziel_sprache) = match (anfrage.text, anfrage.target_language) {
        (Some(text), Some(ziel)) if !text.is_empty() && !ziel.is_empty() => (text, ziel),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Missing required parameters: text and targetLanguage"
                })),
            );
        }
    };

    let ergebnis = async {
        let uebersetzt = state
            .engine
            .uebersetzen(&text, &ziel_sprache, STANDARD_MODELL)
            .await?;
        let audio = state.engine.synthetisieren(&uebersetzt).await?;
        Ok::<_, babelcall_engine::EngineError>((uebersetzt, audio))
    }
    .await;

    match ergebnis {
        Ok((uebersetzt, audio)) => {
            let antwort = UebersetzenAntwort {
                translated_text: uebersetzt,
                audio_data: Bytes::from(audio),
            };
            match serde_json::to_value(&antwort) {
                Ok(json) => (StatusCode::OK, Json(json)),
                Err(e) => {
                    tracing::error!(fehler = %e, "Antwort nicht serialisierbar");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(serde_json::json!({"error": "Internal server error"})),
                    )
                }
            }
        }
        Err(fehler) => {
            tracing::error!(fehler = %fehler, "Uebersetzungs-Endpunkt fehlgeschlagen");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal server error"})),
            )
        }
    }
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Serialize)]
pub struct HealthAntwort {
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    pub verbindungen: usize,
}

/// `GET /health` – gibt den Serverstatus zurueck
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let antwort = HealthAntwort {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_zeit.elapsed().as_secs(),
        verbindungen: state.hub.broadcaster.client_anzahl(),
    };
    (StatusCode::OK, Json(antwort))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
