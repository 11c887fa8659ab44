//! babelcall-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und verdrahtet Hub, Engine und
//! Pipeline zu einem lauffaehigen Prozess.

pub mod api;
pub mod config;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::net::TcpListener;

use babelcall_engine::GeminiEngine;
use babelcall_signaling::SignalingHub;

use api::AppState;
use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet den Server und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Engine-Client bauen (Gemini + TTS)
    /// 2. Signaling-Hub anlegen
    /// 3. HTTP/WebSocket-Listener binden
    /// 4. Auf Ctrl-C / SIGTERM warten; laufende Verbindungen erhalten
    ///    das Shutdown-Signal ueber den watch-Kanal
    pub async fn starten(self) -> Result<()> {
        let api_key = self.config.engine_api_key();
        if api_key.is_empty() {
            tracing::warn!(
                "Kein Engine-API-Key konfiguriert – Pipeline-Aufrufe werden fehlschlagen"
            );
        }

        let engine = Arc::new(GeminiEngine::neu(api_key, self.config.synthese_konfig())?);
        let hub = SignalingHub::neu();
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let state = AppState {
            hub,
            engine,
            queue_tiefe: self.config.pipeline.queue_tiefe,
            max_clients: self.config.server.max_clients,
            shutdown_rx,
            start_zeit: Instant::now(),
        };

        let router = api::router(state, &self.config.netzwerk.cors_origins);

        let adresse = self.config.bind_adresse();
        let listener = TcpListener::bind(&adresse).await?;

        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %listener.local_addr()?,
            max_clients = self.config.server.max_clients,
            "Server startet"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                // Laufende Verbindungs-Tasks ueber den watch-Kanal trennen
                let _ = shutdown_tx.send(true);
            })
            .await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}
