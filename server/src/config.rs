//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Der Engine-API-Key kann zusaetzlich ueber die
//! Umgebungsvariable `GEMINI_API_KEY` gesetzt werden (hat Vorrang).

use babelcall_engine::SyntheseKonfig;
use babelcall_pipeline::STANDARD_QUEUE_TIEFE;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Engine-Einstellungen (API-Key, Synthese-Stimme)
    pub engine: EngineEinstellungen,
    /// Pipeline-Einstellungen
    pub pipeline: PipelineEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen
    pub max_clients: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Babelcall Server".into(),
            max_clients: 512,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub bind_adresse: String,
    /// Port fuer HTTP und WebSocket
    pub port: u16,
    /// Erlaubte CORS-Origins (leer = alle erlaubt, nur fuer Entwicklung)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec![],
        }
    }
}

/// Engine-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineEinstellungen {
    /// API-Key fuer Gemini/TTS (leer = nur via Umgebungsvariable)
    pub api_key: String,
    /// Sprachcode der Synthese-Stimme
    pub sprach_code: String,
    /// SSML-Geschlecht der Synthese-Stimme
    pub stimmgeschlecht: String,
    /// Audio-Codec der Synthese-Ausgabe
    pub audio_codierung: String,
}

impl Default for EngineEinstellungen {
    fn default() -> Self {
        let synthese = SyntheseKonfig::default();
        Self {
            api_key: String::new(),
            sprach_code: synthese.sprach_code,
            stimmgeschlecht: synthese.stimmgeschlecht,
            audio_codierung: synthese.audio_codierung,
        }
    }
}

/// Pipeline-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineEinstellungen {
    /// Tiefe der Chunk-Queue pro Sprecher (darueber wird verworfen)
    pub queue_tiefe: usize,
}

impl Default for PipelineEinstellungen {
    fn default() -> Self {
        Self {
            queue_tiefe: STANDARD_QUEUE_TIEFE,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer HTTP/WebSocket zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Ermittelt den Engine-API-Key (Umgebungsvariable vor Konfigurationsdatei)
    pub fn engine_api_key(&self) -> String {
        std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| self.engine.api_key.clone())
    }

    /// Baut die Synthese-Konfiguration fuer die Engine
    pub fn synthese_konfig(&self) -> SyntheseKonfig {
        SyntheseKonfig {
            sprach_code: self.engine.sprach_code.clone(),
            stimmgeschlecht: self.engine.stimmgeschlecht.clone(),
            audio_codierung: self.engine.audio_codierung.clone(),
        }
    }
}
