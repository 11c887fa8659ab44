//! Gemini-Anbindung – Transkription, Uebersetzung und Sprachsynthese
//!
//! Transkription und Uebersetzung laufen ueber den `generateContent`-
//! Endpunkt der Gemini-API (Modell pro Aufruf waehlbar), die Synthese
//! ueber einen Cloud-TTS-Endpunkt. Der API-Key wird als Query-Parameter
//! mitgegeben; ein leerer Key fuehrt zu einem Konfigurationsfehler noch
//! vor dem Netzwerkaufruf.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::TranslationEngine;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Basis-URL der Gemini-Modelle
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Cloud-TTS-Endpunkt fuer die Sprachsynthese
const TTS_API_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// MIME-Typ der eingereichten Audio-Chunks
const AUDIO_MIME_TYP: &str = "audio/wav";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const ANFRAGE_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Synthese-Konfiguration
// ---------------------------------------------------------------------------

/// Stimm- und Kodierungs-Konfiguration fuer die Sprachsynthese
///
/// Feste Standardwerte, ueber die Server-Konfiguration ueberschreibbar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheseKonfig {
    /// Sprachcode der synthetisierten Stimme
    pub sprach_code: String,
    /// SSML-Geschlecht der Stimme
    pub stimmgeschlecht: String,
    /// Audio-Codec der Ausgabe
    pub audio_codierung: String,
}

impl Default for SyntheseKonfig {
    fn default() -> Self {
        Self {
            sprach_code: "en-US".to_string(),
            stimmgeschlecht: "NEUTRAL".to_string(),
            audio_codierung: "MP3".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// GeminiEngine
// ---------------------------------------------------------------------------

/// Produktiv-Implementierung von [`TranslationEngine`]
///
/// Haelt nur den HTTP-Client und unveraenderliche Konfiguration – saemtliche
/// verbindungsspezifischen Parameter (Modelle, Zielsprache) kommen pro
/// Aufruf herein.
pub struct GeminiEngine {
    client: Client,
    api_key: String,
    synthese: SyntheseKonfig,
}

impl GeminiEngine {
    /// Erstellt eine neue GeminiEngine
    pub fn neu(api_key: impl Into<String>, synthese: SyntheseKonfig) -> EngineResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(ANFRAGE_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            synthese,
        })
    }

    /// Sendet eine JSON-Anfrage und dekodiert die JSON-Antwort
    async fn anfrage_senden<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &impl Serialize,
    ) -> EngineResult<T> {
        if self.api_key.is_empty() {
            return Err(EngineError::Konfiguration(
                "kein API-Key konfiguriert".to_string(),
            ));
        }

        let antwort = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = antwort.status();
        if !status.is_success() {
            let meldung = antwort.text().await.unwrap_or_default();
            return Err(EngineError::Api {
                status: status.as_u16(),
                meldung,
            });
        }

        Ok(antwort.json::<T>().await?)
    }

    /// Ruft `generateContent` fuer das gegebene Modell auf und extrahiert
    /// den Text des ersten Kandidaten
    async fn generieren(&self, modell: &str, teile: Vec<Teil>) -> EngineResult<String> {
        let url = format!("{GEMINI_API_URL}/{modell}:generateContent");
        let anfrage = GenerateContentAnfrage {
            contents: vec![Inhalt { parts: teile }],
        };

        let antwort: GenerateContentAntwort = self.anfrage_senden(&url, &anfrage).await?;
        antwort_text(antwort)
    }
}

#[async_trait]
impl TranslationEngine for GeminiEngine {
    async fn transkribieren(&self, audio: &[u8], modell: &str) -> EngineResult<String> {
        tracing::debug!(modell, bytes = audio.len(), "Transkription angefragt");

        let teile = vec![
            Teil::text(TRANSKRIPTIONS_PROMPT),
            Teil::audio(AUDIO_MIME_TYP, STANDARD.encode(audio)),
        ];
        let text = self.generieren(modell, teile).await?;

        tracing::debug!(zeichen = text.len(), "Transkription erhalten");
        Ok(text)
    }

    async fn uebersetzen(
        &self,
        text: &str,
        ziel_sprache: &str,
        modell: &str,
    ) -> EngineResult<String> {
        tracing::debug!(modell, ziel_sprache, "Uebersetzung angefragt");

        let prompt = uebersetzungs_prompt(text, ziel_sprache);
        let uebersetzt = self.generieren(modell, vec![Teil::text(prompt)]).await?;

        tracing::debug!(zeichen = uebersetzt.len(), "Uebersetzung erhalten");
        Ok(uebersetzt)
    }

    async fn synthetisieren(&self, text: &str) -> EngineResult<Vec<u8>> {
        tracing::debug!(zeichen = text.len(), "Sprachsynthese angefragt");

        let anfrage = SyntheseAnfrage {
            input: SyntheseText { text },
            voice: SyntheseStimme {
                language_code: &self.synthese.sprach_code,
                ssml_gender: &self.synthese.stimmgeschlecht,
            },
            audio_config: SyntheseAudio {
                audio_encoding: &self.synthese.audio_codierung,
            },
        };

        let antwort: SyntheseAntwort = self.anfrage_senden(TTS_API_URL, &anfrage).await?;
        let kodiert = antwort.audio_content.ok_or_else(|| {
            EngineError::ungueltige_antwort("Synthese-Antwort ohne audioContent")
        })?;

        let audio = STANDARD
            .decode(kodiert.as_bytes())
            .map_err(|e| EngineError::ungueltige_antwort(format!("audioContent: {e}")))?;

        tracing::debug!(bytes = audio.len(), "Sprachsynthese abgeschlossen");
        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

const TRANSKRIPTIONS_PROMPT: &str = "Transcribe the following audio:";

/// Baut den Uebersetzungs-Prompt fuer die Zielsprache
fn uebersetzungs_prompt(text: &str, ziel_sprache: &str) -> String {
    format!("Translate the following text to {ziel_sprache}: {text}")
}

// ---------------------------------------------------------------------------
// Wire-Strukturen (generateContent)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateContentAnfrage {
    contents: Vec<Inhalt>,
}

#[derive(Debug, Serialize)]
struct Inhalt {
    parts: Vec<Teil>,
}

/// Ein Prompt-Teil: entweder Text oder eingebettete Audiodaten
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Teil {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineDaten>,
}

impl Teil {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn audio(mime_typ: &str, base64_daten: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineDaten {
                mime_type: mime_typ.to_string(),
                data: base64_daten,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDaten {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentAntwort {
    #[serde(default)]
    candidates: Vec<Kandidat>,
}

#[derive(Debug, Deserialize)]
struct Kandidat {
    content: KandidatInhalt,
}

#[derive(Debug, Deserialize)]
struct KandidatInhalt {
    #[serde(default)]
    parts: Vec<TextTeil>,
}

#[derive(Debug, Deserialize)]
struct TextTeil {
    #[serde(default)]
    text: String,
}

/// Extrahiert den zusammengesetzten Text des ersten Kandidaten
fn antwort_text(antwort: GenerateContentAntwort) -> EngineResult<String> {
    let kandidat = antwort
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::ungueltige_antwort("Antwort ohne Kandidaten"))?;

    let text: String = kandidat
        .content
        .parts
        .into_iter()
        .map(|teil| teil.text)
        .collect();

    Ok(text.trim().to_string())
}

// ---------------------------------------------------------------------------
// Wire-Strukturen (Synthese)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyntheseAnfrage<'a> {
    input: SyntheseText<'a>,
    voice: SyntheseStimme<'a>,
    audio_config: SyntheseAudio<'a>,
}

#[derive(Debug, Serialize)]
struct SyntheseText<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyntheseStimme<'a> {
    language_code: &'a str,
    ssml_gender: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SyntheseAudio<'a> {
    audio_encoding: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyntheseAntwort {
    audio_content: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
