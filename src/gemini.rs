//! Client for the Google Generative Language ("Gemini") REST API.
//!
//! One generation request walks an ordered chain of candidate models and
//! exposes the answer as a sequence of text fragments over a channel. The
//! upstream call is either true SSE streaming (fragments forwarded as they
//! arrive) or a plain `generateContent` call whose full text is re-emitted
//! word by word with a short delay for a typing effect.

use std::time::Duration;

use anyhow::{anyhow, Result};
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::session::{ResponseMode, Role};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Candidate models, tried in order. The tail entries are the conservative
/// fallbacks used when the preferred model rejects the request.
pub const CANDIDATE_MODELS: &[&str] = &["gemini-1.5-flash-latest", "gemini-pro"];

const SYSTEM_PERSONA: &str =
    "Eres \"Vistura\", un asistente inmobiliario experto. Responde brevemente y siempre en Español.";

/// Shown when the API answers successfully but without any text content.
pub const NO_ANSWER: &str = "Lo siento, no pude procesar la respuesta.";

const TEMPERATURE: f32 = 0.7;
const THINKING_BUDGET: u32 = 2048;
const TYPING_DELAY: Duration = Duration::from_millis(20);

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("no Gemini API key configured (set GEMINI_API_KEY or the config file)")]
    MissingApiKey,
}

/// One item on the fragment channel. The channel closing without a `Failed`
/// marker means the stream completed normally.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Fragment(String),
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    stream_upstream: bool,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, stream_upstream: bool) -> Self {
        Self {
            client: Client::new(),
            api_key,
            stream_upstream,
        }
    }

    /// Start one generation. Fragments arrive on the returned channel; the
    /// channel closes when the answer is complete. A `Failed` event means
    /// every candidate model was exhausted.
    ///
    /// The history is replayed oldest first, followed by the prompt as the
    /// final user turn.
    pub fn generate(
        &self,
        prompt: &str,
        mode: ResponseMode,
        history: &[(Role, String)],
    ) -> std::result::Result<mpsc::Receiver<StreamEvent>, AssistantError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(AssistantError::MissingApiKey)?;

        let request = GenerateRequest {
            contents: build_contents(history, prompt),
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_PERSONA.to_string(),
                }],
            },
            generation_config: build_generation_config(mode),
        };

        let (tx, rx) = mpsc::channel(32);
        let client = self.client.clone();
        let stream_upstream = self.stream_upstream;

        tokio::spawn(async move {
            run_chain(client, api_key, request, stream_upstream, tx).await;
        });

        Ok(rx)
    }
}

/// Try each candidate model in order until one produces an answer. Only
/// after the whole chain fails does a single `Failed` event reach the UI.
async fn run_chain(
    client: Client,
    api_key: String,
    request: GenerateRequest,
    stream_upstream: bool,
    tx: mpsc::Sender<StreamEvent>,
) {
    for model in CANDIDATE_MODELS {
        info!(model, streaming = stream_upstream, "requesting generation");

        let attempt = if stream_upstream {
            try_stream(&client, &api_key, model, &request, &tx).await
        } else {
            try_paced(&client, &api_key, model, &request, &tx).await
        };

        match attempt {
            Ok(()) => return,
            Err(e) => warn!(model, error = %e, "model attempt failed, trying next candidate"),
        }
    }

    warn!("all candidate models failed");
    let _ = tx.send(StreamEvent::Failed).await;
}

/// Non-streaming call followed by word-paced re-emission of the full text.
async fn try_paced(
    client: &Client,
    api_key: &str,
    model: &str,
    request: &GenerateRequest,
    tx: &mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let url = format!("{}/{}:generateContent?key={}", API_BASE, model, api_key);

    let response = client.post(&url).json(request).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(anyhow!("Gemini API error {}: {}", status, text));
    }

    let body: GenerateResponse = response.json().await?;
    let full_text = extract_text(&body).unwrap_or_else(|| NO_ANSWER.to_string());

    for fragment in word_fragments(&full_text) {
        if tx.send(StreamEvent::Fragment(fragment)).await.is_err() {
            // receiver dropped, the session is gone
            return Ok(());
        }
        tokio::time::sleep(TYPING_DELAY).await;
    }

    Ok(())
}

/// SSE streaming call; upstream chunks are forwarded directly.
///
/// An error before the first fragment fails the attempt so the next
/// candidate can be tried. After a fragment has been forwarded the answer
/// is already on screen, so a mid-stream error just ends the stream with
/// the partial text.
async fn try_stream(
    client: &Client,
    api_key: &str,
    model: &str,
    request: &GenerateRequest,
    tx: &mpsc::Sender<StreamEvent>,
) -> Result<()> {
    let url = format!(
        "{}/{}:streamGenerateContent?alt=sse&key={}",
        API_BASE, model, api_key
    );

    let response = client.post(&url).json(request).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(anyhow!("Gemini API error {}: {}", status, text));
    }

    let mut sent_any = false;
    let mut lines = LineBuffer::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) if sent_any => {
                warn!(model, error = %e, "stream interrupted mid-answer");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        for line in lines.push(&bytes) {
            if let Some(piece) = parse_sse_line(&line) {
                if tx.send(StreamEvent::Fragment(piece)).await.is_err() {
                    return Ok(());
                }
                sent_any = true;
            }
        }
    }

    // The upstream is not obliged to terminate the last event with a newline
    if let Some(line) = lines.flush() {
        if let Some(piece) = parse_sse_line(&line) {
            if tx.send(StreamEvent::Fragment(piece)).await.is_err() {
                return Ok(());
            }
            sent_any = true;
        }
    }

    if !sent_any {
        return Err(anyhow!("model {} returned an empty stream", model));
    }
    Ok(())
}

/// Splits incoming bytes into SSE lines. Network chunks can cut a line
/// anywhere, so partial lines are held until the terminating newline or
/// the end of the stream.
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).trim_end().to_string());
        }
        lines
    }

    /// Whatever remains once the stream ends, without its newline.
    fn flush(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).trim_end().to_string();
        self.buf.clear();
        Some(line)
    }
}

/// History role-mapped onto the wire (`user`/`model`), oldest first, with
/// the new prompt as the final user turn.
fn build_contents(history: &[(Role, String)], prompt: &str) -> Vec<Content> {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|(role, text)| Content {
            role: Some(wire_role(*role).to_string()),
            parts: vec![Part { text: text.clone() }],
        })
        .collect();

    contents.push(Content {
        role: Some("user".to_string()),
        parts: vec![Part {
            text: prompt.to_string(),
        }],
    });

    contents
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

/// Thinking mode only changes request parameters; the control flow around
/// the call is identical for every mode.
fn build_generation_config(mode: ResponseMode) -> GenerationConfig {
    GenerationConfig {
        temperature: TEMPERATURE,
        thinking_config: match mode {
            ResponseMode::Thinking => Some(ThinkingConfig {
                thinking_budget: THINKING_BUDGET,
            }),
            ResponseMode::Fast | ResponseMode::Standard => None,
        },
    }
}

/// Whitespace-delimited words, each carrying its trailing separator, so the
/// concatenation of the emitted fragments reassembles the text.
fn word_fragments(text: &str) -> Vec<String> {
    text.split(' ').map(|word| format!("{} ", word)).collect()
}

/// Extract the text delta from one SSE line, if it carries one.
fn parse_sse_line(line: &str) -> Option<String> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    let chunk: GenerateResponse = serde_json::from_str(data).ok()?;
    extract_text(&chunk)
}

fn extract_text(response: &GenerateResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
