//! Ollama gateway adapter.
//!
//! Streams completions from a local Ollama server's `/api/generate`
//! endpoint. The response is newline-delimited JSON; each line carries a
//! `response` fragment and the last line has `done: true`. Fragments are
//! forwarded as [`StreamEvent::Delta`]s and the accumulated text is sent
//! as the terminal [`StreamEvent::Completed`].

use super::StartupNotice;
use async_trait::async_trait;
use futures::StreamExt;
use maestro_application::ports::chat_gateway::{ChatGateway, GatewayError, StreamHandle};
use maestro_domain::StreamEvent;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const SETUP_HINT: &str =
    "Could not reach the model server. Ollama must be installed and running locally \
     (https://ollama.com); start it with `ollama serve`.";

/// One NDJSON line of a streaming `/api/generate` response.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Chat gateway backed by a local Ollama server.
pub struct OllamaGateway {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    notice: Arc<StartupNotice>,
}

impl OllamaGateway {
    /// Create a gateway for `endpoint` (e.g. `http://localhost:11434`).
    ///
    /// The `notice` object scopes the "Ollama must be running" hint:
    /// it is emitted at most once per notice instance.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        notice: Arc<StartupNotice>,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            endpoint: endpoint.into(),
            model: model.into(),
            notice,
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatGateway for OllamaGateway {
    async fn chat(&self, prompt: &str) -> Result<StreamHandle, GatewayError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": true,
        });

        debug!("POST {} (model {})", self.generate_url(), self.model);
        let response = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    self.notice.note_once(SETUP_HINT);
                    GatewayError::ConnectionError(e.to_string())
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::RequestFailed(format!(
                "{}: {}",
                status,
                detail.trim()
            )));
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut pending: Vec<u8> = Vec::new();
            let mut full_text = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                pending.extend_from_slice(&bytes);

                while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    match serde_json::from_slice::<GenerateChunk>(&line) {
                        Ok(parsed) => {
                            if let Some(error) = parsed.error {
                                let _ = tx.send(StreamEvent::Error(error)).await;
                                return;
                            }
                            if let Some(text) = parsed.response
                                && !text.is_empty()
                            {
                                full_text.push_str(&text);
                                if tx.send(StreamEvent::Delta(text)).await.is_err() {
                                    // Receiver dropped; stop reading.
                                    return;
                                }
                            }
                            if parsed.done {
                                let _ = tx.send(StreamEvent::Completed(full_text)).await;
                                return;
                            }
                        }
                        Err(_) => {
                            // Blank keep-alive lines are expected; skip them.
                            if !line.iter().all(u8::is_ascii_whitespace) {
                                let _ = tx
                                    .send(StreamEvent::Error(
                                        "received malformed stream line".to_string(),
                                    ))
                                    .await;
                                return;
                            }
                        }
                    }
                }
            }

            // Stream ended without a done marker; hand over what arrived.
            let _ = tx.send(StreamEvent::Completed(full_text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}
