use super::protocol::{ChatRequest, NdjsonParser};
use super::{classify_stream_line, ChatBackend, ChatEvent, ToolSpec};
use crate::conversation::Message;
use crate::error::{AgentError, Result};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// How long a bootstrap attempt may poll before declaring failure.
const BOOTSTRAP_TIMEOUT: Duration = Duration::from_secs(5);
const BOOTSTRAP_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Streaming client for a local Ollama-compatible inference service.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    serve_bin: Option<String>,
}

impl OllamaClient {
    /// `serve_bin` is the CLI used for the one-time service bootstrap after a
    /// `ServiceUnavailable`; without it, bootstrap always reports failure.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, serve_bin: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            serve_bin,
        }
    }

    /// Probe the service's model listing endpoint.
    async fn is_reachable(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        matches!(self.http.get(&url).send().await, Ok(res) if res.status().is_success())
    }
}

#[async_trait::async_trait]
impl ChatBackend for OllamaClient {
    async fn stream_chat(
        &self,
        context: &[Message],
        tools: &[ToolSpec],
        events: mpsc::Sender<ChatEvent>,
    ) -> Result<()> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: context.iter().map(Into::into).collect(),
            stream: true,
            tools: tools.to_vec(),
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AgentError::ServiceUnavailable(format!(
                "chat endpoint returned {}",
                response.status()
            )));
        }

        let mut parser = NdjsonParser::new();
        let mut byte_stream = response.bytes_stream();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(|e| AgentError::ServiceUnavailable(e.to_string()))?;
            for line in parser.push(&chunk) {
                if let Some(event) = classify_stream_line(&line) {
                    if events.send(event).await.is_err() {
                        // Receiver dropped: the turn was cancelled.
                        return Ok(());
                    }
                }
            }
        }

        if let Some(line) = parser.finish() {
            if let Some(event) = classify_stream_line(&line) {
                let _ = events.send(event).await;
            }
        }

        Ok(())
    }

    /// Spawn `ollama serve` detached and poll the service until it answers
    /// or the attempt times out.
    async fn bootstrap(&self) -> bool {
        let Some(serve_bin) = &self.serve_bin else {
            return false;
        };

        info!(serve_bin, "attempting to start inference service");

        let spawned = tokio::process::Command::new(serve_bin)
            .arg("serve")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn();

        if let Err(e) = spawned {
            warn!("failed to spawn inference service: {e}");
            return false;
        }

        let deadline = tokio::time::Instant::now() + BOOTSTRAP_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(BOOTSTRAP_POLL_INTERVAL).await;
            if self.is_reachable().await {
                info!("inference service is up");
                return true;
            }
        }

        warn!("inference service did not come up in time");
        false
    }
}
