use super::messages::{AudioFrameMessage, ControlAction, ControlMessage};
use crate::assistant::Assistant;
use crate::conversation::Message;
use crate::dispatch::{Dispatcher, EventKind, EventMessage};
use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};

const FRAME_SUBJECT: &str = "voice.audio.frame";
const CONTROL_SUBJECT: &str = "voice.control";

/// NATS connection handling the inbound side of the transport.
pub struct NatsTransport {
    client: Client,
}

impl NatsTransport {
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    pub fn dispatcher(&self) -> NatsDispatcher {
        NatsDispatcher {
            client: self.client.clone(),
        }
    }

    /// Consume audio frames, feeding them to the assistant in subscription
    /// order so per-client frame ordering is preserved.
    pub async fn run_frame_loop(&self, assistant: Arc<Assistant>) -> Result<()> {
        let mut sub = self
            .client
            .subscribe(FRAME_SUBJECT)
            .await
            .context("Failed to subscribe to audio frames")?;

        info!("Subscribed to {}", FRAME_SUBJECT);

        while let Some(msg) = sub.next().await {
            let frame: AudioFrameMessage = match serde_json::from_slice(&msg.payload) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Failed to parse audio frame message: {}", e);
                    continue;
                }
            };

            let bytes = match base64::engine::general_purpose::STANDARD.decode(&frame.data) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(client_id = %frame.client_id, "Failed to decode frame payload: {}", e);
                    continue;
                }
            };

            assistant.handle_frame(&frame.client_id, &bytes).await;
        }

        Ok(())
    }

    /// Consume control signals. Turn processing is spawned per signal so a
    /// slow turn for one client never blocks the others.
    pub async fn run_control_loop(&self, assistant: Arc<Assistant>) -> Result<()> {
        let mut sub = self
            .client
            .subscribe(CONTROL_SUBJECT)
            .await
            .context("Failed to subscribe to control signals")?;

        info!("Subscribed to {}", CONTROL_SUBJECT);

        while let Some(msg) = sub.next().await {
            let control: ControlMessage = match serde_json::from_slice(&msg.payload) {
                Ok(control) => control,
                Err(e) => {
                    warn!("Failed to parse control message: {}", e);
                    continue;
                }
            };

            let assistant = Arc::clone(&assistant);
            tokio::spawn(async move {
                handle_control(assistant, control).await;
            });
        }

        Ok(())
    }
}

async fn handle_control(assistant: Arc<Assistant>, control: ControlMessage) {
    let client_id = control.client_id;
    match control.action {
        ControlAction::Start => {
            info!(client_id, "client ready to record");
        }
        ControlAction::End => assistant.end_turn(&client_id).await,
        ControlAction::Clear => assistant.clear_history(&client_id).await,
        ControlAction::Delete { message_id } => {
            assistant.delete_from(&client_id, &message_id).await;
        }
        ControlAction::FetchHistory => {
            for message in assistant.history(&client_id).await {
                assistant
                    .dispatcher()
                    .send_message(&client_id, &message.id, &message)
                    .await;
            }
        }
        ControlAction::Disconnect => assistant.cancel(&client_id).await,
    }
}

/// Publishes dispatcher events to the per-client event subject.
#[derive(Clone)]
pub struct NatsDispatcher {
    client: Client,
}

impl NatsDispatcher {
    fn subject(client_id: &str) -> String {
        format!("voice.events.{client_id}")
    }

    async fn publish(&self, event: EventMessage) {
        let subject = Self::subject(&event.client_id);
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize event: {}", e);
                return;
            }
        };

        if let Err(e) = self.client.publish(subject, payload.into()).await {
            error!("Failed to publish event: {}", e);
        }
    }
}

#[async_trait::async_trait]
impl Dispatcher for NatsDispatcher {
    async fn send_status(&self, client_id: &str, status: &str) {
        let mut event = EventMessage::new(client_id, EventKind::Status);
        event.text = Some(status.to_string());
        self.publish(event).await;
    }

    async fn send_token(&self, client_id: &str, message_id: &str, token: &str) {
        let mut event = EventMessage::new(client_id, EventKind::Token);
        event.message_id = Some(message_id.to_string());
        event.text = Some(token.to_string());
        self.publish(event).await;
    }

    async fn send_message(&self, client_id: &str, message_id: &str, message: &Message) {
        let mut event = EventMessage::new(client_id, EventKind::Message);
        event.message_id = Some(message_id.to_string());
        event.message = Some(message.clone());
        self.publish(event).await;
    }

    async fn send_error(&self, client_id: &str, message: &str, detail: Option<String>) {
        let mut event = EventMessage::new(client_id, EventKind::Error);
        event.text = Some(message.to_string());
        event.detail = detail;
        self.publish(event).await;
    }
}
