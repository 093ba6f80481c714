//! The streaming tool-calling loop for one conversation turn.

use super::{Assistant, MAX_TOOL_ITERATIONS};
use crate::error::{AgentError, Result};
use crate::llm::{ChatEvent, ToolCall, ToolSpec};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What one inference stream produced: the accumulated draft text and any
/// structured tool calls received alongside it.
struct StreamOutcome {
    draft: String,
    tool_calls: Option<Vec<ToolCall>>,
}

impl Assistant {
    /// Drive one turn: append the user message, then alternate between
    /// streaming a response and executing requested tools until the model
    /// stops asking for tools or the iteration bound is hit.
    pub(super) async fn run_turn(
        &self,
        client_id: &str,
        transcript: &str,
        cancel: &Arc<AtomicBool>,
    ) -> Result<()> {
        let user_message = self.conversations.append_user(client_id, transcript).await;
        self.dispatcher
            .send_message(client_id, &user_message.id, &user_message)
            .await;

        // Establish the turn's message id before any tokens flow so the
        // client can attach them to the right bubble.
        let turn_message_id = uuid::Uuid::new_v4().to_string();
        let draft_message = crate::conversation::Message {
            id: turn_message_id.clone(),
            role: crate::conversation::Role::Assistant,
            text: String::new(),
            timestamp: chrono::Utc::now(),
        };
        self.dispatcher
            .send_message(client_id, &turn_message_id, &draft_message)
            .await;

        self.dispatcher
            .send_status(
                client_id,
                &format!("Processing message using {}", self.config.model_label),
            )
            .await;

        let tools = self.tools.specs();
        let mut bootstrap_spent = false;
        let mut iterations = 0;

        let draft = loop {
            if cancel.load(Ordering::SeqCst) {
                info!(client_id, "turn cancelled, discarding draft");
                return Ok(());
            }
            iterations += 1;

            let outcome = self
                .stream_once(client_id, &turn_message_id, &tools, &mut bootstrap_spent)
                .await?;
            let draft = outcome.draft;

            // Structured calls from the stream win; otherwise fall back to
            // scanning the draft for an embedded tool_calls block.
            let calls = outcome
                .tool_calls
                .or_else(|| crate::tools::scan_tool_calls(&draft));

            let Some(calls) = calls else {
                debug!(client_id, "no tool calls detected");
                break draft;
            };

            let names: Vec<&str> = calls.iter().map(|c| c.name.as_str()).collect();
            self.dispatcher
                .send_status(client_id, &format!("Calling tools: {}", names.join(", ")))
                .await;

            let results = self.tools.execute(&calls);
            if results.is_empty() {
                // Fatal for the turn: detected calls that produced nothing.
                return Err(AgentError::ToolExecutionFailed(
                    "no valid tool result returned".to_string(),
                ));
            }

            for result in &results {
                self.conversations
                    .append_tool(
                        client_id,
                        format!(
                            "{} was already called with result: {}",
                            result.name, result.result
                        ),
                    )
                    .await;
            }

            if iterations >= MAX_TOOL_ITERATIONS {
                info!(client_id, iterations, "tool iteration bound reached");
                break draft;
            }
            // The draft from this round was a tool-invocation preamble; it
            // is discarded, not shown as the final answer.
        };

        let final_text = crate::tools::strip_tool_call_json(&draft);
        let assistant_message = self
            .conversations
            .append_assistant(client_id, final_text)
            .await;
        self.dispatcher
            .send_message(client_id, &turn_message_id, &assistant_message)
            .await;

        info!(client_id, iterations, "turn complete");
        Ok(())
    }

    /// Run one streaming inference call, forwarding cleaned tokens as they
    /// arrive. On `ServiceUnavailable` a single bootstrap-and-retry is
    /// attempted per turn.
    async fn stream_once(
        &self,
        client_id: &str,
        turn_message_id: &str,
        tools: &[ToolSpec],
        bootstrap_spent: &mut bool,
    ) -> Result<StreamOutcome> {
        loop {
            match self.stream_attempt(client_id, turn_message_id, tools).await {
                Ok(outcome) => return Ok(outcome),
                Err(AgentError::ServiceUnavailable(detail)) if !*bootstrap_spent => {
                    *bootstrap_spent = true;
                    info!(client_id, "inference service unreachable, attempting bootstrap");
                    if !self.chat.bootstrap().await {
                        return Err(AgentError::ServiceUnavailable(detail));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn stream_attempt(
        &self,
        client_id: &str,
        turn_message_id: &str,
        tools: &[ToolSpec],
    ) -> Result<StreamOutcome> {
        let context = self.conversations.build_context(client_id).await;

        let (tx, mut rx) = mpsc::channel::<ChatEvent>(64);
        let chat = Arc::clone(&self.chat);
        let tools_for_stream = tools.to_vec();
        let stream_task = tokio::spawn(async move {
            chat.stream_chat(&context, &tools_for_stream, tx).await
        });

        let mut draft = String::new();
        let mut tool_calls: Option<Vec<ToolCall>> = None;
        let mut tokens_received = 0usize;

        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Token(token) => {
                    draft.push_str(&token);
                    tokens_received += 1;

                    let cleaned = crate::tools::strip_tool_call_json(&token);
                    if !cleaned.is_empty() {
                        self.dispatcher
                            .send_token(client_id, turn_message_id, &cleaned)
                            .await;
                    }

                    if tokens_received % 5 == 0 {
                        self.dispatcher
                            .send_status(
                                client_id,
                                &format!("Receiving response... {tokens_received} chunks"),
                            )
                            .await;
                    }
                }
                ChatEvent::ToolCalls(calls) => {
                    tool_calls = Some(calls);
                }
            }
        }

        stream_task
            .await
            .map_err(|e| AgentError::ServiceUnavailable(format!("stream task failed: {e}")))??;

        debug!(client_id, tokens_received, "stream closed");
        Ok(StreamOutcome { draft, tool_calls })
    }
}
