use crate::llm::{ToolCall, ToolFunction, ToolParameters, ToolProperty, ToolResult, ToolSpec};
use chrono::Local;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};

/// Fixed registry of locally executed tools.
///
/// Execution is synchronous and per-call independent: an unknown tool name
/// produces an "Unknown tool" result instead of failing the whole batch.
pub struct ToolRegistry {
    // In-memory store backing the rememberFact tool.
    memories: Mutex<Vec<String>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            memories: Mutex::new(Vec::new()),
        }
    }

    /// Function specs advertised to the inference service with every request.
    pub fn specs(&self) -> Vec<ToolSpec> {
        vec![
            function_spec("getTime", "Get the current local time.", &[]),
            function_spec(
                "rememberFact",
                "Store a fact in long-term memory. This can be called any time when \
                 calling other tools to remember important information.",
                &[("fact", "The fact to remember")],
            ),
            function_spec("flipCoin", "Flip a coin and return heads or tails.", &[]),
        ]
    }

    /// Execute a batch of tool calls in request order.
    pub fn execute(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        calls.iter().map(|call| self.execute_one(call)).collect()
    }

    fn execute_one(&self, call: &ToolCall) -> ToolResult {
        info!(tool = %call.name, "executing tool");

        let result = match call.name.as_str() {
            "getTime" => Local::now().format("%-I:%M:%S %p").to_string(),
            "rememberFact" => {
                let fact = call
                    .arguments
                    .get("fact")
                    .cloned()
                    .unwrap_or_else(|| "No fact provided".to_string());
                let mut memories = self.memories.lock().unwrap_or_else(|e| e.into_inner());
                memories.push(fact);
                format!("Memories: {}", memories.join(", "))
            }
            "flipCoin" => {
                let heads = rand::thread_rng().gen_bool(0.5);
                format!(
                    "The coin landed on: {}",
                    if heads { "Heads" } else { "Tails" }
                )
            }
            other => {
                warn!(tool = other, "unknown tool requested");
                format!("Unknown tool: {other}")
            }
        };

        ToolResult {
            name: call.name.clone(),
            result,
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn function_spec(name: &str, description: &str, args: &[(&str, &str)]) -> ToolSpec {
    let properties: HashMap<String, ToolProperty> = args
        .iter()
        .map(|(arg, desc)| {
            (
                arg.to_string(),
                ToolProperty {
                    kind: "string".to_string(),
                    description: desc.to_string(),
                },
            )
        })
        .collect();

    ToolSpec {
        kind: "function".to_string(),
        function: ToolFunction {
            name: name.to_string(),
            description: description.to_string(),
            parameters: ToolParameters {
                kind: "object".to_string(),
                properties,
                required: args.iter().map(|(arg, _)| arg.to_string()).collect(),
            },
        },
    }
}
