use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub transport: TransportConfig,
    pub audio: AudioConfig,
    pub speech: SpeechConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    pub nats_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Directory for intermediate recording/resample files.
    pub temp_path: String,
    /// ffmpeg executable used for resampling.
    pub ffmpeg_bin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// whisper-cli executable.
    pub whisper_bin: String,
    /// Path to the ggml model file.
    pub model_path: String,
    /// Recognizer thread count.
    pub threads: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the local inference service.
    pub base_url: String,
    /// Model name sent with every chat request.
    pub model: String,
    /// CLI used to bootstrap the service when it is unreachable.
    pub serve_bin: Option<String>,
    /// Conversation cap: at most 2x this many messages are retained.
    pub max_history_pairs: usize,
    pub system_prompt: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "gemma3:1b".to_string(),
            serve_bin: None,
            max_history_pairs: 10,
            system_prompt: "You are a desk-side support assistant. Help the user with \
                their tasks in a friendly and efficient manner. Keep responses concise \
                and to the point. Avoid use of markdown formatting. The user input is \
                done via speech recognition, so may contain errors. Do your best to \
                interpret the user intent and provide a helpful response."
                .to_string(),
        }
    }
}
