use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use voice_agent::assistant::{Assistant, AssistantConfig};
use voice_agent::llm::OllamaClient;
use voice_agent::nats::NatsTransport;
use voice_agent::{create_router, AppState, Config};

#[derive(Parser)]
#[command(name = "voice-agent", about = "Speech-driven assistant backend")]
struct Args {
    /// Config file (without extension)
    #[arg(long, default_value = "config/voice-agent")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} starting", cfg.service.name);
    info!("Inference service: {} ({})", cfg.llm.base_url, cfg.llm.model);
    info!("NATS transport: {}", cfg.transport.nats_url);

    let transport = NatsTransport::connect(&cfg.transport.nats_url).await?;
    let dispatcher = Arc::new(transport.dispatcher());

    let chat = Arc::new(OllamaClient::new(
        cfg.llm.base_url.clone(),
        cfg.llm.model.clone(),
        cfg.llm.serve_bin.clone(),
    ));

    let assistant = Arc::new(Assistant::new(
        AssistantConfig::from_config(&cfg),
        chat,
        dispatcher,
    ));

    // HTTP status surface
    let state = AppState::new(Arc::clone(&assistant));
    let router = create_router(state);
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
    info!("HTTP server listening on {}", addr);

    let http_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    // Transport loops: frames are ingested in order, control signals spawn
    // per-turn tasks.
    let frame_assistant = Arc::clone(&assistant);
    let control_assistant = Arc::clone(&assistant);

    tokio::select! {
        result = transport.run_frame_loop(frame_assistant) => {
            result.context("Frame subscription ended")?;
        }
        result = transport.run_control_loop(control_assistant) => {
            result.context("Control subscription ended")?;
        }
        _ = http_task => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
