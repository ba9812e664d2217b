use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tranquility::{
    create_router, detect_mood, load_audio_or_placeholder, AppState, Config, ConversationSession,
    GeminiClient, ModelService, SessionOutcome,
};

#[derive(Debug, Parser)]
#[command(name = "tranquility", version, about = "Emotional analysis of voice clips with Gemini")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/tranquility")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze an audio clip: voice tone first, then an emotional outline
    Analyze {
        /// Path to an MP3/WAV/FLAC clip
        audio: PathBuf,
    },
    /// Reply to a message and report the detected mood
    Chat {
        message: String,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries only model output
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Tranquility v{}", env!("CARGO_PKG_VERSION"));
    info!("Model: {} ({:?} backend)", cfg.model.name, cfg.model.backend);

    let service: Arc<dyn ModelService> = Arc::new(
        GeminiClient::new(&cfg.model).context("Failed to create model service client")?,
    );

    match cli.command {
        Command::Analyze { audio } => analyze(service, &cfg, audio).await,
        Command::Chat { message } => {
            let reply = detect_mood(service.as_ref(), &cfg.model.name, &message).await;
            println!("{}", reply.text);
            println!("mood: {} (intensity {}/10)", reply.mood, reply.rage_meter);
            Ok(())
        }
        Command::Serve { bind, port } => {
            let bind = bind.unwrap_or_else(|| cfg.http.bind.clone());
            let port = port.unwrap_or(cfg.http.port);
            serve(service, &cfg, &bind, port).await
        }
    }
}

async fn analyze(service: Arc<dyn ModelService>, cfg: &Config, path: PathBuf) -> Result<()> {
    let mut loaded = load_audio_or_placeholder(&path)?;
    if loaded.is_placeholder() {
        warn!("Analyzing placeholder audio instead of {}", path.display());
    }
    if let Some(mime_type) = &cfg.session.audio_mime_type {
        loaded.override_mime_type(mime_type);
    }

    let mut session = ConversationSession::new(service, cfg.model.name.clone(), cfg.session.prompts());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = session
        .run(loaded.clip(), &mut out)
        .await
        .context("Failed to write session output")?;

    match outcome {
        SessionOutcome::Completed { .. } => info!("Analysis complete"),
        SessionOutcome::AnalysisFailed { .. } => warn!("Session aborted after voice analysis failure"),
        SessionOutcome::OutlineFailed { .. } => warn!("Session finished without an emotional outline"),
    }

    Ok(())
}

async fn serve(service: Arc<dyn ModelService>, cfg: &Config, bind: &str, port: u16) -> Result<()> {
    let state = AppState::new(service, cfg);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((bind, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind, port))?;

    info!("HTTP API listening on http://{}:{}", bind, port);
    info!("Endpoints: GET /, GET /health, POST /api/chat, POST /api/analyze");

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
