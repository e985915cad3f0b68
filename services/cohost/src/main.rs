use anyhow::{Context, Result};
use clap::Parser;
use cohost_core::context::{ConversationContext, ShowContext};
use cohost_core::embedding::{
    EmbeddingClientConfig, EmbeddingProvider, HashingEmbedder, OpenAiEmbedder,
};
use cohost_core::intent::IntentConfig;
use cohost_core::segment::TranscriptSegment;
use cohost_core::session::CohostSession;
use cohost_core::{Decision, SessionInput, now_ms};
use cohost_service::config::Config;
use cohost_service::transcript_loader;
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Decides when a live co-host should speak up, and why")]
struct Cli {
    /// JSON-lines transcript to replay. Plain text lines are read from stdin when omitted.
    #[arg(long)]
    transcript: Option<PathBuf>,
    /// Topic of the current show segment
    #[arg(long)]
    segment_topic: Option<String>,
    /// Topic of the whole episode
    #[arg(long)]
    episode_topic: Option<String>,
    /// Replay without waiting out the gaps between segments
    #[arg(long)]
    fast: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting cohost service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 4. Embeddings ---
    let provider: Arc<dyn EmbeddingProvider> = match &config.openai_api_key {
        Some(key) => {
            tracing::info!("Using OpenAI embeddings ({})", config.embedding_model);
            Arc::new(OpenAiEmbedder::new(
                EmbeddingClientConfig::builder()
                    .with_api_key(key.expose_secret())
                    .with_model(&config.embedding_model)
                    .build(),
            ))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, falling back to local hashing embeddings");
            Arc::new(HashingEmbedder::default())
        }
    };

    // --- 5. Session Setup ---
    let show = (args.segment_topic.is_some() || args.episode_topic.is_some()).then(|| ShowContext {
        episode_topic: args.episode_topic.clone(),
        segment_topic: args.segment_topic.clone(),
        is_live: args.transcript.is_none(),
    });
    let (context_tx, context_rx) = watch::channel(ConversationContext {
        show,
        ..Default::default()
    });

    let session = CohostSession::new(&config.timing, IntentConfig::default(), provider, context_rx)
        .context("Invalid timing configuration")?;

    let (input_tx, input_rx) = mpsc::channel::<SessionInput>(32);
    let (decision_tx, mut decision_rx) = mpsc::channel::<Decision>(32);

    let session_handle = tokio::spawn(session.run(input_rx, decision_tx));

    // The sink stands in for the co-host: it logs every decision and records a
    // conversational turn whenever the co-host would have spoken.
    let sink = tokio::spawn(async move {
        while let Some(decision) = decision_rx.recv().await {
            log_decision(&decision);
            if decision.opportunity.is_interrupt_now() {
                context_tx.send_modify(|ctx| {
                    ctx.has_recent_context = true;
                    ctx.last_timestamp = Some(now_ms());
                    ctx.turn_count = Some(ctx.turn_count.unwrap_or(0) + 1);
                    ctx.recent_messages.push(decision.opportunity.reasoning.clone());
                });
            }
        }
    });

    // --- 6. Feed Transcript ---
    let feed = async {
        match &args.transcript {
            Some(path) => replay(path, args.fast, &input_tx).await,
            None => read_stdin(&input_tx).await,
        }
    };

    tokio::select! {
        result = feed => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
        }
    }

    if input_tx.send(SessionInput::Stop).await.is_err() {
        tracing::warn!("Session already stopped");
    }
    session_handle
        .await
        .context("Session task panicked")?
        .context("Session ended with an error")?;
    sink.await.context("Decision sink panicked")?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Sends recorded segments at their original pace, restamped to the wall clock
/// so polled silence lines up with them.
async fn replay(path: &Path, fast: bool, input_tx: &mpsc::Sender<SessionInput>) -> Result<()> {
    let segments = transcript_loader::load_segments(path).context("Failed to load transcript")?;
    tracing::info!("Replaying {} segments from {}", segments.len(), path.display());

    let mut previous: Option<u64> = None;
    for segment in segments {
        if let Some(previous) = previous.filter(|_| !fast) {
            let gap = segment.timestamp.saturating_sub(previous);
            tokio::time::sleep(Duration::from_millis(gap)).await;
        }
        previous = Some(segment.timestamp);

        let segment = TranscriptSegment {
            timestamp: now_ms(),
            ..segment
        };
        input_tx
            .send(SessionInput::Segment(segment))
            .await
            .context("Session stopped accepting segments")?;
    }
    Ok(())
}

async fn read_stdin(input_tx: &mpsc::Sender<SessionInput>) -> Result<()> {
    tracing::info!("Reading transcript lines from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        input_tx
            .send(SessionInput::Segment(TranscriptSegment::new(line, now_ms())))
            .await
            .context("Session stopped accepting segments")?;
    }
    Ok(())
}

fn log_decision(decision: &Decision) {
    let opportunity = &decision.opportunity;
    match &decision.intent {
        Some(intent) => tracing::info!(
            recommendation = ?opportunity.recommendation,
            score = opportunity.score,
            intent = ?intent.kind,
            confidence = intent.confidence,
            "{}",
            opportunity.reasoning
        ),
        None => tracing::info!(
            recommendation = ?opportunity.recommendation,
            score = opportunity.score,
            "{}",
            opportunity.reasoning
        ),
    }

    match serde_json::to_string(decision) {
        Ok(json) => tracing::debug!("Decision: {}", json),
        Err(e) => tracing::warn!("Failed to serialize decision: {:?}", e),
    }
}
