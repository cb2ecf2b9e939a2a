use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use finassist::models::Query;
use finassist::{build_assistant, load_config, server};

#[derive(Parser, Debug)]
#[command(name = "finassist", about = "Multi-agent finance assistant")]
struct Cli {
    /// Path to configuration file (defaults to config/finassist.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web API
    Serve {
        /// Address to bind, overriding the config
        #[arg(long)]
        bind: Option<String>,
    },
    /// Answer a single question
    Ask {
        query: String,

        /// Ingest a document before asking (repeatable)
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,

        /// Voice the answer and write the audio to this file
        #[arg(long)]
        speak: Option<PathBuf>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Transcribe an audio file
    Transcribe { audio: PathBuf },
    /// Voice text and write the audio to a file
    Speak {
        text: String,

        #[arg(short, long)]
        out: PathBuf,

        #[arg(long)]
        voice: Option<String>,
    },
    /// Show which vendors are configured
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let assistant = build_assistant(&config).context("Failed to build assistant")?;

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let shutdown = CancellationToken::new();
            let cancel = shutdown.clone();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Received shutdown signal");
                cancel.cancel();
            });
            server::serve(Arc::new(assistant), &bind, shutdown).await?;
        }
        Command::Ask {
            query,
            docs,
            speak,
            json,
        } => {
            let mut names = Vec::new();
            for path in &docs {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("Failed to read document: {}", path.display()))?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let report = assistant
                    .documents
                    .ingest_bytes(&name, &bytes)
                    .await
                    .with_context(|| format!("Failed to ingest {name}"))?;
                eprintln!("Ingested {} ({} chunks)", report.document, report.chunks);
                names.push(name);
            }

            let mut query = Query::new(query).with_documents(names);
            if speak.is_some() {
                query = query.with_speech(None);
            }
            let response = assistant
                .orchestrator
                .handle(&query)
                .await
                .map_err(|e| anyhow::anyhow!("Query failed: {e}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.text);
            }

            if let Some(out) = speak {
                match (&response.audio, &response.audio_error) {
                    (Some(clip), _) => {
                        std::fs::write(&out, &clip.bytes)
                            .with_context(|| format!("Failed to write audio: {}", out.display()))?;
                        eprintln!("Wrote {} audio to {}", clip.format, out.display());
                    }
                    (None, Some(error)) => eprintln!("Audio unavailable: {error}"),
                    (None, None) => eprintln!("Audio unavailable"),
                }
            }
        }
        Command::Transcribe { audio } => {
            let Some(transcriber) = &assistant.transcriber else {
                bail!(
                    "Speech-to-text is not configured (set {})",
                    config.speech.api_key_env
                );
            };
            let bytes = std::fs::read(&audio)
                .with_context(|| format!("Failed to read audio: {}", audio.display()))?;
            let name = audio
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "audio.wav".to_string());
            let text = transcriber
                .transcribe(&name, bytes)
                .await
                .map_err(|e| anyhow::anyhow!("Transcription failed: {e}"))?;
            println!("{text}");
        }
        Command::Speak { text, out, voice } => {
            let Some(synth) = &assistant.voice else {
                bail!(
                    "Text-to-speech is not configured (set {})",
                    config.tts.api_key_env
                );
            };
            let voice = voice.unwrap_or_else(|| synth.default_voice().to_string());
            let clip = synth
                .synthesize(&text, &voice)
                .await
                .map_err(|e| anyhow::anyhow!("Speech synthesis failed: {e}"))?;
            std::fs::write(&out, &clip.bytes)
                .with_context(|| format!("Failed to write audio: {}", out.display()))?;
            eprintln!("Wrote {} audio to {}", clip.format, out.display());
        }
        Command::Status => {
            let status = assistant.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
