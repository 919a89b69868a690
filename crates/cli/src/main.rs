mod cli;
mod commands;
mod terminal;
mod upload;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use docchat_core::config::{load_dotenv, Config};
use docchat_core::{ChatRequest, Conversation};
use docchat_ingest::{create_embedder, ChunkConfig, DocumentProcessor};
use docchat_monitor::{Monitor, SummaryGuard};
use docchat_pipeline::{ChatPipeline, RetrievalPipeline};

use crate::cli::CliArgs;
use crate::commands::Command;
use crate::terminal::{Input, Terminal};
use crate::upload::{clean_path, copy_to_uploads};

/// How the session ended up with (or without) a document.
enum Selection {
    Document(PathBuf),
    NoDocument,
    Interrupted,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    load_dotenv();
    let args = CliArgs::parse();

    let mut config = Config::from_env();
    args.apply(&mut config);

    init_logging(&config.paths.log_dir)?;
    config.log_summary();
    config.validate().context("invalid configuration")?;

    let embedder = create_embedder(&config.embedding).context("failed to create embedder")?;
    let chunking = ChunkConfig::new(config.retrieval.chunk_size, config.retrieval.chunk_overlap)?;
    let processor = DocumentProcessor::new(embedder, chunking)
        .with_batch_size(config.retrieval.embed_batch_size);
    let pipeline = RetrievalPipeline::from_config(processor, &config.llm, config.retrieval.top_k)
        .context("failed to create LLM client")?;

    let monitor = Arc::new(
        Monitor::new(config.paths.log_dir.clone()).context("failed to start session monitor")?,
    );
    // Persists the summary on every way out of main, panics included.
    let _summary_guard = SummaryGuard::new(monitor.clone());
    let mut chat = ChatPipeline::new(pipeline, monitor.clone());

    let mut terminal = Terminal::new();
    terminal.print_banner(&config.llm.completion_url())?;

    let document = match select_document(&args, &mut terminal, &config.paths.upload_dir).await? {
        Selection::Document(path) => Some(path),
        Selection::NoDocument => None,
        Selection::Interrupted => {
            terminal.print_info("\nSaving metrics and ending chat...")?;
            return Ok(());
        }
    };

    chat_loop(&mut chat, &monitor, &mut terminal, args.conversation(), document).await
}

/// Log to `{log_dir}/app.log` so the chat itself stays readable.
fn init_logging(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("app.log"))
        .context("failed to open app.log")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    Ok(())
}

async fn select_document(
    args: &CliArgs,
    terminal: &mut Terminal,
    upload_dir: &Path,
) -> Result<Selection> {
    if args.no_document {
        return Ok(Selection::NoDocument);
    }
    if let Some(path) = &args.document {
        return Ok(upload(path, terminal, upload_dir)?);
    }

    terminal.print_info("\nChoose input method:")?;
    terminal.print_info("1. Upload a .pdf or .txt file")?;
    terminal.print_info("2. Start chat without document")?;
    let choice = match terminal.read_input("Enter 1 or 2: ").await? {
        Input::Line(choice) => choice,
        Input::Eof => return Ok(Selection::NoDocument),
        Input::Interrupted => return Ok(Selection::Interrupted),
    };
    if choice != "1" {
        return Ok(Selection::NoDocument);
    }

    match terminal.read_input("Enter the full path to your file: ").await? {
        Input::Line(raw) => Ok(upload(Path::new(clean_path(&raw)), terminal, upload_dir)?),
        Input::Eof => Ok(Selection::NoDocument),
        Input::Interrupted => Ok(Selection::Interrupted),
    }
}

/// Copy the chosen file into the upload directory. Any problem falls back
/// to chatting without a document.
fn upload(path: &Path, terminal: &Terminal, upload_dir: &Path) -> Result<Selection> {
    if !path.exists() {
        terminal.print_info(&format!("\nFile not found: {}", path.display()))?;
        terminal.print_info("Starting chat without document.")?;
        return Ok(Selection::NoDocument);
    }
    match copy_to_uploads(path, upload_dir) {
        Ok(dest) => {
            terminal.print_info(&format!("\nFile copied to uploads directory: {}", dest.display()))?;
            Ok(Selection::Document(dest))
        }
        Err(e) => {
            warn!(error = %e, "failed to copy document");
            terminal.print_error(&format!("copying file: {e}"))?;
            terminal.print_info("Starting chat without document.")?;
            Ok(Selection::NoDocument)
        }
    }
}

async fn chat_loop(
    chat: &mut ChatPipeline,
    monitor: &Monitor,
    terminal: &mut Terminal,
    conversation: Conversation,
    document: Option<PathBuf>,
) -> Result<()> {
    info!(document = ?document, session = %monitor.session_id(), "chat started");
    terminal.print_chat_header()?;

    let mut request = ChatRequest::new(conversation, document);
    loop {
        let line = match terminal.read_input("You: ").await? {
            Input::Line(line) => line,
            Input::Eof | Input::Interrupted => {
                terminal.print_info("\n\nSaving metrics and ending chat...")?;
                terminal.print_info("Chat ended by user.")?;
                break;
            }
        };

        match Command::parse(&line) {
            Command::Empty => continue,
            Command::Exit => {
                terminal.print_info("\nSaving metrics and exiting...")?;
                if let Err(e) = monitor.save_summary() {
                    terminal.print_error(&format!("failed to save metrics: {e}"))?;
                }
                terminal.print_info("\nGoodbye!")?;
                break;
            }
            Command::Clear => {
                request.conversation.clear();
                terminal.print_info("\nContext cleared!")?;
            }
            Command::Stats => terminal.print_stats(&monitor.get_summary())?,
            Command::Ask(question) => {
                request.conversation.push_user(question);
                let reply = tokio::select! {
                    reply = chat.answer(&request) => reply,
                    _ = tokio::signal::ctrl_c() => {
                        terminal.print_info("\n\nSaving metrics and ending chat...")?;
                        break;
                    }
                };
                request.conversation.push_assistant(reply.clone());
                terminal.print_reply(&reply)?;
            }
        }
    }
    Ok(())
}
