use std::path::PathBuf;

use clap::Parser;

use docchat_core::Conversation;

/// Chat with a local language model, optionally grounded in one document.
///
/// Everything not given here comes from the environment (or `.env`).
#[derive(Parser, Debug)]
#[command(name = "docchat", about = "Chat with a local LLM about a PDF or text document")]
pub struct CliArgs {
    /// Document to chat about (.pdf or .txt); skips the startup question
    #[arg(long, env = "DOCCHAT_DOCUMENT", conflicts_with = "no_document")]
    pub document: Option<PathBuf>,

    /// Start chatting without a document; skips the startup question
    #[arg(long)]
    pub no_document: bool,

    /// Number of document chunks added to each prompt
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Host of the completion server
    #[arg(long)]
    pub llm_host: Option<String>,

    /// Port of the completion server
    #[arg(long)]
    pub llm_port: Option<u16>,

    /// Directory for app.log, metrics and session summaries
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Instructions placed ahead of every prompt; survives `clear`
    #[arg(long, env = "DOCCHAT_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,
}

impl CliArgs {
    /// Apply command-line overrides on top of the environment config.
    pub fn apply(&self, config: &mut docchat_core::Config) {
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
        if let Some(host) = &self.llm_host {
            config.llm.host = host.clone();
        }
        if let Some(port) = self.llm_port {
            config.llm.port = port;
        }
        if let Some(dir) = &self.log_dir {
            config.paths.log_dir = dir.clone();
        }
    }

    /// The conversation a new chat starts from.
    pub fn conversation(&self) -> Conversation {
        match &self.system_prompt {
            Some(prompt) if !prompt.trim().is_empty() => {
                Conversation::new().with_system_prompt(prompt.trim())
            }
            _ => Conversation::new(),
        }
    }
}
