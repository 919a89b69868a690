use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use docchat_core::config::LlmConfig;
use docchat_core::ChatRequest;
use docchat_ingest::{DocumentProcessor, ProcessError, RetrievalResult};
use docchat_llm::{create_provider, CompletionProvider, LlmError};
use docchat_monitor::PromptHandler;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("document retrieval failed: {0}")]
    Process(#[from] ProcessError),

    #[error("could not reach the LLM server at {url}: {source}")]
    Generation {
        url: String,
        #[source]
        source: LlmError,
    },
}

/// Answers a conversation, grounding it in the request's document when
/// there is one.
pub struct RetrievalPipeline {
    processor: DocumentProcessor,
    llm: Box<dyn CompletionProvider>,
    top_k: usize,
}

impl RetrievalPipeline {
    pub fn new(processor: DocumentProcessor, llm: Box<dyn CompletionProvider>, top_k: usize) -> Self {
        Self {
            processor,
            llm,
            top_k,
        }
    }

    /// Build with the completion provider described by config.
    pub fn from_config(
        processor: DocumentProcessor,
        llm_config: &LlmConfig,
        top_k: usize,
    ) -> Result<Self, LlmError> {
        Ok(Self::new(processor, create_provider(llm_config)?, top_k))
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    /// The full prompt for `request`: the rendered conversation, prefixed
    /// with retrieved document context when any is found.
    async fn build_prompt(&mut self, request: &ChatRequest) -> Result<String, ProcessError> {
        let prompt = request.conversation.render_prompt();

        let Some(path) = request.document.as_deref() else {
            info!("No document provided, using prompt without context");
            return Ok(prompt);
        };

        if let Some(report) = self.processor.ensure_processed(path).await? {
            info!(
                chunks = report.chunks,
                characters = report.characters,
                "Document ready: {}",
                report.path.display()
            );
        }

        let question = request.question();
        info!("Processing question: {}", question);
        let results = self.processor.search(question, self.top_k).await?;

        if results.is_empty() {
            info!("No relevant document sections found, using prompt without context");
            return Ok(prompt);
        }
        info!("Added document context to prompt");
        Ok(with_context(&results, &prompt))
    }
}

/// Prefix `prompt` with the retrieved chunks, best first, separated by
/// blank lines.
pub fn with_context(results: &[RetrievalResult], prompt: &str) -> String {
    let context = results
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Context from document:\n{context}\n\nCurrent conversation:\n{prompt}")
}

#[async_trait]
impl PromptHandler for RetrievalPipeline {
    type Error = PipelineError;

    async fn handle(&mut self, request: &ChatRequest) -> Result<String, PipelineError> {
        let prompt = self.build_prompt(request).await?;

        debug!(chars = prompt.chars().count(), "Sending prompt to LLM");
        let response = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|source| PipelineError::Generation {
                url: self.llm.endpoint().to_string(),
                source,
            })?;
        info!("Received response from LLM");
        Ok(response)
    }
}
