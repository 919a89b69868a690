use std::sync::Arc;

use tracing::error;

use docchat_core::ChatRequest;
use docchat_monitor::{Monitor, Monitored, PromptHandler};

use crate::retrieval::{PipelineError, RetrievalPipeline};

/// The boundary the chat loop talks to. Every call is instrumented, and no
/// failure escapes as anything but reply text.
pub struct ChatPipeline {
    handler: Monitored<RetrievalPipeline>,
}

impl ChatPipeline {
    pub fn new(pipeline: RetrievalPipeline, monitor: Arc<Monitor>) -> Self {
        Self {
            handler: Monitored::new(pipeline, monitor),
        }
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        self.handler.monitor()
    }

    pub fn pipeline(&self) -> &RetrievalPipeline {
        self.handler.inner()
    }

    /// Answer `request`. Failures are logged and returned as text so one
    /// bad turn never ends the session.
    pub async fn answer(&mut self, request: &ChatRequest) -> String {
        match self.handler.handle(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error in pipeline: {}", e);
                error_reply(&e)
            }
        }
    }
}

fn error_reply(e: &PipelineError) -> String {
    match e {
        PipelineError::Generation { .. } => format!("Error: {e}"),
        PipelineError::Process(_) => format!("Error in pipeline: {e}"),
    }
}
