use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;

use docchat_core::ChatRequest;

use crate::monitor::Monitor;

/// Anything that turns a chat request into a reply.
#[async_trait]
pub trait PromptHandler: Send {
    type Error: Display + Send;

    async fn handle(&mut self, request: &ChatRequest) -> Result<String, Self::Error>;
}

/// A handler whose every call is recorded by a [`Monitor`].
///
/// Same contract as the wrapped handler: replies and errors pass through
/// unchanged.
pub struct Monitored<H> {
    inner: H,
    monitor: Arc<Monitor>,
}

impl<H: PromptHandler> Monitored<H> {
    pub fn new(inner: H, monitor: Arc<Monitor>) -> Self {
        Self { inner, monitor }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }
}

#[async_trait]
impl<H: PromptHandler> PromptHandler for Monitored<H> {
    type Error = H::Error;

    async fn handle(&mut self, request: &ChatRequest) -> Result<String, Self::Error> {
        self.monitor
            .instrument(request.question(), self.inner.handle(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::read_metrics;
    use docchat_core::Conversation;
    use tempfile::TempDir;

    /// Echoes the question back, or fails when asked to.
    struct Echo {
        calls: usize,
    }

    #[async_trait]
    impl PromptHandler for Echo {
        type Error = String;

        async fn handle(&mut self, request: &ChatRequest) -> Result<String, String> {
            self.calls += 1;
            match request.question() {
                "fail" => Err("echo refused".to_string()),
                q => Ok(format!("echo: {q}")),
            }
        }
    }

    fn ask(question: &str) -> ChatRequest {
        let mut conversation = Conversation::new();
        conversation.push_user("an earlier question");
        conversation.push_assistant("an earlier answer");
        conversation.push_user(question);
        ChatRequest::new(conversation, None)
    }

    #[tokio::test]
    async fn passes_replies_through_and_records_the_question() {
        let tmp = TempDir::new().unwrap();
        let monitor = Arc::new(Monitor::new(tmp.path()).unwrap());
        let mut handler = Monitored::new(Echo { calls: 0 }, monitor.clone());

        let reply = handler.handle(&ask("ping")).await.unwrap();
        assert_eq!(reply, "echo: ping");
        assert_eq!(handler.inner().calls, 1);

        let records = read_metrics(&monitor.metrics_path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].input, "ping");
        assert_eq!(records[0].output, "echo: ping");
        assert_eq!(records[0].input_chars, 4);
    }

    #[tokio::test]
    async fn errors_pass_through_and_are_counted() {
        let tmp = TempDir::new().unwrap();
        let monitor = Arc::new(Monitor::new(tmp.path()).unwrap());
        let mut handler = Monitored::new(Echo { calls: 0 }, monitor);

        assert_eq!(handler.handle(&ask("fail")).await.unwrap_err(), "echo refused");
        handler.handle(&ask("ok")).await.unwrap();

        let summary = handler.monitor().get_summary();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.total_queries, 1);
        assert_eq!(handler.inner_mut().calls, 2);
    }
}
