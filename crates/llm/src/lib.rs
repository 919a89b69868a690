pub mod provider;
pub mod providers;
pub mod retry;

pub use provider::{CompletionProvider, LlmError};
pub use providers::create_provider;
pub use providers::llamafile::LlamafileProvider;
pub use retry::{with_retry, RetryPolicy};
