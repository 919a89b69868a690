pub mod llamafile;

use docchat_core::config::LlmConfig;

use crate::provider::{CompletionProvider, LlmError};

/// Create the completion provider described by config.
pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn CompletionProvider>, LlmError> {
    Ok(Box::new(llamafile::LlamafileProvider::from_config(config)?))
}
