//! The instrumented chat pipeline: document retrieval, context injection
//! and generation, recorded by the session monitor.

pub mod chat;
pub mod retrieval;

pub use chat::ChatPipeline;
pub use retrieval::{with_context, PipelineError, RetrievalPipeline};
