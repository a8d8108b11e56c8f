use crate::llm::core::error::LlmError;

/// Errors that end a `respond` call without a reply
///
/// Tool failures and unknown tools are not errors; they become the reply.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Error from the LLM provider
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The model kept calling tools without producing an answer
    #[error("Maximum iterations reached ({0})")]
    MaxIterationsReached(usize),
}
