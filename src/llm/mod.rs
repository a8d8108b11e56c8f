//! LLM Abstraction Layer
//!
//! A provider-neutral conversation model, a Gemini implementation of it,
//! the tool registry the model can call into, and the orchestrator that
//! ties a session together.

pub mod core;
pub mod gemini;
pub mod orchestrator;
pub mod tools;

// Re-export commonly used types
pub use core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{create_provider, LlmProvider},
    types::{
        ContentBlock, FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole,
        ToolInvocationRequest, UsageMetadata,
    },
};

pub use orchestrator::{ConversationOrchestrator, ConversationSession, DispatchMode, OrchestratorError};
pub use tools::{ParameterKind, ParameterSpec, RegistryError, ToolDeclaration, ToolExecutor, ToolRegistry};
