//! Tool executor trait

use async_trait::async_trait;

use super::declaration::ToolDeclaration;
use super::registry::RegistryError;
use crate::llm::core::types::ToolInvocationRequest;

/// Executes tool calls requested by the model
///
/// The conversation layer only sees this trait, so the set of declarations it
/// advertises and the callables it dispatches to always come from the same
/// source.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Declarations to attach to every model request, in a stable order
    fn declarations(&self) -> Vec<ToolDeclaration>;

    /// Execute a tool call
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The tool's output text
    /// * `Err(RegistryError)` - Unknown tool, rejected arguments, or a failed callable
    async fn execute(&self, call: &ToolInvocationRequest) -> Result<String, RegistryError>;
}
