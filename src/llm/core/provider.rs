//! Provider trait for remote model implementations

use async_trait::async_trait;

use super::{
    error::LlmError,
    types::{GenerateRequest, GenerateResponse},
};
use crate::config::GeminiConfig;
use crate::llm::gemini::GeminiClient;

/// The remote model capability: send history plus tool schemas, get one turn back
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate the next model turn
    ///
    /// The response may hold free text, a function call, or both; callers
    /// decide which one wins.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError>;
}

/// Create the configured provider
///
/// # Example
///
/// ```rust,no_run
/// use weather_agent::config::GeminiConfig;
/// use weather_agent::llm::create_provider;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = create_provider(&GeminiConfig::new("my-api-key"))?;
/// # Ok(())
/// # }
/// ```
pub fn create_provider(config: &GeminiConfig) -> Result<Box<dyn LlmProvider>, LlmError> {
    Ok(Box::new(GeminiClient::new(config)?))
}
