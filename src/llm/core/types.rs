//! Core types for the LLM abstraction layer

use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;
use crate::llm::tools::declaration::ToolDeclaration;

/// Request to generate the next model turn
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Conversation history, oldest first
    pub messages: Vec<Message>,
    /// Tools the model may call, in registration order
    pub tools: Option<Vec<ToolDeclaration>>,
    /// Generation parameters
    pub config: GenerationConfig,
    /// System prompt/instructions
    pub system: Option<String>,
}

/// A complete (non-streamed) model turn
#[derive(Debug, Clone, Default)]
pub struct GenerateResponse {
    /// Content blocks in the order the model produced them
    pub content: Vec<ContentBlock>,
    /// Why generation stopped, when the provider says
    pub finish_reason: Option<FinishReason>,
    /// Token accounting for this turn
    pub usage: Option<UsageMetadata>,
}

impl GenerateResponse {
    /// Concatenated text of all text blocks, `None` when that is empty
    ///
    /// An empty text part is not a valid model turn to replay, so it counts
    /// as no text.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// The first function call in the response, if the model asked for one
    pub fn first_tool_call(&self) -> Option<ToolInvocationRequest> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse {
                id,
                name,
                input,
                signature,
            } => Some(ToolInvocationRequest {
                id: id.clone(),
                tool_name: name.clone(),
                arguments: input.clone(),
                signature: signature.clone(),
            }),
            _ => None,
        })
    }
}

/// A model's request to run one local tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRequest {
    /// Correlates the call with its result in the conversation history
    pub id: String,
    pub tool_name: String,
    /// Arguments keyed by parameter name
    pub arguments: serde_json::Value,
    /// Provider reasoning token to replay alongside the call
    pub signature: Option<String>,
}

/// A single message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content blocks in the message
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a new user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Create a new assistant message with text content
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Record the assistant turn that requested `call`
    pub fn tool_call(call: &ToolInvocationRequest) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: vec![ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.tool_name.clone(),
                input: call.arguments.clone(),
                signature: call.signature.clone(),
            }],
        }
    }

    /// Create a new tool message with a tool result
    pub fn tool_result(call: &ToolInvocationRequest, content: impl Into<String>) -> Self {
        Self::tool_response(call, content.into(), false)
    }

    /// Create a new tool message with an error result
    pub fn tool_error(call: &ToolInvocationRequest, error: impl Into<String>) -> Self {
        Self::tool_response(call, error.into(), true)
    }

    fn tool_response(call: &ToolInvocationRequest, content: String, is_error: bool) -> Self {
        Self {
            role: MessageRole::Tool,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: call.id.clone(),
                name: call.tool_name.clone(),
                content,
                is_error,
            }],
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Human input
    User,
    /// Model output
    Assistant,
    /// Tool execution result
    Tool,
}

/// Content block within a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text { text: String },
    /// Tool invocation
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
        /// Thought signature attached by thinking models
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// Tool execution result; `name` is needed because Gemini matches
    /// responses to calls by function name
    ToolResult {
        tool_use_id: String,
        name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// Reason why generation finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    /// Provider-specific reason
    Other(String),
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Prompt tokens consumed
    pub input_tokens: u32,
    /// Response tokens generated
    pub output_tokens: u32,
    /// Sum of input and output
    pub total_tokens: u32,
}

impl UsageMetadata {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    /// Add usage from another turn
    pub fn add(&mut self, other: &UsageMetadata) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens = self.input_tokens + self.output_tokens;
    }
}
