//! Mapping between abstraction types and Gemini types

use uuid::Uuid;

use crate::llm::core::{
    config::GenerationConfig,
    error::LlmError,
    types::{
        ContentBlock, FinishReason, GenerateRequest, GenerateResponse, Message, MessageRole,
        UsageMetadata,
    },
};
use crate::llm::tools::declaration::ToolDeclaration;

use super::types::{
    Content, FunctionCall, FunctionDeclaration, FunctionResponse, GeminiGenerationConfig,
    GenerateContentRequest, GenerateContentResponse, Part, SystemInstruction, Tool,
};

/// Convert our abstraction request to Gemini's request format
pub fn to_gemini_request(request: GenerateRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request.messages.into_iter().map(to_gemini_content).collect(),
        system_instruction: request.system.map(|s| SystemInstruction {
            parts: vec![Part::Text { text: s }],
        }),
        tools: request
            .tools
            .filter(|tools| !tools.is_empty())
            .map(|tools| {
                vec![Tool {
                    function_declarations: tools.iter().map(to_gemini_function_declaration).collect(),
                }]
            }),
        generation_config: to_gemini_generation_config(request.config),
    }
}

fn to_gemini_content(message: Message) -> Content {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
        // Function responses travel in user turns
        MessageRole::Tool => "user",
    };

    Content {
        role: role.to_string(),
        parts: message.content.into_iter().map(to_gemini_part).collect(),
    }
}

fn to_gemini_part(block: ContentBlock) -> Part {
    match block {
        ContentBlock::Text { text } => Part::Text { text },
        // Gemini has no call ids in requests; calls and responses pair by name
        ContentBlock::ToolUse {
            id: _,
            name,
            input,
            signature,
        } => Part::FunctionCall {
            function_call: FunctionCall { name, args: input },
            thought_signature: signature,
        },
        ContentBlock::ToolResult {
            tool_use_id: _,
            name,
            content,
            is_error,
        } => {
            let response = if is_error {
                serde_json::json!({ "error": content })
            } else {
                // `response` must be an object; wrap anything else
                match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(value @ serde_json::Value::Object(_)) => value,
                    _ => serde_json::json!({ "result": content }),
                }
            };

            Part::FunctionResponse {
                function_response: FunctionResponse { name, response },
            }
        }
    }
}

fn to_gemini_function_declaration(tool: &ToolDeclaration) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.input_schema(),
    }
}

fn to_gemini_generation_config(config: GenerationConfig) -> Option<GeminiGenerationConfig> {
    if config == GenerationConfig::default() {
        return None;
    }
    Some(GeminiGenerationConfig {
        max_output_tokens: config.max_output_tokens,
        temperature: config.temperature,
    })
}

/// Convert a Gemini response into one model turn
///
/// Only the first candidate is read. A response with no candidates means
/// the prompt was blocked and is reported as a provider error.
pub fn from_gemini_response(response: GenerateContentResponse) -> Result<GenerateResponse, LlmError> {
    let usage = response.usage_metadata.map(|u| UsageMetadata {
        input_tokens: u.prompt_token_count,
        output_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "NO_CANDIDATES".to_string());
        return Err(LlmError::ProviderError {
            code: reason,
            message: "Gemini returned no candidates for the prompt".to_string(),
        });
    };

    let content = candidate
        .content
        .parts
        .into_iter()
        .filter_map(|part| match part {
            Part::Text { text } => Some(ContentBlock::Text { text }),
            Part::FunctionCall {
                function_call,
                thought_signature,
            } => Some(ContentBlock::ToolUse {
                // Gemini doesn't provide one
                id: Uuid::new_v4().to_string(),
                name: function_call.name,
                input: function_call.args,
                signature: thought_signature,
            }),
            // Not expected in model output
            Part::FunctionResponse { .. } => None,
        })
        .collect();

    Ok(GenerateResponse {
        content,
        finish_reason: candidate.finish_reason.as_deref().map(map_finish_reason),
        usage,
    })
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" => FinishReason::Safety,
        other => FinishReason::Other(other.to_string()),
    }
}
