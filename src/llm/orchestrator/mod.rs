//! Conversation orchestrator
//!
//! Owns one chat session with the remote model and turns each user prompt
//! into a single reply:
//! - Sends the prompt, the session history, and every tool declaration
//! - Returns free text from the model verbatim
//! - Dispatches a requested tool call through the tool executor
//! - Returns the tool's output (or a description of why it failed) as the
//!   reply, or, in [`DispatchMode::Summarize`], hands it back to the model
//!   for a written answer

mod error;
mod session;

pub use error::OrchestratorError;
pub use session::ConversationSession;

use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::llm::core::{
    config::GenerationConfig,
    provider::LlmProvider,
    types::{ContentBlock, GenerateRequest, GenerateResponse, Message, ToolInvocationRequest},
};
use crate::llm::tools::{declaration::ToolDeclaration, executor::ToolExecutor, registry::RegistryError};

/// What happens to a tool's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// The tool's output is the reply; the model is called once per prompt
    #[default]
    Raw,
    /// The tool's output goes back to the model, whose text is the reply
    Summarize,
}

/// Decision read from one model turn
enum ModelReply {
    Text(String),
    ToolCall {
        call: ToolInvocationRequest,
        preamble: Option<String>,
    },
    Empty,
}

impl ModelReply {
    /// A function call wins over text when the model sends both
    fn from_response(response: &GenerateResponse) -> Self {
        match (response.first_tool_call(), response.text()) {
            (Some(call), preamble) => ModelReply::ToolCall { call, preamble },
            (None, Some(text)) => ModelReply::Text(text),
            (None, None) => ModelReply::Empty,
        }
    }
}

/// Drives one conversation with the remote model and its tools
pub struct ConversationOrchestrator {
    provider: Box<dyn LlmProvider>,

    tools: Box<dyn ToolExecutor>,

    /// Snapshot taken at construction; advertised unchanged on every turn
    tool_declarations: Vec<ToolDeclaration>,

    session: ConversationSession,

    config: GenerationConfig,

    system: Option<String>,

    dispatch_mode: DispatchMode,

    /// Model calls allowed per prompt (only reachable in Summarize mode)
    max_iterations: usize,
}

impl ConversationOrchestrator {
    pub fn new(
        provider: Box<dyn LlmProvider>,
        tools: Box<dyn ToolExecutor>,
        config: &AgentConfig,
    ) -> Self {
        let tool_declarations = tools.declarations();
        Self {
            provider,
            tools,
            tool_declarations,
            session: ConversationSession::new(),
            config: config.generation.clone(),
            system: config.system_prompt.clone(),
            dispatch_mode: config.dispatch_mode,
            max_iterations: config.max_iterations.max(1),
        }
    }

    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    /// Set the maximum number of model calls per prompt (at least 1)
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn tool_declarations(&self) -> &[ToolDeclaration] {
        &self.tool_declarations
    }

    /// Forget the conversation so far
    pub fn clear_history(&mut self) {
        self.session.clear();
    }

    /// Answer one prompt
    ///
    /// Only a failure to reach the model is an error, and in that case the
    /// session is left exactly as it was before the call. Unknown tools,
    /// rejected arguments, and failed fetches all produce an `Ok` reply that
    /// describes the problem.
    pub async fn respond(&mut self, prompt: impl Into<String>) -> Result<String, OrchestratorError> {
        let checkpoint = self.session.len();
        self.session.push(Message::user(prompt));

        let result = self.run_turn().await;
        if result.is_err() {
            self.session.truncate(checkpoint);
        }
        result
    }

    async fn run_turn(&mut self) -> Result<String, OrchestratorError> {
        for iteration in 1..=self.max_iterations {
            debug!(iteration, history = self.session.len(), "Calling model");
            let response = self.provider.generate(self.build_request()).await?;
            if let Some(usage) = &response.usage {
                self.session.record_usage(usage);
            }

            match ModelReply::from_response(&response) {
                ModelReply::Text(text) => {
                    self.session.push(Message::assistant(text.clone()));
                    return Ok(text);
                }
                ModelReply::Empty => {
                    warn!(finish_reason = ?response.finish_reason, "Model returned no content");
                    return Ok(match response.finish_reason {
                        Some(reason) => format!("The model returned no answer (finish reason: {:?}).", reason),
                        None => "The model returned no answer.".to_string(),
                    });
                }
                ModelReply::ToolCall { call, preamble } => {
                    self.session.push(call_message(&call, preamble));
                    let output = self.dispatch(&call).await;
                    if self.dispatch_mode == DispatchMode::Raw {
                        return Ok(output);
                    }
                }
            }
        }

        Err(OrchestratorError::MaxIterationsReached(self.max_iterations))
    }

    /// Run one tool call and record its result in the session
    async fn dispatch(&mut self, call: &ToolInvocationRequest) -> String {
        info!(tool = %call.tool_name, arguments = %call.arguments, "Dispatching tool call");

        match self.tools.execute(call).await {
            Ok(output) => {
                debug!(tool = %call.tool_name, bytes = output.len(), "Tool call completed");
                self.session.push(Message::tool_result(call, output.clone()));
                output
            }
            Err(err) => {
                match &err {
                    RegistryError::ToolNotFound(name) => {
                        warn!(tool = %name, "Model requested an unregistered tool")
                    }
                    other => warn!(tool = %call.tool_name, error = %other, "Tool call failed"),
                }
                let message = err.to_string();
                self.session.push(Message::tool_error(call, message.clone()));
                message
            }
        }
    }

    fn build_request(&self) -> GenerateRequest {
        GenerateRequest {
            messages: self.session.messages().to_vec(),
            tools: Some(self.tool_declarations.clone()),
            config: self.config.clone(),
            system: self.system.clone(),
        }
    }
}

/// The assistant turn as it goes into history: any text, then the one call
/// being dispatched. Further calls in the same turn are not recorded because
/// they will never get a response.
fn call_message(call: &ToolInvocationRequest, preamble: Option<String>) -> Message {
    let mut message = Message::tool_call(call);
    if let Some(text) = preamble.filter(|t| !t.is_empty()) {
        message.content.insert(0, ContentBlock::Text { text });
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::core::error::LlmError;
    use crate::llm::core::types::MessageRole;
    use crate::llm::tools::registry::ToolRegistry;
    use crate::llm::tools::{ParameterKind, ParameterSpec};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // Mock LLM provider that replays canned turns and records requests
    struct MockProvider {
        responses: Mutex<VecDeque<Result<GenerateResponse, LlmError>>>,
        requests: Arc<Mutex<Vec<GenerateRequest>>>,
    }

    impl MockProvider {
        fn new(responses: Vec<Result<GenerateResponse, LlmError>>) -> (Self, Arc<Mutex<Vec<GenerateRequest>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let provider = Self {
                responses: Mutex::new(responses.into()),
                requests: Arc::clone(&requests),
            };
            (provider, requests)
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::InvalidRequest("No more responses".to_string())))
        }
    }

    fn text(text: &str) -> Result<GenerateResponse, LlmError> {
        Ok(GenerateResponse {
            content: vec![ContentBlock::Text { text: text.to_string() }],
            ..Default::default()
        })
    }

    fn tool_call(name: &str, input: serde_json::Value) -> Result<GenerateResponse, LlmError> {
        Ok(GenerateResponse {
            content: vec![ContentBlock::ToolUse {
                id: format!("{}-id", name),
                name: name.to_string(),
                input,
                signature: None,
            }],
            ..Default::default()
        })
    }

    fn echo_registry() -> ToolRegistry {
        #[derive(serde::Deserialize)]
        struct EchoArgs {
            word: String,
        }

        let mut registry = ToolRegistry::new();
        registry
            .register_sync(
                ToolDeclaration::new("echo", "Echo a word")
                    .with_parameter(ParameterSpec::required("word", ParameterKind::String, "word")),
                |args: EchoArgs| Ok(json!({"echo": args.word})),
            )
            .unwrap();
        registry
    }

    fn orchestrator(responses: Vec<Result<GenerateResponse, LlmError>>) -> (ConversationOrchestrator, Arc<Mutex<Vec<GenerateRequest>>>) {
        let (provider, requests) = MockProvider::new(responses);
        let orchestrator = ConversationOrchestrator::new(
            Box::new(provider),
            Box::new(echo_registry()),
            &AgentConfig::default(),
        );
        (orchestrator, requests)
    }

    #[test]
    fn test_orchestrator_creation() {
        let (orchestrator, _) = orchestrator(vec![]);
        assert!(orchestrator.session().is_empty());
        assert_eq!(orchestrator.max_iterations, 5);
        assert_eq!(orchestrator.dispatch_mode, DispatchMode::Raw);
        assert_eq!(orchestrator.tool_declarations()[0].name, "echo");
    }

    #[test]
    fn test_max_iterations_floor() {
        let (orchestrator, _) = orchestrator(vec![]);
        assert_eq!(orchestrator.with_max_iterations(0).max_iterations, 1);
    }

    #[tokio::test]
    async fn test_history_accumulates_across_prompts() {
        let (mut orchestrator, requests) = orchestrator(vec![text("one"), text("two")]);

        orchestrator.respond("first").await.unwrap();
        orchestrator.respond("second").await.unwrap();

        assert_eq!(orchestrator.session().len(), 4);
        let requests = requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].tools.as_ref().unwrap().len(), 1);
        assert!(requests[1].system.is_some());
    }

    #[tokio::test]
    async fn test_clear_history_starts_fresh() {
        let (mut orchestrator, requests) = orchestrator(vec![text("one"), text("two")]);

        orchestrator.respond("first").await.unwrap();
        orchestrator.clear_history();
        orchestrator.respond("second").await.unwrap();

        assert_eq!(requests.lock().unwrap()[1].messages.len(), 1);
        assert_eq!(orchestrator.session().len(), 2);
    }

    #[tokio::test]
    async fn test_llm_error_rolls_back_the_prompt() {
        let (mut orchestrator, _) = orchestrator(vec![
            text("hello"),
            Err(LlmError::HttpError {
                status: 503,
                body: "unavailable".to_string(),
            }),
        ]);

        orchestrator.respond("hi").await.unwrap();
        let err = orchestrator.respond("again").await.unwrap_err();

        assert!(matches!(err, OrchestratorError::Llm(LlmError::HttpError { status: 503, .. })));
        assert_eq!(orchestrator.session().len(), 2);
    }

    #[tokio::test]
    async fn test_raw_mode_records_call_and_result() {
        let (mut orchestrator, requests) =
            orchestrator(vec![tool_call("echo", json!({"word": "hi"}))]);

        let reply = orchestrator.respond("say hi").await.unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(parsed, json!({"echo": "hi"}));
        assert_eq!(requests.lock().unwrap().len(), 1);

        let roles: Vec<MessageRole> = orchestrator.session().messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant, MessageRole::Tool]);
    }

    #[tokio::test]
    async fn test_invalid_arguments_become_the_reply() {
        let (mut orchestrator, _) = orchestrator(vec![tool_call("echo", json!({}))]);

        let reply = orchestrator.respond("say something").await.unwrap();

        assert!(reply.contains("missing required parameter 'word'"));
        match &orchestrator.session().messages()[2].content[0] {
            ContentBlock::ToolResult { is_error, .. } => assert!(is_error),
            other => panic!("Expected tool result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_summarize_mode_reprompts_with_tool_result() {
        let (orchestrator, requests) = orchestrator(vec![
            tool_call("echo", json!({"word": "hi"})),
            text("The tool said hi."),
        ]);
        let mut orchestrator = orchestrator.with_dispatch_mode(DispatchMode::Summarize);

        let reply = orchestrator.respond("say hi").await.unwrap();

        assert_eq!(reply, "The tool said hi.");
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, MessageRole::Tool);
    }

    #[tokio::test]
    async fn test_summarize_mode_stops_at_max_iterations() {
        let (orchestrator, _) = orchestrator(vec![
            tool_call("echo", json!({"word": "a"})),
            tool_call("echo", json!({"word": "b"})),
            tool_call("echo", json!({"word": "c"})),
        ]);
        let mut orchestrator = orchestrator
            .with_dispatch_mode(DispatchMode::Summarize)
            .with_max_iterations(2);

        let err = orchestrator.respond("loop").await.unwrap_err();

        assert!(matches!(err, OrchestratorError::MaxIterationsReached(2)));
        assert!(orchestrator.session().is_empty());
    }

    #[tokio::test]
    async fn test_empty_model_turn() {
        let (mut orchestrator, _) = orchestrator(vec![Ok(GenerateResponse::default())]);

        let reply = orchestrator.respond("...").await.unwrap();
        assert_eq!(reply, "The model returned no answer.");
    }

    #[tokio::test]
    async fn test_empty_text_turn_is_not_recorded() {
        let (mut orchestrator, requests) = orchestrator(vec![text(""), text("ok")]);

        let first = orchestrator.respond("hi").await.unwrap();
        assert_eq!(first, "The model returned no answer.");
        assert_eq!(orchestrator.respond("again").await.unwrap(), "ok");

        let requests = requests.lock().unwrap();
        let empty_parts = requests[1]
            .messages
            .iter()
            .flat_map(|m| &m.content)
            .filter(|block| matches!(block, ContentBlock::Text { text } if text.is_empty()))
            .count();
        assert_eq!(empty_parts, 0);
        assert!(requests[1]
            .messages
            .iter()
            .all(|m| m.role != MessageRole::Assistant));
    }

    #[tokio::test]
    async fn test_text_alongside_call_is_kept_in_history() {
        let (mut orchestrator, _) = orchestrator(vec![Ok(GenerateResponse {
            content: vec![
                ContentBlock::Text {
                    text: "Checking.".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "1".to_string(),
                    name: "echo".to_string(),
                    input: json!({"word": "x"}),
                    signature: None,
                },
            ],
            ..Default::default()
        })]);

        orchestrator.respond("go").await.unwrap();

        let assistant = &orchestrator.session().messages()[1];
        assert_eq!(assistant.content.len(), 2);
        assert!(matches!(assistant.content[0], ContentBlock::Text { .. }));
        assert!(matches!(assistant.content[1], ContentBlock::ToolUse { .. }));
    }
}
