//! Tool registry: declarations paired with the callables that implement them

use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::declaration::ToolDeclaration;
use super::executor::ToolExecutor;
use crate::llm::core::types::ToolInvocationRequest;

/// Type alias for boxed async tool functions
///
/// The argument is the bound argument object; the output is the text handed
/// back to the conversation, or an error message.
pub type ToolFn =
    Box<dyn Fn(serde_json::Value) -> BoxFuture<'static, Result<String, String>> + Send + Sync>;

/// Errors raised while registering or dispatching a tool
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The callable ran and reported a failure; the message is shown as-is
    #[error("{message}")]
    ExecutionFailed { tool: String, message: String },
}

/// A declaration and its callable, registered as one unit
pub struct ToolRegistration {
    pub declaration: ToolDeclaration,
    pub function: ToolFn,
}

impl ToolRegistration {
    pub fn name(&self) -> &str {
        &self.declaration.name
    }

    /// Bind `arguments` against the declaration and run the callable
    pub async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, RegistryError> {
        let bound = self.declaration.bind_arguments(arguments)?;
        (self.function)(bound)
            .await
            .map_err(|message| RegistryError::ExecutionFailed {
                tool: self.declaration.name.clone(),
                message,
            })
    }
}

/// Registry of the tools a conversation may call
///
/// Registration order is preserved and is the order declarations are
/// advertised to the model. Names are unique.
///
/// # Example
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct LocationArgs {
///     location: String,
/// }
///
/// let mut registry = ToolRegistry::new();
/// registry.register_async(
///     ToolDeclaration::new("get_current_weather", "Current conditions").with_parameter(
///         ParameterSpec::required("location", ParameterKind::String, "City name"),
///     ),
///     |args: LocationArgs| async move { Ok(json!({"location": args.location})) },
/// )?;
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolRegistration>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration together with its callable
    pub fn register(&mut self, registration: ToolRegistration) -> Result<(), RegistryError> {
        let name = registration.name().to_string();
        if self.index.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        tracing::debug!(tool = %name, "Registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(registration);
        Ok(())
    }

    /// Register an async function whose arguments deserialize from the bound
    /// argument object and whose result serializes to JSON
    pub fn register_async<F, Args, R, Fut>(
        &mut self,
        declaration: ToolDeclaration,
        func: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        Fut: Future<Output = Result<R, String>> + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let args = match serde_json::from_value::<Args>(args_json) {
                Ok(args) => args,
                Err(e) => {
                    let err_msg = format!("Failed to deserialize arguments: {}", e);
                    return Box::pin(async move { Err(err_msg) }) as BoxFuture<'static, _>;
                }
            };

            let future = func(args);
            Box::pin(async move {
                match future.await {
                    Ok(result) => serialize_output(result),
                    Err(e) => Err(e),
                }
            }) as BoxFuture<'static, _>
        };

        self.register(ToolRegistration {
            declaration,
            function: Box::new(wrapper),
        })
    }

    /// Register a synchronous function
    pub fn register_sync<F, Args, R>(
        &mut self,
        declaration: ToolDeclaration,
        func: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Args) -> Result<R, String> + Send + Sync + 'static,
        Args: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let wrapper = move |args_json: serde_json::Value| {
            let result = serde_json::from_value::<Args>(args_json)
                .map_err(|e| format!("Failed to deserialize arguments: {}", e))
                .and_then(&func)
                .and_then(serialize_output);
            Box::pin(async move { result }) as BoxFuture<'static, _>
        };

        self.register(ToolRegistration {
            declaration,
            function: Box::new(wrapper),
        })
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Result<&ToolRegistration, RegistryError> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))
    }

    /// Declarations in registration order
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(|t| t.declaration.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Tool output is JSON text; pretty-printed because it may be shown to the user as-is
fn serialize_output<R: Serialize>(result: R) -> Result<String, String> {
    serde_json::to_string_pretty(&result).map_err(|e| format!("Failed to serialize result: {}", e))
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    fn declarations(&self) -> Vec<ToolDeclaration> {
        ToolRegistry::declarations(self)
    }

    async fn execute(&self, call: &ToolInvocationRequest) -> Result<String, RegistryError> {
        self.resolve(&call.tool_name)?.invoke(&call.arguments).await
    }
}
