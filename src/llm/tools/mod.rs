//! Tool execution framework
//!
//! Declarations describe tools to the model; the registry pairs each
//! declaration with a callable and dispatches model requests to it.

pub mod declaration;
pub mod executor;
pub mod registry;

pub use declaration::{ParameterKind, ParameterSpec, ToolDeclaration};
pub use executor::ToolExecutor;
pub use registry::{RegistryError, ToolFn, ToolRegistration, ToolRegistry};
