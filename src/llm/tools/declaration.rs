//! Tool declarations: the schema a tool advertises to the model
//!
//! A declaration is kept apart from the callable it describes. The model only
//! ever sees the declaration; the registry checks incoming arguments against
//! it before the callable runs.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::registry::RegistryError;

/// JSON type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Integer => "integer",
            ParameterKind::Number => "number",
            ParameterKind::Boolean => "boolean",
        }
    }

    /// Check a JSON value against this kind, normalizing where it is lossless.
    ///
    /// Gemini serializes every number as a float, so `2.0` is accepted as an
    /// integer and rewritten to `2`.
    fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (ParameterKind::String, Value::String(_)) => Some(value.clone()),
            (ParameterKind::Boolean, Value::Bool(_)) => Some(value.clone()),
            (ParameterKind::Number, Value::Number(_)) => Some(value.clone()),
            (ParameterKind::Integer, Value::Number(n)) => {
                if n.is_i64() || n.is_u64() {
                    return Some(value.clone());
                }
                let f = n.as_f64()?;
                (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| json!(f as i64))
            }
            _ => None,
        }
    }
}

/// One declared parameter of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
    pub required: bool,
    /// Filled in when the model omits an optional parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSpec {
    /// A required parameter
    pub fn required(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    /// An optional parameter with no default
    pub fn optional(
        name: impl Into<String>,
        kind: ParameterKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Make the parameter optional, substituting `default` when omitted
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(default.into());
        self
    }
}

/// Declaration of a tool available to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Function name, unique within a registry
    pub name: String,
    /// What the tool does, shown to the model verbatim
    pub description: String,
    /// Parameters in the order they are advertised
    pub parameters: Vec<ParameterSpec>,
}

impl ToolDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Render the parameters as the JSON Schema object the model expects
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.as_str(),
                    "description": param.description,
                }),
            );
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// Match `arguments` by name against the declared parameters
    ///
    /// Returns an object holding exactly the declared parameters that are
    /// present after defaults are applied. Arguments the declaration does not
    /// know are dropped.
    pub fn bind_arguments(&self, arguments: &Value) -> Result<Value, RegistryError> {
        let empty = Map::new();
        let supplied = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(self.invalid(format!("expected an object of arguments, got {}", other)))
            }
        };

        let mut bound = Map::new();
        for param in &self.parameters {
            match supplied.get(&param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let value = param.kind.coerce(value).ok_or_else(|| {
                        self.invalid(format!(
                            "parameter '{}' must be of type {}, got {}",
                            param.name,
                            param.kind.as_str(),
                            value
                        ))
                    })?;
                    bound.insert(param.name.clone(), value);
                }
                None if param.required => {
                    return Err(self.invalid(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
                None => {
                    if let Some(default) = &param.default {
                        bound.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }

        for name in supplied.keys() {
            if !self.parameters.iter().any(|p| &p.name == name) {
                tracing::debug!(tool = %self.name, argument = %name, "Dropping undeclared argument");
            }
        }

        Ok(Value::Object(bound))
    }

    fn invalid(&self, reason: String) -> RegistryError {
        RegistryError::InvalidArguments {
            tool: self.name.clone(),
            reason,
        }
    }
}
