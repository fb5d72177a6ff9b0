//! Tool functions, their structured results, and the registry the runner
//! dispatches through.

use agentchat_core::ToolDefinition;
use agentchat_schema::{string_parameters, ParameterSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("tool execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::NotFound(_) => "not_found",
            ToolError::InvalidArgument(_) => "invalid_argument",
            ToolError::Execution(_) => "execution",
        }
    }

    /// Renders the error as a result the model can read.
    pub fn to_result(&self) -> ToolInvocationResult {
        ToolInvocationResult::error(self.kind(), self.to_string())
    }
}

pub trait ToolExecutor: Send + Sync {
    fn call(&self, name: &str, input: Value) -> Result<Value, ToolError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Outcome of one tool call: an explicit status plus a flat payload.
///
/// Serializes as `{"status": "success", "<key>": <value>, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    pub status: ToolStatus,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ToolInvocationResult {
    pub fn success() -> Self {
        Self {
            status: ToolStatus::Success,
            payload: Map::new(),
        }
    }

    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            payload: Map::new(),
        }
        .with("error_kind", kind)
        .with("error_message", message.into())
    }

    /// Adds a payload entry. `status` is reserved and cannot be overwritten.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if key != "status" {
            self.payload.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        let mut object = Map::new();
        object.insert(
            "status".to_string(),
            Value::String(
                match self.status {
                    ToolStatus::Success => "success",
                    ToolStatus::Error => "error",
                }
                .to_string(),
            ),
        );
        object.extend(self.payload);
        Value::Object(object)
    }
}

/// String arguments extracted from a model's tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    values: BTreeMap<String, String>,
}

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the argument or the empty string. Only use for parameters the
    /// schema marks as required, which `FunctionTool` has already checked.
    pub fn required(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }
}

type Handler = Arc<dyn Fn(&ToolArgs) -> ToolInvocationResult + Send + Sync>;

/// A named function the model may call, with declared string parameters.
#[derive(Clone)]
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: Vec<ParameterSpec>,
    handler: Handler,
}

impl fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl FunctionTool {
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
        handler: F,
    ) -> Self
    where
        F: Fn(&ToolArgs) -> ToolInvocationResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            input_schema: string_parameters(&self.parameters),
        }
    }

    pub fn parse_args(&self, input: &Value) -> Result<ToolArgs, ToolError> {
        let empty = Map::new();
        let object = match input {
            Value::Object(object) => object,
            Value::Null => &empty,
            other => {
                return Err(ToolError::InvalidArgument(format!(
                    "{} expects an object of arguments, got {other}",
                    self.name
                )))
            }
        };

        let mut values = BTreeMap::new();
        for param in &self.parameters {
            match object.get(&param.name) {
                Some(Value::String(value)) => {
                    values.insert(param.name.clone(), value.clone());
                }
                Some(Value::Null) | None if !param.required => {}
                Some(Value::Null) | None => {
                    return Err(ToolError::InvalidArgument(format!(
                        "missing required argument `{}`",
                        param.name
                    )))
                }
                Some(other) => {
                    return Err(ToolError::InvalidArgument(format!(
                        "argument `{}` must be a string, got {other}",
                        param.name
                    )))
                }
            }
        }
        Ok(ToolArgs { values })
    }

    /// Validates `input` and runs the handler. Invalid arguments come back as
    /// an error result rather than an `Err`.
    pub fn invoke(&self, input: &Value) -> ToolInvocationResult {
        match self.parse_args(input) {
            Ok(args) => (self.handler)(&args),
            Err(err) => {
                tracing::warn!(tool = %self.name, error = %err, "rejected tool arguments");
                err.to_result()
            }
        }
    }
}

/// Ordered set of tools. Lookups return the first tool registered under a name.
#[derive(Debug, Clone, Default)]
pub struct ToolBox {
    tools: Vec<Arc<FunctionTool>>,
}

impl ToolBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: Arc<FunctionTool>) -> Self {
        self.push(tool);
        self
    }

    pub fn push(&mut self, tool: Arc<FunctionTool>) {
        if self.get(tool.name()).is_some() {
            tracing::warn!(tool = %tool.name(), "duplicate tool name, keeping the first registration");
        }
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FunctionTool>> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = Vec::new();
        for tool in &self.tools {
            if definitions.iter().all(|known| known.name != tool.name()) {
                definitions.push(tool.definition());
            }
        }
        definitions
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<Arc<FunctionTool>> for ToolBox {
    fn from_iter<I: IntoIterator<Item = Arc<FunctionTool>>>(iter: I) -> Self {
        let mut toolbox = ToolBox::new();
        for tool in iter {
            toolbox.push(tool);
        }
        toolbox
    }
}

impl ToolExecutor for ToolBox {
    fn call(&self, name: &str, input: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        Ok(tool.invoke(&input).into_value())
    }
}
