pub mod builtins;
pub mod progress;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

pub use progress::{ProgressReporter, PlainProgress, TerminalProgress};
pub use registry::{RegistryError, ToolDescriptor, ToolRegistry, ToolSource, build_registry};

/// A loosely-typed argument value, either raw user input or a bound result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "float",
            ParamType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Schema for a tool parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSchema {
    /// Parameter name, matched against raw argument keys.
    pub name: String,
    pub param_type: ParamType,
    /// Default used when no value is supplied. `None` makes the parameter required.
    pub default: Option<Value>,
    /// One-line description for prompts and help text.
    pub description: String,
}

impl ParamSchema {
    /// Create a required parameter.
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            default: None,
            description: description.into(),
        }
    }

    /// Create an optional parameter with a default value.
    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        default: impl Into<Value>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            default: Some(default.into()),
            description: description.into(),
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Fully-typed, defaulted arguments for one tool invocation, in declared order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArguments {
    values: Vec<(String, Value)>,
}

impl BoundArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any earlier binding of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn string(&self, name: &str) -> Result<&str, ToolError> {
        match self.get(name) {
            Some(Value::String(s)) => Ok(s),
            other => Err(Self::mismatch(name, ParamType::String, other)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, ToolError> {
        match self.get(name) {
            Some(Value::Int(i)) => Ok(*i),
            other => Err(Self::mismatch(name, ParamType::Integer, other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, ToolError> {
        match self.get(name) {
            Some(Value::Float(x)) => Ok(*x),
            other => Err(Self::mismatch(name, ParamType::Float, other)),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ToolError> {
        match self.get(name) {
            Some(Value::Bool(b)) => Ok(*b),
            other => Err(Self::mismatch(name, ParamType::Boolean, other)),
        }
    }

    /// Structured view for logging.
    pub fn to_json(&self) -> JsonValue {
        let map = self
            .values
            .iter()
            .map(|(n, v)| (n.clone(), json!(v)))
            .collect::<serde_json::Map<_, _>>();
        JsonValue::Object(map)
    }

    fn mismatch(name: &str, expected: ParamType, found: Option<&Value>) -> ToolError {
        match found {
            Some(v) => ToolError::InvalidParams(format!("'{name}' should be {expected}, got {v:?}")),
            None => ToolError::InvalidParams(format!("'{name}' was not bound")),
        }
    }
}

/// Output from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Human-readable result shown to the user
    pub content: String,
    /// Structured metadata for logging and tests
    pub metadata: JsonValue,
}

impl ToolOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: json!({}),
        }
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Error from a tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool execution failed: {0}")]
    ExecutionError(String),
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Context available to tools during execution.
#[derive(Clone)]
pub struct ToolContext {
    /// Identifier of the invocation, shared with log spans
    pub invocation_id: String,
    /// Present only when the caller supplies a progress handle
    pub progress: Option<Arc<dyn ProgressReporter>>,
}

impl ToolContext {
    pub fn new(invocation_id: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The supplied progress handle, or one that only logs.
    pub fn progress(&self) -> &dyn ProgressReporter {
        match &self.progress {
            Some(p) => p.as_ref(),
            None => &PlainProgress,
        }
    }
}

/// The Tool trait: every task Factotum can run implements this.
///
/// Tools receive arguments that were already bound against `parameters()`,
/// so the declared names and types are guaranteed to be present.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declared name. Normalized into the task id by the registry.
    fn name(&self) -> &str;

    /// Ordered parameter schema
    fn parameters(&self) -> Vec<ParamSchema>;

    /// Menu grouping; falls back to the source's tag
    fn category(&self) -> Option<&str> {
        None
    }

    /// One-line summary; falls back to the source's tag, then to the first line of `help`
    fn description(&self) -> Option<&str> {
        None
    }

    /// Long-form help text
    fn help(&self) -> Option<&str> {
        None
    }

    /// Whether the tool wants a progress handle in its context
    fn reports_progress(&self) -> bool {
        false
    }

    /// Execute the tool with bound parameters
    async fn execute(&self, args: BoundArguments, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("abc").to_string(), "abc");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_bound_arguments_accessors() {
        let mut args = BoundArguments::new();
        args.insert("length", Value::Int(12));
        args.insert("specials", Value::Bool(false));
        args.insert("url", Value::from("https://example.com"));

        assert_eq!(args.integer("length").unwrap(), 12);
        assert!(!args.boolean("specials").unwrap());
        assert_eq!(args.string("url").unwrap(), "https://example.com");
        assert!(matches!(args.string("length"), Err(ToolError::InvalidParams(_))));
        assert!(matches!(args.float("missing"), Err(ToolError::InvalidParams(_))));
    }

    #[test]
    fn test_bound_arguments_insert_replaces_in_place() {
        let mut args = BoundArguments::new();
        args.insert("a", Value::Int(1));
        args.insert("b", Value::Int(2));
        args.insert("a", Value::Int(3));

        let names: Vec<_> = args.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(args.get("a"), Some(&Value::Int(3)));
        assert_eq!(args.to_json(), json!({"a": 3, "b": 2}));
    }

    #[test]
    fn test_context_without_progress_falls_back() {
        let ctx = ToolContext::new("inv-1");
        assert!(ctx.progress.is_none());
        // Must not panic without a handle
        ctx.progress().start("work", 2);
        ctx.progress().advance();
        ctx.progress().note("halfway");
        ctx.progress().finish();
    }
}
