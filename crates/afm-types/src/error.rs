use thiserror::Error;

use crate::llm::LlmError;

/// Errors raised while loading an AFM document.
#[derive(Debug, Error)]
pub enum AfmError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("variable resolution error: {0}")]
    VariableResolution(String),

    #[error("interface '{requested}' not found (available: {available})")]
    InterfaceNotFound { requested: String, available: String },

    #[error(transparent)]
    Template(#[from] TemplateCompileError),
}

/// A field-path expression could not be resolved against a JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot access '{path}': {reason}")]
pub struct PathAccessError {
    pub path: String,
    pub reason: String,
}

impl PathAccessError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Malformed `${http:...}` syntax in a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid template '{template}': {reason}")]
pub struct TemplateCompileError {
    pub template: String,
    pub reason: String,
}

/// A payload reference could not be resolved while rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template evaluation failed: {source}")]
pub struct TemplateEvalError {
    #[source]
    pub source: PathAccessError,
}

impl From<PathAccessError> for TemplateEvalError {
    fn from(source: PathAccessError) -> Self {
        Self { source }
    }
}

/// Soft failures of the WebSub handshake. Logged, never surfaced over HTTP.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("hub request failed: {0}")]
    Transport(String),

    #[error("hub rejected {mode} request with status {status}")]
    Rejected { mode: String, status: u16 },

    #[error("subscription is missing '{0}'")]
    MissingField(&'static str),
}

/// Structured output did not satisfy the declared output schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("output validation failed: {0}")]
pub struct OutputValidationError(pub String);

/// Failures talking to MCP tool servers.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("MCP server '{server}': {message}")]
    Connection { server: String, message: String },

    #[error("MCP server '{server}' authentication: {message}")]
    Authentication { server: String, message: String },

    #[error("tool '{tool}' failed: {message}")]
    Call { tool: String, message: String },

    #[error("tool '{0}' not found")]
    NotFound(String),
}

/// Errors from executing an agent turn.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Output(#[from] OutputValidationError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("runner not connected")]
    NotConnected,

    #[error(transparent)]
    Tool(#[from] ToolError),
}
