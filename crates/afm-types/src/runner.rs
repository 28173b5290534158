//! Inputs and outputs of a single agent turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an interface hands to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentInput {
    Text(String),
    Structured(Value),
}

impl AgentInput {
    /// The text sent to the model. Structured input is rendered as pretty JSON.
    pub fn to_prompt(&self) -> String {
        match self {
            AgentInput::Text(s) => s.clone(),
            AgentInput::Structured(v) => {
                serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
            }
        }
    }
}

impl From<String> for AgentInput {
    fn from(s: String) -> Self {
        AgentInput::Text(s)
    }
}

impl From<&str> for AgentInput {
    fn from(s: &str) -> Self {
        AgentInput::Text(s.to_string())
    }
}

/// What the agent hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentOutput {
    Text(String),
    Structured(Value),
}

impl AgentOutput {
    /// Collapse into a JSON value; text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            AgentOutput::Text(s) => Value::String(s),
            AgentOutput::Structured(v) => v,
        }
    }
}
