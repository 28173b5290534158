//! Agent execution.
//!
//! - `AgentRunner`: RPITIT port every interface calls into
//! - `BoxAgentRunner`: object-safe wrapper for dynamic dispatch
//! - `LlmAgentRunner`: the LLM-backed implementation
//! - `response`: shaping runner output into HTTP bodies

pub mod agent;
pub mod box_runner;
pub mod llm_runner;
pub mod response;

pub use agent::{AgentRunner, DEFAULT_SESSION};
pub use box_runner::BoxAgentRunner;
pub use llm_runner::LlmAgentRunner;
