//! AgentRunner trait definition.
//!
//! Every interface (console, web chat, webhook) talks to the agent only
//! through this trait, never through a concrete execution backend.

use afm_types::agent::AgentRecord;
use afm_types::error::RunnerError;
use afm_types::interface::Signature;
use afm_types::runner::{AgentInput, AgentOutput};

/// Session used when the caller does not supply one.
pub const DEFAULT_SESSION: &str = "default";

pub trait AgentRunner: Send + Sync {
    /// Agent name from the document, or a generic fallback.
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str>;

    /// The parsed document this runner was built from.
    fn record(&self) -> &AgentRecord;

    /// Input/output contract of the agent's primary interface.
    fn signature(&self) -> &Signature;

    /// Acquire external resources before the first turn.
    fn connect(&self) -> impl std::future::Future<Output = Result<(), RunnerError>> + Send;

    /// Release external resources. Safe to call more than once.
    fn disconnect(&self) -> impl std::future::Future<Output = Result<(), RunnerError>> + Send;

    /// Execute one turn in `session_id`.
    fn run(
        &self,
        input: AgentInput,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<AgentOutput, RunnerError>> + Send;

    /// Forget the conversation history of `session_id`.
    fn clear_history(&self, session_id: &str);
}
