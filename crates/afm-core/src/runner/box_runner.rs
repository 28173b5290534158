//! BoxAgentRunner -- object-safe dynamic dispatch wrapper for AgentRunner.
//!
//! 1. Define an object-safe `AgentRunnerDyn` trait with boxed futures
//! 2. Blanket-impl `AgentRunnerDyn` for all `T: AgentRunner`
//! 3. `BoxAgentRunner` wraps `Box<dyn AgentRunnerDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use afm_types::agent::AgentRecord;
use afm_types::error::RunnerError;
use afm_types::interface::Signature;
use afm_types::runner::{AgentInput, AgentOutput};

use super::agent::AgentRunner;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`AgentRunner`] with boxed futures.
pub trait AgentRunnerDyn: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn record(&self) -> &AgentRecord;
    fn signature(&self) -> &Signature;
    fn connect_boxed(&self) -> BoxFuture<'_, Result<(), RunnerError>>;
    fn disconnect_boxed(&self) -> BoxFuture<'_, Result<(), RunnerError>>;
    fn run_boxed<'a>(
        &'a self,
        input: AgentInput,
        session_id: &'a str,
    ) -> BoxFuture<'a, Result<AgentOutput, RunnerError>>;
    fn clear_history(&self, session_id: &str);
}

impl<T: AgentRunner> AgentRunnerDyn for T {
    fn name(&self) -> &str {
        AgentRunner::name(self)
    }

    fn description(&self) -> Option<&str> {
        AgentRunner::description(self)
    }

    fn record(&self) -> &AgentRecord {
        AgentRunner::record(self)
    }

    fn signature(&self) -> &Signature {
        AgentRunner::signature(self)
    }

    fn connect_boxed(&self) -> BoxFuture<'_, Result<(), RunnerError>> {
        Box::pin(self.connect())
    }

    fn disconnect_boxed(&self) -> BoxFuture<'_, Result<(), RunnerError>> {
        Box::pin(self.disconnect())
    }

    fn run_boxed<'a>(
        &'a self,
        input: AgentInput,
        session_id: &'a str,
    ) -> BoxFuture<'a, Result<AgentOutput, RunnerError>> {
        Box::pin(self.run(input, session_id))
    }

    fn clear_history(&self, session_id: &str) {
        AgentRunner::clear_history(self, session_id)
    }
}

/// Type-erased agent runner.
///
/// The HTTP layer and the console loop hold an `Arc<BoxAgentRunner>` so the
/// backend can be chosen at runtime and replaced with a fake in tests.
pub struct BoxAgentRunner {
    inner: Box<dyn AgentRunnerDyn>,
}

impl BoxAgentRunner {
    pub fn new<T: AgentRunner + 'static>(runner: T) -> Self {
        Self {
            inner: Box::new(runner),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn description(&self) -> Option<&str> {
        self.inner.description()
    }

    pub fn record(&self) -> &AgentRecord {
        self.inner.record()
    }

    pub fn signature(&self) -> &Signature {
        self.inner.signature()
    }

    pub async fn connect(&self) -> Result<(), RunnerError> {
        self.inner.connect_boxed().await
    }

    pub async fn disconnect(&self) -> Result<(), RunnerError> {
        self.inner.disconnect_boxed().await
    }

    pub async fn run(
        &self,
        input: AgentInput,
        session_id: &str,
    ) -> Result<AgentOutput, RunnerError> {
        self.inner.run_boxed(input, session_id).await
    }

    pub fn clear_history(&self, session_id: &str) {
        self.inner.clear_history(session_id)
    }
}
