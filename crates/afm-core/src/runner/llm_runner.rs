//! LLM-backed agent runner.
//!
//! A turn starts from the system prompt (role, instructions, output format),
//! the session's prior turns and the new input. While the model answers with
//! tool calls, the calls are executed and their results sent back, for at most
//! `max_iterations` completions. Only the user input and the final answer are
//! kept in session history.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tracing::{Instrument, info_span};

use afm_types::agent::AgentRecord;
use afm_types::config::LlmConfig;
use afm_types::error::RunnerError;
use afm_types::interface::Signature;
use afm_types::llm::{CompletionRequest, CompletionResponse, Message, ToolCall, ToolDefinition};
use afm_types::runner::{AgentInput, AgentOutput};

use crate::llm::LlmProvider;
use crate::schema::{coerce_output, output_schema_instruction, validate_input};
use crate::tools::{NoTools, ToolExecutor};

use super::agent::AgentRunner;

const FALLBACK_NAME: &str = "AFM Agent";

/// Completions per turn when the document sets no `max_iterations`.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

pub struct LlmAgentRunner<P: LlmProvider, T: ToolExecutor = NoTools> {
    record: AgentRecord,
    signature: Signature,
    provider: P,
    tools: T,
    model: String,
    max_tokens: u32,
    temperature: Option<f64>,
    max_iterations: u32,
    connected: AtomicBool,
    /// Tools listed by the executor on connect.
    available: RwLock<Vec<ToolDefinition>>,
    /// Per-session conversation history, created on first use.
    ///
    /// Unbounded: entries are removed only by `clear_history`, so a
    /// long-running server with many distinct session ids grows without limit.
    sessions: DashMap<String, Vec<Message>>,
}

impl<P: LlmProvider> LlmAgentRunner<P> {
    pub fn new(record: AgentRecord, provider: P, settings: &LlmConfig) -> Self {
        let signature = record
            .metadata
            .interfaces
            .as_ref()
            .and_then(|list| list.first())
            .map(|i| i.signature().clone())
            .unwrap_or_default();
        let model = record
            .metadata
            .model
            .as_ref()
            .and_then(|m| m.name.clone())
            .unwrap_or_else(|| provider.default_model().to_string());
        let max_iterations = record
            .metadata
            .max_iterations
            .unwrap_or(DEFAULT_MAX_ITERATIONS)
            .max(1);

        Self {
            record,
            signature,
            provider,
            tools: NoTools,
            model,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            max_iterations,
            connected: AtomicBool::new(false),
            available: RwLock::new(Vec::new()),
            sessions: DashMap::new(),
        }
    }
}

impl<P: LlmProvider, T: ToolExecutor> LlmAgentRunner<P, T> {
    /// Swap in the executor used for tool calls.
    pub fn with_tools<U: ToolExecutor>(self, tools: U) -> LlmAgentRunner<P, U> {
        LlmAgentRunner {
            record: self.record,
            signature: self.signature,
            provider: self.provider,
            tools,
            model: self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            max_iterations: self.max_iterations,
            connected: self.connected,
            available: self.available,
            sessions: self.sessions,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Role and instructions, plus the output format paragraph for
    /// structured output contracts.
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "# Role\n{}\n\n# Instructions\n{}",
            self.record.role, self.record.instructions
        );
        if !self.signature.output.is_string() {
            prompt.push_str("\n\n");
            prompt.push_str(&output_schema_instruction(&self.signature.output));
        }
        prompt
    }

    /// Number of turns stored for `session_id` (user + assistant messages).
    pub fn history_len(&self, session_id: &str) -> usize {
        self.sessions.get(session_id).map_or(0, |h| h.len())
    }

    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        self.available
            .read()
            .expect("tool list lock poisoned")
            .clone()
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
        session_id: &str,
        iteration: u32,
    ) -> Result<CompletionResponse, RunnerError> {
        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            gen_ai.agent.name = %self.name(),
            session.id = %session_id,
            iteration,
        );
        let response = self.provider.complete(request).instrument(span).await?;
        tracing::debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            tool_calls = response.tool_calls.len(),
            "completion received"
        );
        Ok(response)
    }

    /// Result text for one call. Failures become text the model can read.
    async fn execute(&self, call: &ToolCall, tools: &[ToolDefinition]) -> String {
        if !tools.iter().any(|t| t.name == call.name) {
            tracing::warn!(tool = %call.name, "model called an unknown tool");
            return format!("Error: Tool '{}' not found.", call.name);
        }
        let span = info_span!(
            "gen_ai.execute_tool",
            gen_ai.tool.name = %call.name,
            gen_ai.tool.call.id = %call.id,
        );
        match self
            .tools
            .call(&call.name, call.arguments.clone())
            .instrument(span)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                format!("Error executing tool '{}': {e}", call.name)
            }
        }
    }
}

impl<P: LlmProvider, T: ToolExecutor> AgentRunner for LlmAgentRunner<P, T> {
    fn name(&self) -> &str {
        self.record.metadata.name.as_deref().unwrap_or(FALLBACK_NAME)
    }

    fn description(&self) -> Option<&str> {
        self.record.metadata.description.as_deref()
    }

    fn record(&self) -> &AgentRecord {
        &self.record
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    async fn connect(&self) -> Result<(), RunnerError> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }
        let tools = self.tools.connect().await?;
        let tool_count = tools.len();
        *self.available.write().expect("tool list lock poisoned") = tools;

        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(
            agent = %self.name(),
            provider = %self.provider.name(),
            model = %self.model,
            tools = tool_count,
            "agent connected"
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), RunnerError> {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.tools.disconnect().await;
            self.available.write().expect("tool list lock poisoned").clear();
            tracing::info!(agent = %self.name(), "agent disconnected");
        }
        Ok(())
    }

    async fn run(&self, input: AgentInput, session_id: &str) -> Result<AgentOutput, RunnerError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(RunnerError::NotConnected);
        }
        validate_input(&input, &self.signature.input).map_err(RunnerError::InvalidInput)?;

        let prompt = input.to_prompt();
        let tools = self.available_tools();
        let mut request = CompletionRequest {
            model: self.model.clone(),
            messages: self
                .sessions
                .get(session_id)
                .map(|h| h.value().clone())
                .unwrap_or_default(),
            system: Some(self.system_prompt()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: tools.clone(),
        };
        request.messages.push(Message::user(prompt.clone()));

        let mut iteration = 1;
        let response = loop {
            let response = self.complete(&request, session_id, iteration).await?;
            if response.tool_calls.is_empty() {
                break response;
            }
            if iteration >= self.max_iterations {
                let pending: Vec<&str> =
                    response.tool_calls.iter().map(|c| c.name.as_str()).collect();
                tracing::warn!(
                    max_iterations = self.max_iterations,
                    ?pending,
                    "iteration limit reached with pending tool calls"
                );
                break response;
            }

            request.messages.push(Message::assistant_with_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let result = self.execute(call, &tools).await;
                request.messages.push(Message::tool_result(call.id.clone(), result));
            }
            iteration += 1;
        };

        let output = coerce_output(&response.content, &self.signature.output)?;

        self.sessions
            .entry(session_id.to_string())
            .or_default()
            .extend([Message::user(prompt), Message::assistant(response.content)]);

        Ok(output)
    }

    fn clear_history(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }
}
