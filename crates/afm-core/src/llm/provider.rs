//! LlmProvider trait definition.
//!
//! The single abstraction every model backend implements. Uses native async
//! fn in traits (RPITIT, Rust 2024 edition); implementations live in
//! afm-infra (e.g. `OpenAiCompatibleProvider`).

use afm_types::llm::{CompletionRequest, CompletionResponse, LlmError};

pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai", "anthropic").
    fn name(&self) -> &str;

    /// Model used when the agent document does not name one.
    fn default_model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
