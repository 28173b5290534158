//! OpenAI-compatible LLM provider.
//!
//! One [`OpenAiCompatibleProvider`] serves OpenAI and any endpoint speaking
//! the chat completions protocol (Anthropic's compatibility layer, local
//! gateways) via a configurable base URL.

pub mod config;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestToolMessage,
    ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionTool, ChatCompletionTools,
    CreateChatCompletionRequest, FinishReason, FunctionCall, FunctionObject,
};
use secrecy::ExposeSecret;
use serde_json::Value;

use afm_core::llm::LlmProvider;
use afm_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, MessageRole, StopReason, ToolCall,
    ToolDefinition, Usage,
};

use self::config::OpenAiCompatConfig;

/// Provider for any OpenAI-compatible API.
///
/// Does not derive Debug: the client holds the API key.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    base_url: String,
    model: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            base_url: config.base_url,
            model: config.model,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request(&self, request: &CompletionRequest) -> CreateChatCompletionRequest {
        let messages = request
            .system
            .as_deref()
            .map(system_message)
            .into_iter()
            .chain(request.messages.iter().map(to_chat_message))
            .collect();

        let model = match request.model.as_str() {
            "" => self.model.clone(),
            explicit => explicit.to_string(),
        };

        let tools = (!request.tools.is_empty())
            .then(|| request.tools.iter().map(to_chat_tool).collect());

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            tools,
            ..Default::default()
        }
    }
}

fn system_message(content: &str) -> ChatCompletionRequestMessage {
    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
        content: ChatCompletionRequestSystemMessageContent::Text(content.to_string()),
        name: None,
    })
}

fn to_chat_message(message: &Message) -> ChatCompletionRequestMessage {
    let text = message.content.clone();
    match message.role {
        MessageRole::System => system_message(&text),
        MessageRole::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(text),
            name: None,
        }),
        #[allow(deprecated)]
        MessageRole::Assistant => {
            let tool_calls = (!message.tool_calls.is_empty())
                .then(|| message.tool_calls.iter().map(to_chat_tool_call).collect());
            // An assistant turn that only calls tools has no text.
            let content = (!text.is_empty() || tool_calls.is_none())
                .then_some(ChatCompletionRequestAssistantMessageContent::Text(text));
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content,
                refusal: None,
                name: None,
                audio: None,
                tool_calls,
                function_call: None,
            })
        }
        MessageRole::Tool => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
            content: ChatCompletionRequestToolMessageContent::Text(text),
            tool_call_id: message.tool_call_id.clone().unwrap_or_default(),
        }),
    }
}

fn to_chat_tool(tool: &ToolDefinition) -> ChatCompletionTools {
    ChatCompletionTools::Function(ChatCompletionTool {
        function: FunctionObject {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: Some(tool.parameters.clone()),
            strict: None,
        },
    })
}

fn to_chat_tool_call(call: &ToolCall) -> ChatCompletionMessageToolCalls {
    ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
        id: call.id.clone(),
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        },
    })
}

/// Function calls from a response. Arguments that are not valid JSON are
/// passed on as a JSON string; custom tool calls are skipped.
fn from_chat_tool_calls(calls: &[ChatCompletionMessageToolCalls]) -> Vec<ToolCall> {
    calls
        .iter()
        .filter_map(|call| match call {
            ChatCompletionMessageToolCalls::Function(call) => Some(ToolCall {
                id: call.id.clone(),
                name: call.function.name.clone(),
                arguments: match call.function.arguments.trim() {
                    "" => Value::Object(Default::default()),
                    raw => serde_json::from_str(raw)
                        .unwrap_or_else(|_| Value::String(raw.to_string())),
                },
            }),
            ChatCompletionMessageToolCalls::Custom(call) => {
                tracing::warn!(id = %call.id, "ignoring custom tool call");
                None
            }
        })
        .collect()
}

fn stop_reason(reason: &FinishReason) -> StopReason {
    match reason {
        FinishReason::Stop => StopReason::EndTurn,
        FinishReason::Length => StopReason::MaxTokens,
        FinishReason::ContentFilter => StopReason::ContentFilter,
        FinishReason::ToolCalls | FinishReason::FunctionCall => StopReason::ToolUse,
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = self.build_request(request);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        let choice = response.choices.first();
        let content = choice
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        let tool_calls = choice
            .and_then(|c| c.message.tool_calls.as_deref())
            .map(from_chat_tool_calls)
            .unwrap_or_default();

        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map_or(StopReason::EndTurn, stop_reason);

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        tracing::debug!(
            provider = %self.provider_name,
            model = %response.model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "completion received"
        );

        Ok(CompletionResponse {
            id: response.id,
            content,
            model: response.model,
            stop_reason,
            usage,
            tool_calls,
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else {
                LlmError::Provider {
                    message: api_err.message.clone(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => LlmError::AuthenticationFailed,
            Some(429) => LlmError::RateLimited {
                retry_after_ms: None,
            },
            _ => LlmError::Provider {
                message: err.to_string(),
            },
        },
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(OpenAiCompatConfig {
            provider_name: "openai".into(),
            base_url: base_url.into(),
            api_key: SecretString::from("sk-test".to_string()),
            model: "gpt-4o".into(),
        })
    }

    fn request(model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: vec![Message::user("Hello"), Message::assistant("Hi there!")],
            system: Some("Be helpful".to_string()),
            max_tokens: 1024,
            temperature: Some(0.2),
            tools: Vec::new(),
        }
    }

    #[test]
    fn test_build_request_messages() {
        let p = provider(config::OPENAI_BASE_URL);
        let oai_req = p.build_request(&request("gpt-4o-mini"));
        assert_eq!(oai_req.model, "gpt-4o-mini");
        // 1 system + 2 conversation
        assert_eq!(oai_req.messages.len(), 3);
        assert_eq!(oai_req.max_completion_tokens, Some(1024));
    }

    #[test]
    fn test_build_request_with_tool_round_trip() {
        let p = provider(config::OPENAI_BASE_URL);
        let mut req = request("gpt-4o");
        req.tools = vec![ToolDefinition {
            name: "search".into(),
            description: Some("Search issues".into()),
            parameters: serde_json::json!({"type": "object", "properties": {"q": {"type": "string"}}}),
        }];
        req.messages.push(Message::assistant_with_calls(
            "",
            vec![ToolCall {
                id: "call_1".into(),
                name: "search".into(),
                arguments: serde_json::json!({"q": "crash"}),
            }],
        ));
        req.messages.push(Message::tool_result("call_1", "3 issues"));

        let body = serde_json::to_value(p.build_request(&req)).unwrap();
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "search");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 5);
        let assistant = &messages[3];
        assert!(assistant.get("content").is_none());
        assert_eq!(assistant["tool_calls"][0]["id"], "call_1");
        assert_eq!(assistant["tool_calls"][0]["function"]["arguments"], r#"{"q":"crash"}"#);
        assert_eq!(messages[4]["role"], "tool");
        assert_eq!(messages[4]["tool_call_id"], "call_1");
        assert_eq!(messages[4]["content"], "3 issues");
    }

    #[test]
    fn test_build_request_without_tools_omits_field() {
        let p = provider(config::OPENAI_BASE_URL);
        assert!(p.build_request(&request("gpt-4o")).tools.is_none());
    }

    #[tokio::test]
    async fn test_complete_parses_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("\"tools\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-2",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "gpt-4o",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [
                            {"id": "call_a", "type": "function",
                             "function": {"name": "search", "arguments": "{\"q\":\"bug\"}"}},
                            {"id": "call_b", "type": "function",
                             "function": {"name": "list", "arguments": ""}}
                        ]
                    },
                    "logprobs": null,
                    "finish_reason": "tool_calls"
                }],
                "usage": {"prompt_tokens": 20, "completion_tokens": 8, "total_tokens": 28}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let p = provider(&format!("{}/v1", server.uri()));
        let mut req = request("gpt-4o");
        req.tools = vec![ToolDefinition {
            name: "search".into(),
            description: None,
            parameters: serde_json::json!({"type": "object"}),
        }];
        let response = p.complete(&req).await.unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].name, "search");
        assert_eq!(response.tool_calls[0].arguments, serde_json::json!({"q": "bug"}));
        assert_eq!(response.tool_calls[1].arguments, serde_json::json!({}));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(stop_reason(&FinishReason::Length), StopReason::MaxTokens);
        assert_eq!(stop_reason(&FinishReason::ContentFilter), StopReason::ContentFilter);
        assert_eq!(stop_reason(&FinishReason::ToolCalls), StopReason::ToolUse);
    }

    #[test]
    fn test_build_request_empty_model_uses_default() {
        let p = provider(config::OPENAI_BASE_URL);
        let oai_req = p.build_request(&request(""));
        assert_eq!(oai_req.model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_string_contains("Be helpful"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1_700_000_000,
                "model": "gpt-4o",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hello back", "refusal": null},
                    "logprobs": null,
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let p = provider(&format!("{}/v1", server.uri()));
        let response = p.complete(&request("gpt-4o")).await.unwrap();
        assert_eq!(response.content, "Hello back");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 3);
    }

    #[test]
    fn test_map_openai_error_api_auth() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Incorrect API key provided".to_string(),
            r#type: Some("invalid_request_error".to_string()),
            param: None,
            code: Some("invalid_api_key".to_string()),
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_map_openai_error_rate_limit() {
        use async_openai::error::{ApiError, OpenAIError};
        let api_err = ApiError {
            message: "Rate limit exceeded".to_string(),
            r#type: Some("rate_limit_error".to_string()),
            param: None,
            code: None,
        };
        let err = map_openai_error(OpenAIError::ApiError(api_err));
        assert!(matches!(err, LlmError::RateLimited { .. }));
    }

    #[test]
    fn test_map_openai_error_invalid_argument() {
        use async_openai::error::OpenAIError;
        let err = map_openai_error(OpenAIError::InvalidArgument("bad arg".to_string()));
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }
}
