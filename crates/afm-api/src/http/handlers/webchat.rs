//! Web chat endpoint.
//!
//! A string-to-string agent talks plain text; any other signature talks JSON.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use afm_core::runner::DEFAULT_SESSION;
use afm_core::runner::response::{WEBCHAT_RESPONSE_KEY, output_text, shape_output};
use afm_types::runner::AgentInput;

use crate::http::error::AppError;
use crate::state::AppState;

/// Header carrying the caller's conversation id.
pub const SESSION_HEADER: &str = "x-session-id";

/// POST {webchat_path} - Run one chat turn.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let webchat = state
        .webchat
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Web chat interface not configured".to_string()))?;

    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SESSION)
        .to_string();
    let content_type = media_type(&headers);
    let signature = &webchat.signature;

    if signature.input.is_string() && signature.output.is_string() {
        let message = plain_message(content_type.as_deref(), &body)?;
        let output = state
            .runner
            .run(AgentInput::Text(message), &session_id)
            .await?;
        return Ok((
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            output_text(output),
        )
            .into_response());
    }

    if content_type.as_deref() != Some("application/json") {
        return Err(AppError::BadRequest(
            "Content-Type must be application/json".to_string(),
        ));
    }
    let value: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid JSON body".to_string()))?;

    let input = if signature.input.is_string() {
        match value {
            Value::String(s) => AgentInput::Text(s),
            _ => {
                return Err(AppError::BadRequest(
                    "Expected a JSON string as input".to_string(),
                ));
            }
        }
    } else {
        AgentInput::Structured(value)
    };

    let output = state.runner.run(input, &session_id).await?;
    Ok(Json(shape_output(
        output,
        signature.output.is_string(),
        WEBCHAT_RESPONSE_KEY,
    ))
    .into_response())
}

/// Lowercased media type without parameters.
fn media_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty())
}

/// Extract the chat message for a string-to-string agent.
fn plain_message(content_type: Option<&str>, body: &[u8]) -> Result<String, AppError> {
    let message = match content_type {
        None | Some("text/plain") => std::str::from_utf8(body)
            .map_err(|_| AppError::BadRequest("Body must be valid UTF-8".to_string()))?
            .to_string(),
        Some("application/json") => match serde_json::from_slice::<Value>(body) {
            Ok(Value::String(s)) => s,
            _ => {
                return Err(AppError::BadRequest(
                    "Expected a JSON string as input".to_string(),
                ));
            }
        },
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unsupported Content-Type '{other}', use text/plain or application/json"
            )));
        }
    };

    if message.trim().is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_media_type_strips_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Text/Plain; charset=utf-8"),
        );
        assert_eq!(media_type(&headers).as_deref(), Some("text/plain"));
        assert!(media_type(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_plain_message_accepts_text_and_json_string() {
        assert_eq!(plain_message(None, b"hello").unwrap(), "hello");
        assert_eq!(
            plain_message(Some("application/json"), b"\"hi there\"").unwrap(),
            "hi there"
        );
    }

    #[test]
    fn test_plain_message_rejections() {
        assert!(matches!(
            plain_message(Some("text/plain"), b"   \n"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            plain_message(Some("text/plain"), &[0xff, 0xfe]),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            plain_message(Some("application/json"), b"{\"a\": 1}"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            plain_message(Some("application/xml"), b"<a/>"),
            Err(AppError::BadRequest(_))
        ));
    }
}
