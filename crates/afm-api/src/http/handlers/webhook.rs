//! Webhook endpoints: hub verification (GET) and event delivery (POST).
//!
//! Both share the webhook interface's path. POST reads the raw body first so
//! the HMAC signature is checked against exactly the bytes the sender signed.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;

use afm_core::runner::DEFAULT_SESSION;
use afm_core::runner::response::webhook_response;
use afm_core::template;
use afm_infra::webhook::{SIGNATURE_HEADERS, SignatureAlgorithm, verify_signature};
use afm_types::runner::AgentInput;
use afm_types::template::HeaderSet;

use crate::http::error::AppError;
use crate::state::{AppState, WebhookState};

/// Query parameters of a hub verification callback.
#[derive(Debug, Deserialize)]
pub struct VerificationQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.topic")]
    pub topic: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
    #[serde(rename = "hub.lease_seconds")]
    pub lease_seconds: Option<String>,
}

fn webhook_state(state: &AppState) -> Result<&WebhookState, AppError> {
    state
        .webhook
        .as_deref()
        .ok_or_else(|| AppError::NotFound("Webhook interface not configured".to_string()))
}

/// GET {webhook_path} - Answer a WebSub verification request.
pub async fn verify_subscription(
    State(state): State<AppState>,
    Query(query): Query<VerificationQuery>,
) -> Result<Response, AppError> {
    let webhook = webhook_state(&state)?;

    let (Some(mode), Some(topic), Some(challenge)) = (query.mode, query.topic, query.challenge)
    else {
        return Err(AppError::BadRequest(
            "hub.mode, hub.topic and hub.challenge are required".to_string(),
        ));
    };

    if mode != "subscribe" && mode != "unsubscribe" {
        return Err(AppError::NotFound("Invalid mode".to_string()));
    }

    let lease_seconds = query.lease_seconds.and_then(|s| s.parse::<u64>().ok());

    let echoed = match &webhook.subscriber {
        Some(subscriber) => subscriber
            .verify_challenge(&mode, &topic, &challenge, lease_seconds)
            .ok_or_else(|| AppError::NotFound("Verification failed".to_string()))?,
        None => {
            tracing::warn!(topic = %topic, "verification request received but no subscriber is running");
            return Err(AppError::NotFound("No subscriber configured".to_string()));
        }
    };

    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], echoed).into_response())
}

/// POST {webhook_path} - Receive an event and run the agent on it.
pub async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let webhook = webhook_state(&state)?;

    if webhook.verify_signatures
        && let Some(secret) = &webhook.secret
    {
        let signature = signature_header(&headers);
        if !verify_signature(
            &body,
            signature,
            secret.expose_secret(),
            SignatureAlgorithm::default(),
        ) {
            tracing::warn!(path = %webhook.path, "rejected webhook with invalid signature");
            return Err(AppError::Unauthorized("Invalid signature".to_string()));
        }
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid JSON payload".to_string()))?;

    let prompt = match &webhook.template {
        Some(compiled) => {
            let header_set = header_set(&headers);
            template::evaluate(compiled, &payload, Some(&header_set)).map_err(|e| {
                tracing::warn!(error = %e, "webhook prompt template evaluation failed");
                AppError::BadRequest("Failed to evaluate prompt template".to_string())
            })?
        }
        None => serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string()),
    };

    let output = state
        .runner
        .run(AgentInput::Text(prompt), DEFAULT_SESSION)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(webhook_response(output, webhook.output_is_string)))
}

/// First non-empty signature header, preferring SHA-256.
fn signature_header(headers: &HeaderMap) -> Option<&str> {
    SIGNATURE_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
    })
}

/// Copy request headers into a [`HeaderSet`], skipping non-UTF-8 values.
fn header_set(headers: &HeaderMap) -> HeaderSet {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_set_joins_repeated_values() {
        let mut headers = HeaderMap::new();
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        headers.insert("x-event", HeaderValue::from_static("push"));

        let set = header_set(&headers);
        assert_eq!(set.get("X-Tag").as_deref(), Some("a, b"));
        assert_eq!(set.get("x-event").as_deref(), Some("push"));
    }

    #[test]
    fn test_signature_header_falls_back_past_unusable_sha256() {
        let mut headers = HeaderMap::new();
        headers.insert("x-hub-signature-256", HeaderValue::from_static(""));
        headers.insert("x-hub-signature", HeaderValue::from_static("sha1=abc"));
        assert_eq!(signature_header(&headers), Some("sha1=abc"));

        headers.insert(
            "x-hub-signature-256",
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );
        assert_eq!(signature_header(&headers), Some("sha1=abc"));

        headers.insert("x-hub-signature-256", HeaderValue::from_static("sha256=def"));
        assert_eq!(signature_header(&headers), Some("sha256=def"));
    }

    #[test]
    fn test_signature_header_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-hub-signature", HeaderValue::from_static("  "));
        assert_eq!(signature_header(&headers), None);
    }

    #[test]
    fn test_header_set_skips_opaque_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-bin", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());
        assert!(header_set(&headers).get("x-bin").is_none());
    }
}
