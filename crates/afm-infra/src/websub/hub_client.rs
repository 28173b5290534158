//! reqwest-backed [`HubClient`].

use std::time::Duration;

use afm_core::websub::{HubClient, HubRequest};
use afm_types::agent::ClientAuthentication;
use afm_types::error::SubscriptionError;

/// Default timeout for a single hub request.
pub const DEFAULT_HUB_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends form-encoded subscription requests to a WebSub hub.
pub struct ReqwestHubClient {
    http: reqwest::Client,
    timeout: Duration,
    authentication: Option<ClientAuthentication>,
}

impl ReqwestHubClient {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("afm/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http,
            timeout,
            authentication: None,
        }
    }

    /// Attach credentials sent with every hub request.
    pub fn with_authentication(mut self, authentication: Option<ClientAuthentication>) -> Self {
        self.authentication = authentication;
        self
    }
}

impl Default for ReqwestHubClient {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_TIMEOUT)
    }
}

impl HubClient for ReqwestHubClient {
    async fn send(&self, hub: &str, request: &HubRequest) -> Result<u16, SubscriptionError> {
        let builder = self
            .http
            .post(hub)
            .timeout(self.timeout)
            .form(&request.form_fields());
        let builder = apply_authentication(builder, self.authentication.as_ref());

        let response = builder
            .send()
            .await
            .map_err(|e| SubscriptionError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(hub = %hub, status, body = %body, "hub rejected request");
        }
        Ok(status)
    }
}

fn apply_authentication(
    builder: reqwest::RequestBuilder,
    authentication: Option<&ClientAuthentication>,
) -> reqwest::RequestBuilder {
    let Some(auth) = authentication else {
        return builder;
    };
    match auth.kind.to_lowercase().as_str() {
        "bearer" => match &auth.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        },
        "basic" => match &auth.username {
            Some(user) => builder.basic_auth(user, auth.password.as_deref()),
            None => builder,
        },
        "api-key" => match &auth.api_key {
            Some(key) => builder.header("X-API-Key", key),
            None => builder,
        },
        other => {
            tracing::warn!(kind = %other, "unsupported hub authentication type, sending without credentials");
            builder
        }
    }
}
