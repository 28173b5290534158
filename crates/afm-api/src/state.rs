//! Shared application state for the HTTP layer.

use std::sync::Arc;

use secrecy::SecretString;

use afm_core::runner::BoxAgentRunner;
use afm_core::websub::WebSubSubscriber;
use afm_infra::websub::ReqwestHubClient;
use afm_types::interface::Signature;
use afm_types::template::CompiledTemplate;

/// Subscriber type used by the running server.
pub type Subscriber = WebSubSubscriber<ReqwestHubClient>;

/// State cloned into every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<BoxAgentRunner>,
    pub webhook: Option<Arc<WebhookState>>,
    pub webchat: Option<Arc<WebChatState>>,
}

/// Everything the webhook endpoints need.
pub struct WebhookState {
    pub path: String,
    /// Precompiled prompt template; `None` sends the payload as pretty JSON.
    pub template: Option<CompiledTemplate>,
    pub output_is_string: bool,
    pub secret: Option<SecretString>,
    pub verify_signatures: bool,
    /// Present when the server subscribed to a hub. Verification requests
    /// are refused without one.
    pub subscriber: Option<Arc<Subscriber>>,
}

pub struct WebChatState {
    pub path: String,
    pub signature: Signature,
}
