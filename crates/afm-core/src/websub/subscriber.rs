//! WebSub subscriber: the `Unverified -> Verified -> Unverified` state machine.
//!
//! The subscriber owns one [`SubscriptionConfig`] and its mutable
//! [`SubscriptionState`]. Hub requests go out through a [`HubClient`];
//! verification callbacks arrive through [`WebSubSubscriber::verify_challenge`]
//! from the HTTP layer.

use std::sync::Mutex;

use afm_types::error::SubscriptionError;
use afm_types::websub::{HubMode, SubscriptionConfig, SubscriptionState};

use super::hub::{HubClient, HubRequest, is_accepted};

pub struct WebSubSubscriber<C: HubClient> {
    config: SubscriptionConfig,
    client: C,
    state: Mutex<SubscriptionState>,
}

impl<C: HubClient> WebSubSubscriber<C> {
    pub fn new(config: SubscriptionConfig, client: C) -> Self {
        Self {
            config,
            client,
            state: Mutex::new(SubscriptionState::default()),
        }
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    pub fn is_verified(&self) -> bool {
        self.state().verified
    }

    /// Snapshot of the current handshake state.
    pub fn state(&self) -> SubscriptionState {
        self.state
            .lock()
            .expect("subscription state lock poisoned")
            .clone()
    }

    /// Ask the hub to start a subscription.
    ///
    /// `Ok` means the hub accepted the request; the subscription only becomes
    /// verified once the hub calls back with a matching challenge.
    pub async fn subscribe(&self) -> Result<(), SubscriptionError> {
        let request = HubRequest {
            mode: HubMode::Subscribe,
            topic: self.config.topic.clone(),
            callback: self.config.callback.clone(),
            lease_seconds: Some(self.config.lease_seconds),
            secret: self.config.secret.clone(),
        };
        self.send(request).await?;
        tracing::info!(topic = %self.config.topic, "WebSub subscription request accepted");
        Ok(())
    }

    /// Ask the hub to end the subscription.
    pub async fn unsubscribe(&self) -> Result<(), SubscriptionError> {
        let request = HubRequest {
            mode: HubMode::Unsubscribe,
            topic: self.config.topic.clone(),
            callback: self.config.callback.clone(),
            lease_seconds: None,
            secret: None,
        };
        self.send(request).await?;
        tracing::info!(topic = %self.config.topic, "WebSub unsubscription request sent");
        Ok(())
    }

    /// Unsubscribe if currently verified. Failures are logged, not returned.
    ///
    /// Returns `true` when an unsubscribe request was accepted by the hub.
    pub async fn release(&self) -> bool {
        if !self.is_verified() {
            tracing::debug!(topic = %self.config.topic, "subscription not verified, skipping unsubscribe");
            return false;
        }
        match self.unsubscribe().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(topic = %self.config.topic, error = %e, "WebSub unsubscription failed");
                false
            }
        }
    }

    /// Handle a hub verification callback.
    ///
    /// Returns the challenge to echo back, or `None` when the topic does not
    /// match or the mode is not `subscribe`/`unsubscribe`. State is only
    /// changed on a match.
    pub fn verify_challenge(
        &self,
        mode: &str,
        topic: &str,
        challenge: &str,
        lease_seconds: Option<u64>,
    ) -> Option<String> {
        if topic != self.config.topic {
            tracing::warn!(expected = %self.config.topic, got = %topic, "WebSub topic mismatch");
            return None;
        }
        let mode: HubMode = match mode.parse() {
            Ok(mode) => mode,
            Err(_) => {
                tracing::warn!(mode = %mode, "WebSub verification with unknown mode");
                return None;
            }
        };

        let mut state = self.state.lock().expect("subscription state lock poisoned");
        state.verified = mode == HubMode::Subscribe;
        state.last_challenge = Some(challenge.to_string());
        drop(state);

        match mode {
            HubMode::Subscribe => {
                tracing::info!(topic = %topic, lease_seconds = ?lease_seconds, "WebSub subscription verified");
            }
            HubMode::Unsubscribe => {
                tracing::info!(topic = %topic, "WebSub unsubscription verified");
            }
        }
        Some(challenge.to_string())
    }

    async fn send(&self, request: HubRequest) -> Result<(), SubscriptionError> {
        let status = self.client.send(&self.config.hub, &request).await?;
        if is_accepted(status) {
            Ok(())
        } else {
            Err(SubscriptionError::Rejected {
                mode: request.mode.to_string(),
                status,
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Hub double: replays scripted responses and records every request.
    #[derive(Clone, Default)]
    pub(crate) struct FakeHub {
        pub responses: Arc<Mutex<VecDeque<Result<u16, String>>>>,
        pub requests: Arc<Mutex<Vec<(String, HubRequest)>>>,
    }

    impl FakeHub {
        pub fn with_responses(responses: Vec<Result<u16, String>>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into())),
                requests: Arc::default(),
            }
        }

        pub fn sent(&self) -> Vec<(String, HubRequest)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HubClient for FakeHub {
        async fn send(&self, hub: &str, request: &HubRequest) -> Result<u16, SubscriptionError> {
            self.requests
                .lock()
                .unwrap()
                .push((hub.to_string(), request.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(202))
                .map_err(SubscriptionError::Transport)
        }
    }

    pub(crate) fn config() -> SubscriptionConfig {
        SubscriptionConfig {
            hub: "https://hub.example.com".to_string(),
            topic: "https://example.com/feed".to_string(),
            callback: "https://agent.example.com/webhook".to_string(),
            secret: Some("s3cret".to_string()),
            lease_seconds: 3600,
            protocol: "websub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscribe_sends_form_and_stays_unverified() {
        let hub = FakeHub::default();
        let subscriber = WebSubSubscriber::new(config(), hub.clone());

        subscriber.subscribe().await.unwrap();

        let sent = hub.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "https://hub.example.com");
        assert_eq!(sent[0].1.mode, HubMode::Subscribe);
        assert_eq!(sent[0].1.lease_seconds, Some(3600));
        assert_eq!(sent[0].1.secret.as_deref(), Some("s3cret"));
        assert!(!subscriber.is_verified());
    }

    #[tokio::test]
    async fn test_subscribe_rejected_status() {
        let hub = FakeHub::with_responses(vec![Ok(500)]);
        let subscriber = WebSubSubscriber::new(config(), hub);
        let err = subscriber.subscribe().await.unwrap_err();
        assert!(matches!(err, SubscriptionError::Rejected { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_subscribe_transport_failure() {
        let hub = FakeHub::with_responses(vec![Err("connection refused".to_string())]);
        let subscriber = WebSubSubscriber::new(config(), hub);
        let err = subscriber.subscribe().await.unwrap_err();
        assert!(matches!(err, SubscriptionError::Transport(_)));
    }

    #[test]
    fn test_challenge_echo_verifies() {
        let subscriber = WebSubSubscriber::new(config(), FakeHub::default());
        let echoed =
            subscriber.verify_challenge("subscribe", "https://example.com/feed", "abc123", None);
        assert_eq!(echoed.as_deref(), Some("abc123"));
        let state = subscriber.state();
        assert!(state.verified);
        assert_eq!(state.last_challenge.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_topic_mismatch_leaves_state_unchanged() {
        let subscriber = WebSubSubscriber::new(config(), FakeHub::default());
        let echoed = subscriber.verify_challenge("subscribe", "https://other/feed", "abc123", None);
        assert!(echoed.is_none());
        assert_eq!(subscriber.state(), SubscriptionState::default());
    }

    #[test]
    fn test_unsubscribe_challenge_returns_to_unverified() {
        let subscriber = WebSubSubscriber::new(config(), FakeHub::default());
        subscriber.verify_challenge("subscribe", "https://example.com/feed", "one", Some(60));
        assert!(subscriber.is_verified());
        let echoed =
            subscriber.verify_challenge("unsubscribe", "https://example.com/feed", "two", None);
        assert_eq!(echoed.as_deref(), Some("two"));
        assert!(!subscriber.is_verified());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let subscriber = WebSubSubscriber::new(config(), FakeHub::default());
        let echoed = subscriber.verify_challenge("denied", "https://example.com/feed", "x", None);
        assert!(echoed.is_none());
        assert!(!subscriber.is_verified());
    }

    #[tokio::test]
    async fn test_release_skips_unverified() {
        let hub = FakeHub::default();
        let subscriber = WebSubSubscriber::new(config(), hub.clone());
        assert!(!subscriber.release().await);
        assert!(hub.sent().is_empty());
    }

    #[tokio::test]
    async fn test_release_unsubscribes_when_verified() {
        let hub = FakeHub::default();
        let subscriber = WebSubSubscriber::new(config(), hub.clone());
        subscriber.verify_challenge("subscribe", "https://example.com/feed", "c", None);

        assert!(subscriber.release().await);
        let sent = hub.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.mode, HubMode::Unsubscribe);
        assert!(sent[0].1.secret.is_none());
    }

    #[tokio::test]
    async fn test_release_swallows_hub_failure() {
        let hub = FakeHub::with_responses(vec![Err("timeout".to_string())]);
        let subscriber = WebSubSubscriber::new(config(), hub);
        subscriber.verify_challenge("subscribe", "https://example.com/feed", "c", None);
        assert!(!subscriber.release().await);
    }
}
