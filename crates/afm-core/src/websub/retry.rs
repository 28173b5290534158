//! Bounded, cancellable subscribe retry loop.
//!
//! Fixed delay between attempts. Exhausting the attempts is logged and
//! reported, never raised: subscription is best-effort and the webhook
//! endpoint keeps serving regardless.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use afm_types::config::WebSubConfig;

use super::hub::HubClient;
use super::subscriber::WebSubSubscriber;

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &WebSubConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }

    /// `attempt` is 1-based (the first request is attempt 1).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Final result of [`subscribe_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// The hub accepted the request on the given attempt.
    Accepted { attempt: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32 },
    /// `cancel` fired before the loop finished.
    Cancelled,
}

/// Send subscribe requests until one is accepted, attempts run out, or
/// `cancel` fires. Cancellation interrupts both in-flight requests and the
/// delay between attempts.
pub async fn subscribe_with_retry<C: HubClient>(
    subscriber: &WebSubSubscriber<C>,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> SubscribeOutcome {
    let topic = &subscriber.config().topic;
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return SubscribeOutcome::Cancelled,
            result = subscriber.subscribe() => result,
        };

        match result {
            Ok(()) => return SubscribeOutcome::Accepted { attempt },
            Err(e) => tracing::warn!(
                topic = %topic,
                attempt,
                max_attempts = policy.max_attempts,
                error = %e,
                "WebSub subscription attempt failed"
            ),
        }

        if !policy.should_retry(attempt) {
            tracing::error!(
                topic = %topic,
                attempts = attempt,
                "failed to subscribe to WebSub hub, giving up"
            );
            return SubscribeOutcome::Exhausted { attempts: attempt };
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return SubscribeOutcome::Cancelled,
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websub::subscriber::tests::{FakeHub, config};
    use std::sync::Arc;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(5));
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn test_policy_from_config_never_zero_attempts() {
        let cfg = WebSubConfig {
            max_attempts: 0,
            ..WebSubConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&cfg).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepted_on_first_attempt() {
        let hub = FakeHub::default();
        let subscriber = WebSubSubscriber::new(config(), hub.clone());
        let outcome =
            subscribe_with_retry(&subscriber, RetryPolicy::default(), &CancellationToken::new())
                .await;
        assert_eq!(outcome, SubscribeOutcome::Accepted { attempt: 1 });
        assert_eq!(hub.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_after_failures() {
        let hub = FakeHub::with_responses(vec![Ok(503), Err("reset".to_string()), Ok(204)]);
        let subscriber = WebSubSubscriber::new(config(), hub.clone());
        let start = tokio::time::Instant::now();

        let outcome =
            subscribe_with_retry(&subscriber, RetryPolicy::default(), &CancellationToken::new())
                .await;

        assert_eq!(outcome, SubscribeOutcome::Accepted { attempt: 3 });
        assert_eq!(hub.sent().len(), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let hub = FakeHub::with_responses(vec![Ok(500), Ok(500), Ok(500), Ok(202)]);
        let subscriber = WebSubSubscriber::new(config(), hub.clone());
        let outcome =
            subscribe_with_retry(&subscriber, RetryPolicy::default(), &CancellationToken::new())
                .await;
        assert_eq!(outcome, SubscribeOutcome::Exhausted { attempts: 3 });
        assert_eq!(hub.sent().len(), 3);
        assert!(!subscriber.is_verified());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_delay() {
        let hub = FakeHub::with_responses(vec![Ok(500), Ok(500), Ok(500)]);
        let subscriber = Arc::new(WebSubSubscriber::new(config(), hub.clone()));
        let cancel = CancellationToken::new();
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(3600),
        };

        let task = {
            let subscriber = Arc::clone(&subscriber);
            let cancel = cancel.clone();
            tokio::spawn(async move { subscribe_with_retry(&subscriber, policy, &cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        let outcome = task.await.unwrap();

        assert_eq!(outcome, SubscribeOutcome::Cancelled);
        assert_eq!(hub.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_sends_nothing() {
        let hub = FakeHub::default();
        let subscriber = WebSubSubscriber::new(config(), hub.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let outcome = subscribe_with_retry(&subscriber, RetryPolicy::default(), &cancel).await;
        assert_eq!(outcome, SubscribeOutcome::Cancelled);
        assert!(hub.sent().is_empty());
    }
}
