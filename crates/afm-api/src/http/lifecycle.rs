//! Background WebSub subscription task and callback URL resolution.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use afm_core::websub::{HubClient, RetryPolicy, SubscribeOutcome, WebSubSubscriber, subscribe_with_retry};

/// The tracked startup subscription loop.
///
/// Holds the cancellation token and join handle so shutdown can stop a
/// pending retry delay and wait for the loop to finish.
pub struct SubscriptionTask {
    cancel: CancellationToken,
    handle: JoinHandle<SubscribeOutcome>,
}

impl SubscriptionTask {
    pub fn spawn<C: HubClient + 'static>(
        subscriber: Arc<WebSubSubscriber<C>>,
        policy: RetryPolicy,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let outcome = subscribe_with_retry(&subscriber, policy, &token).await;
            tracing::debug!(?outcome, "subscription task finished");
            outcome
        });
        Self { cancel, handle }
    }

    /// Cancel the loop and wait for it. `None` if the task panicked.
    pub async fn shutdown(self) -> Option<SubscribeOutcome> {
        self.cancel.cancel();
        match self.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "subscription task did not finish cleanly");
                None
            }
        }
    }
}

/// Callback URL sent to the hub.
///
/// Uses `explicit` when the document sets one, otherwise derives it from the
/// listen address, replacing the wildcard host with `localhost`.
pub fn callback_url(explicit: Option<&str>, host: &str, port: u16, path: &str) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }
    let host = if host == "0.0.0.0" { "localhost" } else { host };
    let url = format!("http://{host}:{port}{path}");
    tracing::warn!(
        callback = %url,
        "no subscription callback configured, derived one from the listen address; \
         hubs outside this machine will not reach it"
    );
    url
}
