//! HubClient trait definition.
//!
//! The subscriber talks to a WebSub hub only through this port. The HTTP
//! implementation lives in afm-infra (`ReqwestHubClient`).

use afm_types::error::SubscriptionError;
use afm_types::websub::HubMode;

/// A subscribe or unsubscribe request sent to a hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubRequest {
    pub mode: HubMode,
    pub topic: String,
    pub callback: String,
    pub lease_seconds: Option<u64>,
    pub secret: Option<String>,
}

impl HubRequest {
    /// The form-encoded body fields, in wire order.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("hub.mode", self.mode.as_str().to_string()),
            ("hub.topic", self.topic.clone()),
            ("hub.callback", self.callback.clone()),
        ];
        if let Some(lease) = self.lease_seconds {
            fields.push(("hub.lease_seconds", lease.to_string()));
        }
        if let Some(secret) = &self.secret {
            fields.push(("hub.secret", secret.clone()));
        }
        fields
    }
}

/// Whether a hub response status means the request was accepted.
///
/// Acceptance is not verification: the hub still has to call back.
pub fn is_accepted(status: u16) -> bool {
    matches!(status, 200 | 202 | 204)
}

/// Transport to a WebSub hub.
pub trait HubClient: Send + Sync {
    /// POST `request` to `hub` and return the response status code.
    ///
    /// Network failures and timeouts are reported as
    /// [`SubscriptionError::Transport`].
    fn send(
        &self,
        hub: &str,
        request: &HubRequest,
    ) -> impl std::future::Future<Output = Result<u16, SubscriptionError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_statuses() {
        assert!(is_accepted(200));
        assert!(is_accepted(202));
        assert!(is_accepted(204));
        assert!(!is_accepted(201));
        assert!(!is_accepted(400));
        assert!(!is_accepted(500));
    }

    #[test]
    fn test_subscribe_form_fields() {
        let request = HubRequest {
            mode: HubMode::Subscribe,
            topic: "https://example.com/feed".to_string(),
            callback: "https://agent.example.com/webhook".to_string(),
            lease_seconds: Some(86_400),
            secret: Some("s3cret".to_string()),
        };
        let fields = request.form_fields();
        assert_eq!(fields[0], ("hub.mode", "subscribe".to_string()));
        assert!(fields.contains(&("hub.lease_seconds", "86400".to_string())));
        assert!(fields.contains(&("hub.secret", "s3cret".to_string())));
    }

    #[test]
    fn test_unsubscribe_form_fields_omit_lease_and_secret() {
        let request = HubRequest {
            mode: HubMode::Unsubscribe,
            topic: "t".to_string(),
            callback: "c".to_string(),
            lease_seconds: None,
            secret: None,
        };
        let names: Vec<_> = request.form_fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["hub.mode", "hub.topic", "hub.callback"]);
    }
}
