//! WebSub subscription configuration and in-memory state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default lease requested from the hub (one day).
pub const DEFAULT_LEASE_SECONDS: u64 = 86_400;

/// Immutable subscription settings, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub hub: String,
    pub topic: String,
    pub callback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: u64,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_lease_seconds() -> u64 {
    DEFAULT_LEASE_SECONDS
}

fn default_protocol() -> String {
    "websub".to_string()
}

/// Mutable handshake state attached to a [`SubscriptionConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionState {
    pub verified: bool,
    pub last_challenge: Option<String>,
}

/// The `hub.mode` of a subscription request or verification callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubMode {
    Subscribe,
    Unsubscribe,
}

impl HubMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HubMode::Subscribe => "subscribe",
            HubMode::Unsubscribe => "unsubscribe",
        }
    }
}

impl fmt::Display for HubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HubMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscribe" => Ok(HubMode::Subscribe),
            "unsubscribe" => Ok(HubMode::Unsubscribe),
            other => Err(format!("invalid hub mode: '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_mode_parsing_is_exact() {
        assert_eq!("subscribe".parse::<HubMode>(), Ok(HubMode::Subscribe));
        assert_eq!("unsubscribe".parse::<HubMode>(), Ok(HubMode::Unsubscribe));
        assert!("Subscribe".parse::<HubMode>().is_err());
        assert!("denied".parse::<HubMode>().is_err());
    }

    #[test]
    fn test_subscription_config_defaults() {
        let json = r#"{"hub":"h","topic":"t","callback":"c"}"#;
        let cfg: SubscriptionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.lease_seconds, DEFAULT_LEASE_SECONDS);
        assert_eq!(cfg.protocol, "websub");
        assert!(cfg.secret.is_none());
    }

    #[test]
    fn test_state_starts_unverified() {
        let state = SubscriptionState::default();
        assert!(!state.verified);
        assert!(state.last_challenge.is_none());
    }
}
