//! WebSub hub transport.

pub mod hub_client;

pub use hub_client::{DEFAULT_HUB_TIMEOUT, ReqwestHubClient};
