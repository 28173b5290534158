//! WebSub subscription lifecycle.
//!
//! - `HubClient`: port for sending form-encoded requests to a hub
//! - `WebSubSubscriber`: subscription state machine and challenge verification
//! - `subscribe_with_retry`: bounded, cancellable startup subscription loop

pub mod hub;
pub mod retry;
pub mod subscriber;

pub use hub::{HubClient, HubRequest};
pub use retry::{RetryPolicy, SubscribeOutcome, subscribe_with_retry};
pub use subscriber::WebSubSubscriber;
