//! HTTP surface: router, handlers, error mapping and the subscription task.

pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod router;
