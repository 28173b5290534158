//! HTTP request handlers.

pub mod info;
pub mod webchat;
pub mod webhook;
