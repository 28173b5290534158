//! Webhook prompt templates.
//!
//! - [`compile`]: parse `${http:payload...}` / `${http:header...}` placeholders
//! - [`evaluate`]: render a compiled template against a payload and headers
//! - [`access`]: the dot/bracket path accessor used for payload references

pub mod compiler;
pub mod evaluator;
pub mod path;

pub use compiler::compile;
pub use evaluator::evaluate;
pub use path::access;
