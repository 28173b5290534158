//! Tool execution.
//!
//! - `ToolExecutor`: RPITIT port the runner calls tools through
//! - `filter`: per-server allow/deny lists from the agent document

pub mod executor;
pub mod filter;

pub use executor::{NoTools, ToolExecutor};
pub use filter::{filter_tools, is_allowed};
