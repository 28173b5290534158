//! Infrastructure layer for AFM.
//!
//! Implements the ports defined in `afm-core` against real IO: the reqwest
//! WebSub hub client, the OpenAI-compatible LLM provider and its factory,
//! the rmcp-backed MCP toolset, HMAC webhook signature verification, and the
//! config and agent file loaders.

pub mod config;
pub mod filesystem;
pub mod llm;
pub mod mcp;
pub mod webhook;
pub mod websub;
