//! Shared domain types for Agent-Flavored Markdown (AFM).
//!
//! This crate contains the data shapes used across the AFM workspace:
//! the parsed agent record and its metadata, interface definitions,
//! compiled webhook templates, WebSub subscription config/state, LLM
//! message types, configuration, and the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod agent;
pub mod config;
pub mod error;
pub mod interface;
pub mod llm;
pub mod runner;
pub mod template;
pub mod websub;
