//! Business logic and port traits for AFM agents.
//!
//! This crate defines the template engine, the document parser, the WebSub
//! subscription state machine and the "ports" (hub client, LLM provider, tool
//! executor, agent runner) that the infrastructure layer implements. It
//! depends only on `afm-types` -- never on `afm-infra` or any network crate.

pub mod document;
pub mod llm;
pub mod runner;
pub mod schema;
pub mod template;
pub mod tools;
pub mod websub;
