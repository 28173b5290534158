//! Inbound webhook support.

pub mod signature;

pub use signature::{SIGNATURE_HEADERS, SignatureAlgorithm, verify_signature};
