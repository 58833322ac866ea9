//! Shared types for the café backend
//!
//! Common types used across crates: the unified error system, domain
//! models, the opaque JSON payload type, and small utilities.

pub mod error;
pub mod models;
pub mod payload;
pub mod util;

pub use payload::OpaquePayload;
