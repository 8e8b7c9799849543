//! Dripfeed Core - configuration, range arithmetic and transfer pacing
//!
//! This crate provides the HTTP-independent building blocks of the dripfeed
//! test server: the process-wide configuration (including the filename→delay
//! table), `Range` header parsing and resolution, and the chunk schedule
//! used to pace slow transfers.

pub mod config;
pub mod pacing;
pub mod range;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::ServerConfig;
pub use pacing::ChunkPlan;
pub use range::{RangeError, RangeSpec, ResolvedRange};
