//! Dripfeed Web - HTTP test-double server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Emulates a remote file/API host for client-side integration tests:
//! httpbin-style echo endpoints, slow multipart/binary uploads, and
//! range-aware paced file downloads with byte-exact header control.

pub mod handlers;
pub mod server;

// Re-export main entry points
pub use server::{AppState, run_server, serve_with_listener};
