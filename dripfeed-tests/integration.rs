//! Integration tests for the dripfeed server
//!
//! Each module spins up a real server on an ephemeral port and drives it
//! over TCP the way a client under test would.

#[path = "integration/harness.rs"]
mod harness;

#[path = "integration/echo_endpoints.rs"]
mod echo_endpoints;
#[path = "integration/file_streaming.rs"]
mod file_streaming;
#[path = "integration/httpbin_endpoints.rs"]
mod httpbin_endpoints;
#[path = "integration/range_properties.rs"]
mod range_properties;
#[path = "integration/shutdown.rs"]
mod shutdown;
#[path = "integration/upload_endpoints.rs"]
mod upload_endpoints;
#[path = "integration/wire_protocol.rs"]
mod wire_protocol;
