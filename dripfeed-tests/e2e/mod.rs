//! End-to-end workflows exercising the server the way a download client
//! under test would.

#[path = "../integration/harness.rs"]
mod harness;

mod download_workflow;
