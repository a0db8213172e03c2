//! Capture-engine bridge: wire types and the `postMessage` protocol.

pub mod bridge;
pub mod types;

pub use bridge::{await_result, install_result_listener, poll, submit};
pub use types::{BridgeError, CaptureOptions, CaptureResult, REQUEST_SOURCE, RESPONSE_SOURCE};
