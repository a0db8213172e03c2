//! Wire types for the capture-engine bridge.
//!
//! The capture engine lives inside a browser extension and is reachable only
//! through `postMessage` traffic on the page it should snapshot. Requests and
//! responses are correlated by the task key carried in the `id` field.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// `source` field of a capture request posted into the page.
pub const REQUEST_SOURCE: &str = "capture-request";

/// `source` field of a capture response delivered by the engine.
pub const RESPONSE_SOURCE: &str = "capture-response";

/// Completed capture payload recorded for one task key.
///
/// A result with `error` set is still terminal and consumable: the engine
/// answered, it just answered with a failure. It is drained and persisted
/// like any other result, never retried.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Serialized page artifact. May be empty when the engine errored.
    #[serde(default)]
    pub content: String,
    /// Filename suggested by the engine, if any.
    #[serde(default)]
    pub filename: Option<String>,
    /// Page title reported by the engine.
    #[serde(default)]
    pub title: Option<String>,
    /// Error string reported by the engine.
    #[serde(default)]
    pub error: Option<String>,
}

impl CaptureResult {
    /// Whether the engine reported a failure for this capture.
    #[must_use]
    pub fn is_engine_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Pass-through options map forwarded verbatim to the capture engine.
///
/// Recognized keys are engine-specific; the pipeline never inspects them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureOptions(pub serde_json::Map<String, serde_json::Value>);

impl CaptureOptions {
    /// Empty options map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The option set used for profile snapshots: strip hidden elements,
    /// compress the markup, keep video elements in place.
    #[must_use]
    pub fn profile_defaults() -> Self {
        let mut map = serde_json::Map::new();
        map.insert("removeHiddenElements".into(), serde_json::Value::Bool(true));
        map.insert("compressHTML".into(), serde_json::Value::Bool(true));
        map.insert("blockVideos".into(), serde_json::Value::Bool(false));
        Self(map)
    }

    /// Add or replace a single option.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }
}

/// Errors surfaced by the capture bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No result appeared for the key within the allowed window.
    #[error("no capture result for '{key}' within {timeout:?}")]
    CaptureTimeout { key: String, timeout: Duration },

    /// In-page evaluation failed (browser gone, page crashed, CDP error).
    #[error("bridge evaluation failed: {0}")]
    Evaluation(String),

    /// The engine's response could not be decoded.
    #[error("malformed capture response for '{key}': {message}")]
    MalformedResponse { key: String, message: String },
}
