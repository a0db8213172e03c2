//! Asynchronous request/response bridge to the capture engine.
//!
//! The engine is reachable only through `postMessage` on the page being
//! captured: a request is posted into the page, the extension's content
//! script forwards it to the engine, and the response comes back as another
//! message some unbounded time later. The bridge therefore splits the
//! exchange into a fire-and-forget [`submit`], a non-blocking [`poll`] of a
//! per-page result buffer, and a bounded [`await_result`] polling loop.
//!
//! Only one capture should be outstanding per page at a time; the pipeline
//! guarantees this by dedicating a tab to each task.

use chromiumoxide::page::Page;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::types::{BridgeError, CaptureOptions, CaptureResult, REQUEST_SOURCE, RESPONSE_SOURCE};

/// Install the in-page listener that buffers capture responses by task key.
///
/// Safe to call repeatedly: the listener guards itself with a window-level
/// flag, so every call after the first is a no-op inside the page. Must be
/// re-run after each navigation, since navigations wipe page script state.
pub async fn install_result_listener(page: &Page) -> Result<(), BridgeError> {
    let js = format!(
        r#"(() => {{
  if (window.__capture_results_installed) return true;
  window.__capture_results_installed = true;
  window.__capture_results = window.__capture_results || {{}};
  window.addEventListener('message', (event) => {{
    const d = event.data;
    if (!d || d.source !== '{RESPONSE_SOURCE}') return;
    const id = d.id || 'capture';
    window.__capture_results[id] = {{
      title: d.title,
      filename: d.filename,
      content: d.content,
      error: d.error,
    }};
  }}, false);
  return true;
}})()"#
    );

    page.evaluate(js)
        .await
        .map_err(|e| BridgeError::Evaluation(e.to_string()))?;
    trace!("capture result listener installed");
    Ok(())
}

/// Fire-and-forget capture request for `key`.
///
/// Clears any stale buffered result for the key first, then posts the
/// request. Returns as soon as the message is posted; completion is observed
/// through [`poll`] / [`await_result`].
pub async fn submit(page: &Page, key: &str, options: &CaptureOptions) -> Result<(), BridgeError> {
    install_result_listener(page).await?;

    let key_js = encode_js_string(key);
    let options_js = serde_json::to_string(options).map_err(|e| BridgeError::MalformedResponse {
        key: key.to_string(),
        message: format!("options not serializable: {e}"),
    })?;

    let js = format!(
        r#"(() => {{
  const id = {key_js};
  if (window.__capture_results) {{ delete window.__capture_results[id]; }}
  window.postMessage({{ source: '{REQUEST_SOURCE}', id: id, options: {options_js} }}, '*');
  return true;
}})()"#
    );

    page.evaluate(js)
        .await
        .map_err(|e| BridgeError::Evaluation(e.to_string()))?;
    debug!("submitted capture request '{key}'");
    Ok(())
}

/// Single non-blocking check for a buffered result.
///
/// `Ok(None)` is the common case while the engine is still working; it is
/// not an error and costs one round-trip into the page.
pub async fn poll(page: &Page, key: &str) -> Result<Option<CaptureResult>, BridgeError> {
    let key_js = encode_js_string(key);
    let js = format!(
        r#"(() => {{
  const results = window.__capture_results;
  if (!results || results[{key_js}] === undefined) return null;
  return results[{key_js}];
}})()"#
    );

    let evaluated = page
        .evaluate(js)
        .await
        .map_err(|e| BridgeError::Evaluation(e.to_string()))?;

    // A null/absent value is the engine still working, not an error.
    match evaluated.value() {
        None => Ok(None),
        Some(value) if value.is_null() => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| BridgeError::MalformedResponse {
                key: key.to_string(),
                message: e.to_string(),
            }),
    }
}

/// Block until a result for `key` appears, polling every `poll_interval`.
///
/// Fails with [`BridgeError::CaptureTimeout`] once `timeout` elapses with no
/// buffered result. Used only by the exhaustive drain at the end of a run,
/// where a generous timeout is expected: captures can legitimately take
/// minutes on media-heavy pages.
pub async fn await_result(
    page: &Page,
    key: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<CaptureResult, BridgeError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(result) = poll(page, key).await? {
            return Ok(result);
        }
        if Instant::now() >= deadline {
            return Err(BridgeError::CaptureTimeout {
                key: key.to_string(),
                timeout,
            });
        }
        tokio::time::sleep(poll_interval).await;
    }
}

/// Encode a task key as a JS string literal.
///
/// Keys are generated by this crate, but they still flow into evaluated
/// script text and must not be able to break out of the literal.
fn encode_js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"capture\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_encoded_as_safe_literals() {
        assert_eq!(encode_js_string("profile_main"), "\"profile_main\"");
        assert_eq!(encode_js_string("a'b\"c"), r#""a'b\"c""#);
    }
}
