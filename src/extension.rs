//! Controller extension assembly.
//!
//! The capture engine ships as a library of browser-side scripts; to use it
//! from automation it is wrapped in a temporary extension whose content
//! script translates page-level `postMessage` traffic into engine calls.
//! The extension is rebuilt from scratch for every run and removed
//! afterwards unless the run is configured to keep temp artifacts.

use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::capture::{REQUEST_SOURCE, RESPONSE_SOURCE};

/// Fatal setup failures while assembling the extension. These abort the run
/// before any task executes.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("capture engine assets not found at {} (expected a lib/ directory)", .0.display())]
    MissingEngineAssets(PathBuf),

    #[error("failed to write extension file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A built controller extension on disk.
#[derive(Debug)]
pub struct ControllerExtension {
    dir: PathBuf,
}

impl ControllerExtension {
    /// Absolute directory to pass to the browser's extension-loading flags.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove the extension directory. Failures are logged, not fatal — the
    /// run's artifacts are already on disk by the time this is called.
    pub fn remove(&self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            tracing::warn!(
                "failed to remove extension directory {}: {e}",
                self.dir.display()
            );
        } else {
            info!("removed extension directory {}", self.dir.display());
        }
    }
}

/// Assemble the controller extension around the engine assets in
/// `engine_dir` (which must contain a `lib/` directory).
pub fn build_controller_extension(
    engine_dir: &Path,
    ext_dir: &Path,
) -> Result<ControllerExtension, SetupError> {
    let lib_src = engine_dir.join("lib");
    if !lib_src.is_dir() {
        return Err(SetupError::MissingEngineAssets(engine_dir.to_path_buf()));
    }

    info!("building controller extension at {}", ext_dir.display());
    if ext_dir.exists() {
        std::fs::remove_dir_all(ext_dir).map_err(|source| SetupError::Write {
            path: ext_dir.to_path_buf(),
            source,
        })?;
    }
    std::fs::create_dir_all(ext_dir).map_err(|source| SetupError::Write {
        path: ext_dir.to_path_buf(),
        source,
    })?;

    copy_dir_recursive(&lib_src, &ext_dir.join("lib"))?;

    write_file(&ext_dir.join("background.html"), BACKGROUND_HTML)?;
    write_file(&ext_dir.join("content_script.js"), &content_script())?;
    write_file(
        &ext_dir.join("manifest.json"),
        &serde_json::to_string_pretty(&manifest()).unwrap_or_default(),
    )?;

    // Chrome rejects relative paths in --load-extension.
    let dir = std::fs::canonicalize(ext_dir).unwrap_or_else(|_| ext_dir.to_path_buf());
    info!("controller extension ready");
    Ok(ControllerExtension { dir })
}

const BACKGROUND_HTML: &str = r#"<!doctype html><html><head><meta charset="utf-8"></head><body>
<script src="lib/chrome-browser-polyfill.js"></script>
<script src="lib/single-file-background.js"></script>
</body></html>"#;

/// Content script bridging page messages to the engine: listens for capture
/// requests, invokes the engine, posts the result (or the error) back with
/// the same id.
fn content_script() -> String {
    format!(
        r#"(function () {{
  if (window.__capture_controller_installed) return;
  window.__capture_controller_installed = true;
  window.addEventListener('message', async function (event) {{
    try {{
      const d = event.data;
      if (!d || d.source !== '{REQUEST_SOURCE}') return;
      const id = d.id || 'capture';
      const options = d.options || {{}};
      if (typeof extension === 'undefined' || !extension.getPageData) {{
        window.postMessage({{ source: '{RESPONSE_SOURCE}', id: id, error: 'capture engine not ready (extension.getPageData missing)' }}, '*');
        return;
      }}
      try {{
        const result = await extension.getPageData(options);
        window.postMessage({{ source: '{RESPONSE_SOURCE}', id: id, title: result.title, filename: result.filename, content: result.content }}, '*');
      }} catch (err) {{
        window.postMessage({{ source: '{RESPONSE_SOURCE}', id: id, error: err && err.message ? err.message : String(err) }}, '*');
      }}
    }} catch (e) {{
      // malformed message; not ours
    }}
  }}, false);
}})();
"#
    )
}

/// Manifest v2: frame scripts at document_start, engine core plus the
/// controller at document_idle in the top frame only.
fn manifest() -> serde_json::Value {
    json!({
        "manifest_version": 2,
        "name": "Capture Controller",
        "version": "1.0",
        "description": "Bundles the capture engine and exposes its message bridge",
        "content_scripts": [
            {
                "matches": ["<all_urls>"],
                "js": [
                    "lib/chrome-browser-polyfill.js",
                    "lib/single-file-frames.js",
                    "lib/single-file-extension-frames.js"
                ],
                "run_at": "document_start",
                "all_frames": true
            },
            {
                "matches": ["<all_urls>"],
                "js": [
                    "lib/chrome-browser-polyfill.js",
                    "lib/single-file-bootstrap.js",
                    "lib/single-file-extension-core.js",
                    "lib/single-file.js",
                    "content_script.js"
                ],
                "run_at": "document_idle",
                "all_frames": false
            }
        ],
        "background": { "page": "background.html", "persistent": false },
        "permissions": ["activeTab", "<all_urls>"],
        "web_accessible_resources": ["lib/single-file-hooks-frames.js"]
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), SetupError> {
    std::fs::write(path, contents).map_err(|source| SetupError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), SetupError> {
    std::fs::create_dir_all(dst).map_err(|source| SetupError::Write {
        path: dst.to_path_buf(),
        source,
    })?;
    let entries = std::fs::read_dir(src).map_err(|source| SetupError::Write {
        path: src.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| SetupError::Write {
            path: src.to_path_buf(),
            source,
        })?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if from.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else {
            std::fs::copy(&from, &to).map_err(|source| SetupError::Write {
                path: to.clone(),
                source,
            })?;
        }
    }
    Ok(())
}
