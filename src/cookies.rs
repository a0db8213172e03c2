//! Cookie credential handling.
//!
//! Authentication is a raw cookie header copied out of a logged-in browser
//! session and dropped into a credentials file. The file is read once before
//! any browser work; a missing or empty file aborts the run, since every
//! profile page would otherwise render as logged-out.

use anyhow::{Context, Result};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors reading the credentials file. All of these are fatal setup
/// failures: the run stops before any task executes.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credentials file not found at {}", .0.display())]
    Missing(PathBuf),

    #[error("credentials file {} is empty", .0.display())]
    Empty(PathBuf),

    #[error("failed to read credentials file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One parsed `name=value` cookie pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

/// Read the raw cookie header from a credentials file.
///
/// The file is usually the single pasted header, but tolerate `KEY=...`
/// framing and stray lines: in a multi-line file, the line with the most
/// `;` separators (longest on ties) is taken as the cookie header.
pub fn read_cookie_header(path: &Path) -> Result<String, CredentialError> {
    if !path.exists() {
        return Err(CredentialError::Missing(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CredentialError::Empty(path.to_path_buf()));
    }

    if raw.contains('\n') {
        let best = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .max_by_key(|line| (line.matches(';').count(), line.len()))
            .unwrap_or(raw);
        return Ok(strip_env_framing(best).to_string());
    }
    Ok(strip_env_framing(raw).to_string())
}

/// Drop a leading `SOMETHING_COOKIE=` assignment if the file uses env-file
/// framing around the header.
fn strip_env_framing(line: &str) -> &str {
    match line.split_once('=') {
        Some((key, rest))
            if key.ends_with("_COOKIE") && key.chars().all(|c| c.is_ascii_uppercase() || c == '_') =>
        {
            rest.trim()
        }
        _ => line,
    }
}

/// Parse a raw semicolon-separated cookie header into pairs. Fragments
/// without `=` or with an empty name are skipped.
#[must_use]
pub fn parse_cookie_header(raw: &str) -> Vec<CookiePair> {
    raw.split(';')
        .filter_map(|fragment| {
            let fragment = fragment.trim();
            let (name, value) = fragment.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(CookiePair {
                name: name.to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

/// Convert parsed pairs into CDP cookie params bound to `domain`/`path`.
///
/// Cookies are marked secure but not http-only, so the browser accepts them
/// regardless of how the originals were flagged.
pub fn to_cookie_params(
    pairs: &[CookiePair],
    domain: &str,
    path: &str,
) -> Result<Vec<CookieParam>> {
    pairs
        .iter()
        .map(|pair| {
            CookieParam::builder()
                .name(pair.name.clone())
                .value(pair.value.clone())
                .domain(domain.to_string())
                .path(path.to_string())
                .secure(true)
                .build()
                .map_err(|e| anyhow::anyhow!("invalid cookie '{}': {e}", pair.name))
        })
        .collect()
}

/// Inject cookies into the browser through the given page's CDP session.
pub async fn inject_cookies(page: &Page, cookies: Vec<CookieParam>) -> Result<()> {
    let count = cookies.len();
    page.set_cookies(cookies)
        .await
        .context("failed to set cookies")?;
    info!("injected {count} cookies into browser context");
    debug!("cookie injection complete");
    Ok(())
}
