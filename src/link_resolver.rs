//! Anchor discovery on a live page.
//!
//! Section sub-pages are reached through the real links the profile page
//! renders, not guessed URLs; the resolvers walk the page's anchor set
//! inside the page itself and hand back an absolute URL. Both lookups treat
//! "nothing found" as a normal outcome — callers fall back to a constructed
//! URL.

use anyhow::{Context, Result};
use chromiumoxide::page::Page;
use tracing::trace;

/// Find the first anchor whose visible text contains any of `keywords`
/// (case-insensitive) and return its absolute href.
pub async fn find_link_by_text(page: &Page, keywords: &[String]) -> Result<Option<String>> {
    let keywords_js =
        serde_json::to_string(keywords).context("keyword list not serializable")?;
    let js = format!(
        r#"(() => {{
  const keywords = {keywords_js};
  const anchors = Array.from(document.querySelectorAll('a'));
  for (const a of anchors) {{
    if (!a || !a.textContent) continue;
    const text = a.textContent.trim().toLowerCase();
    for (const k of keywords) {{
      if (!k) continue;
      if (text.includes(k.toLowerCase())) {{
        const href = a.getAttribute('href');
        if (href) return absolutize(href);
      }}
    }}
  }}
  return null;
  function absolutize(href) {{
    if (href.startsWith('http')) return href;
    if (href.startsWith('/')) return window.location.origin + href;
    return window.location.origin + '/' + href;
  }}
}})()"#
    );

    let evaluated = page.evaluate(js).await.context("anchor text search failed")?;
    let href = decode_href(evaluated.value());
    trace!(?keywords, ?href, "text link lookup");
    Ok(href)
}

/// Find the first anchor whose href contains `pattern` and return its
/// absolute URL.
pub async fn find_link_by_href(page: &Page, pattern: &str) -> Result<Option<String>> {
    let pattern_js = serde_json::to_string(pattern).context("pattern not serializable")?;
    let js = format!(
        r#"(() => {{
  const pattern = {pattern_js};
  const anchors = Array.from(document.querySelectorAll('a'));
  for (const a of anchors) {{
    const href = a.getAttribute('href') || '';
    if (href.indexOf(pattern) !== -1) {{
      if (href.startsWith('http')) return href;
      if (href.startsWith('/')) return window.location.origin + href;
      return window.location.origin + '/' + href;
    }}
  }}
  return null;
}})()"#
    );

    let evaluated = page.evaluate(js).await.context("anchor href search failed")?;
    let href = decode_href(evaluated.value());
    trace!(pattern, ?href, "href link lookup");
    Ok(href)
}

/// A lookup's value is either a string URL or null/absent.
fn decode_href(value: Option<&serde_json::Value>) -> Option<String> {
    value.and_then(serde_json::Value::as_str).map(str::to_string)
}

/// Click "See more"-style expanders so collapsed content is present in the
/// capture. Runs up to `max_iterations` passes and stops as soon as a pass
/// clicks nothing. Best effort: individual click failures are swallowed
/// inside the page.
pub async fn click_expanders(
    page: &Page,
    patterns: &[String],
    max_iterations: u32,
) -> Result<u32> {
    let patterns_js =
        serde_json::to_string(patterns).context("expander patterns not serializable")?;
    let mut total_clicked = 0u32;

    for _ in 0..max_iterations {
        let js = format!(
            r#"(() => {{
  const patterns = {patterns_js};
  let clicked = 0;
  const candidates = Array.from(
    document.querySelectorAll('div[role="button"], span[role="button"], a, button')
  );
  for (const el of candidates) {{
    const text = (el.textContent || '').trim();
    if (!text) continue;
    for (const p of patterns) {{
      if (text === p || text.startsWith(p)) {{
        try {{
          el.scrollIntoView({{ block: 'center' }});
          el.click();
          clicked += 1;
        }} catch (err) {{ /* detached or unclickable node */ }}
        break;
      }}
    }}
  }}
  return clicked;
}})()"#
        );

        let evaluated = page.evaluate(js).await.context("expander pass failed")?;
        let clicked = evaluated
            .value()
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        if clicked == 0 {
            break;
        }
        total_clicked += clicked;
        // Short pause so expanded content can render before the next pass.
        tokio::time::sleep(std::time::Duration::from_millis(120)).await;
    }

    trace!(total_clicked, "expander passes finished");
    Ok(total_clicked)
}
