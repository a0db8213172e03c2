//! End-to-end run orchestration.
//!
//! Setup (credentials, extension, browser, cookies) happens before any task
//! and fails the run outright; from the first task onward, failures are
//! per-section and the run always proceeds to report assembly with whatever
//! artifacts were collected.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::browser_setup;
use crate::capture::CaptureOptions;
use crate::config::SnapConfig;
use crate::cookies;
use crate::extension;
use crate::pipeline::{CapturePipeline, ChromiumSurfaceProvider, RunSummary};
use crate::profile;
use crate::report::ReportAssembler;
use crate::snapshot_writer::SnapshotWriter;
use crate::utils::with_page_timeout;

/// Everything a finished run hands back to the caller.
#[derive(Debug)]
pub struct RunReport {
    pub profile_id: String,
    pub output_dir: PathBuf,
    pub index_path: PathBuf,
    pub summary: RunSummary,
}

/// Snapshot every section of the configured profile.
pub async fn snapshot_profile(config: SnapConfig) -> Result<RunReport> {
    // Credentials first: cheapest check, and pointless to launch a browser
    // without them.
    let cookie_header = cookies::read_cookie_header(config.credentials_file())
        .context("cannot read credentials")?;
    let pairs = cookies::parse_cookie_header(&cookie_header);
    if pairs.is_empty() {
        bail!(
            "credentials file {} contains no parseable cookies",
            config.credentials_file().display()
        );
    }
    info!("parsed {} cookies from credentials file", pairs.len());

    let ext_dir = config.extension_dir();
    let controller = extension::build_controller_extension(config.capture_engine_dir(), &ext_dir)
        .context("cannot build controller extension")?;

    let user_data_dir = config.user_data_dir();
    let (browser, handler_task) = browser_setup::launch_browser_with_extension(
        config.headless(),
        &user_data_dir,
        controller.dir(),
    )
    .await?;
    let browser = Arc::new(browser);

    // The default tab: cookie injection, then a first visit to the profile
    // to learn its id before any artifact path is decided.
    let page = browser
        .new_page("about:blank")
        .await
        .context("failed to open default tab")?;

    let params = cookies::to_cookie_params(&pairs, config.cookie_domain(), config.cookie_path())?;
    if let Err(e) = cookies::inject_cookies(&page, params).await {
        // Public pages still render logged-out; keep going.
        warn!("cookie injection failed: {e:#}");
    }

    let profile_url = config.profile_url().to_string();
    info!("visiting profile: {profile_url}");
    let nav_timeout = config.nav_timeout_secs();
    let profile_html = match with_page_timeout(
        async {
            page.goto(profile_url.as_str())
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            page.content().await.map_err(|e| anyhow::anyhow!("{e}"))
        },
        nav_timeout,
        "Profile page visit",
    )
    .await
    {
        Ok(html) => html,
        Err(e) => {
            warn!("initial profile visit failed: {e:#}");
            String::new()
        }
    };

    let profile_id = profile::detect_profile_id(&profile_html, &profile_url);
    let out_dir = config
        .output_dir()
        .join(profile::snapshot_dir_name(&profile_id));
    info!("profile id {profile_id}; snapshots go to {}", out_dir.display());

    let writer = SnapshotWriter::new(&out_dir);
    let tasks = profile::plan_profile_sections(&config);
    let provider = ChromiumSurfaceProvider::new(Arc::clone(&browser), page, &config);
    let pipeline = CapturePipeline::new(
        provider,
        writer,
        &config,
        CaptureOptions::profile_defaults(),
    );

    let summary = pipeline.run(tasks).await;
    info!(
        "run collected {} artifact(s) across {} section(s) ({} unreachable)",
        summary.artifacts_written(),
        summary.sections.len(),
        summary.navigation_failures()
    );

    let assembler = ReportAssembler::new(&out_dir, &profile_id);
    let index_path = assembler.assemble(&summary).await?;

    shutdown_browser(browser, handler_task).await;

    if config.remove_temp_artifacts() {
        controller.remove();
        if let Err(e) = std::fs::remove_dir_all(&user_data_dir) {
            warn!(
                "failed to remove browser profile directory {}: {e}",
                user_data_dir.display()
            );
        }
    }

    Ok(RunReport {
        profile_id,
        output_dir: out_dir,
        index_path,
        summary,
    })
}

/// Close the browser, wait for the process to exit, then stop the handler
/// task. The order matters: the handler must keep driving the CDP
/// connection until the close handshake finishes.
async fn shutdown_browser(browser: Arc<chromiumoxide::Browser>, handler_task: tokio::task::JoinHandle<()>) {
    match Arc::try_unwrap(browser) {
        Ok(mut browser) => {
            if let Err(e) = browser.close().await {
                warn!("failed to close browser: {e}");
            }
            if let Err(e) = browser.wait().await {
                warn!("failed to wait for browser exit: {e}");
            }
        }
        Err(arc) => {
            warn!(
                "browser still has {} reference(s); skipping graceful close",
                Arc::strong_count(&arc)
            );
        }
    }

    handler_task.abort();
    if let Err(e) = handler_task.await
        && !e.is_cancelled()
    {
        warn!("handler task failed during abort: {e}");
    }
}
