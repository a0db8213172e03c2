// Profile snapshot runner.
//
// Visits the sub-pages of a social profile with a real browser, captures
// each as a self-contained page through the bundled capture engine, and
// writes a browsable snapshot directory plus a master index.
//
// Usage: profilesnap <profile-url> [output-dir]
//
// Expects a credentials file (.env) holding a raw cookie header and the
// capture engine assets (a lib/ directory) next to the working directory;
// see SnapConfig for every knob.

use anyhow::Result;
use profilesnap::SnapConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(profile_url) = args.get(1) else {
        eprintln!("Usage: profilesnap <profile-url> [output-dir]");
        std::process::exit(2);
    };
    let output_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./reports"));

    let config = SnapConfig::builder()
        .output_dir(output_dir)
        .profile_url(profile_url.as_str())
        .build()?;

    let report = profilesnap::snapshot_profile(config).await?;

    info!(
        "done: {} artifact(s) for profile {} in {}",
        report.summary.artifacts_written(),
        report.profile_id,
        report.output_dir.display()
    );
    info!("master index: {}", report.index_path.display());
    Ok(())
}
