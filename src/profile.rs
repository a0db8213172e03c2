//! Profile identification and section planning.
//!
//! The section list is data, not code: every run visits the same ordered set
//! of profile sub-pages, each described by its capture key, how to find its
//! URL and how much scrolling it deserves.

use regex::Regex;
use tracing::warn;

use crate::config::SnapConfig;
use crate::pipeline::SectionTask;

/// Placeholder used when no numeric profile id can be found anywhere.
pub const UNKNOWN_PROFILE_ID: &str = "unknown_profile";

/// Detect the numeric profile id from the profile page's HTML, falling back
/// to the id query parameter of the URL itself.
#[must_use]
pub fn detect_profile_id(html: &str, profile_url: &str) -> String {
    let patterns = [
        r#""userID"\s*:\s*"(\d+)""#,
        r"profile_owner[^\d]*(\d+)",
        r"entity_id[^\d]*(\d+)",
    ];
    for pattern in patterns {
        if let Ok(re) = Regex::new(pattern)
            && let Some(captures) = re.captures(html)
            && let Some(id) = captures.get(1)
        {
            return id.as_str().to_string();
        }
    }

    if let Ok(re) = Regex::new(r"profile\.php\?id=(\d+)")
        && let Some(captures) = re.captures(profile_url)
        && let Some(id) = captures.get(1)
    {
        return id.as_str().to_string();
    }

    warn!("could not detect a profile id; using '{UNKNOWN_PROFILE_ID}'");
    UNKNOWN_PROFILE_ID.to_string()
}

/// Name of the run's snapshot directory for a profile id.
#[must_use]
pub fn snapshot_dir_name(profile_id: &str) -> String {
    format!("{profile_id}_snapshots")
}

/// Name of the run's master index document.
#[must_use]
pub fn master_index_name() -> &'static str {
    "index.html"
}

/// The standard ordered section plan for one profile.
///
/// The profile main page is first (it doubles as the anchor page for link
/// discovery); every other section is discovered from its anchors with a
/// constructed fallback where the sub-page has a stable URL shape. Tagged
/// media sections have no reliable constructed form, so they are skipped
/// when no link is found.
#[must_use]
pub fn plan_profile_sections(config: &SnapConfig) -> Vec<SectionTask> {
    let profile_url = config.profile_url();
    let base = profile_url.trim_end_matches('/');
    let friends_budget = config.scroll_max_rounds();
    let feed_budget = config.feed_scroll_rounds();

    vec![
        SectionTask::direct("profile_main", profile_url, 0),
        SectionTask::discovered(
            "about_overview",
            &["About"],
            Some("/about"),
            Some(format!("{base}/about")),
            1,
        ),
        SectionTask::discovered(
            "about_contact_and_basic_info",
            &["Contact and basic info", "Contact info", "Contact"],
            Some("contact_and_basic_info"),
            None,
            1,
        ),
        SectionTask::discovered(
            "about_family_and_relationships",
            &["Family and relationships", "Family"],
            Some("family_and_relationships"),
            None,
            1,
        ),
        SectionTask::discovered(
            "friends",
            &["Friends"],
            Some("/friends"),
            Some(format!("{base}/friends")),
            friends_budget,
        ),
        SectionTask::discovered(
            "photos_by",
            &["Photos"],
            Some("/photos"),
            Some(format!("{base}/photos")),
            feed_budget,
        ),
        SectionTask::discovered(
            "photos_of",
            &["Photos of", "Tagged"],
            Some("photos_tagged"),
            None,
            feed_budget,
        ),
        SectionTask::discovered(
            "videos_by",
            &["Videos"],
            Some("/videos"),
            Some(format!("{base}/videos")),
            feed_budget,
        ),
        SectionTask::discovered(
            "videos_of",
            &["Videos of", "Tagged videos"],
            Some("videos_tagged"),
            None,
            feed_budget,
        ),
    ]
}
