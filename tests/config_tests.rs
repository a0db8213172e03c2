//! Tests for the type-safe configuration builder pattern.

use profilesnap::SnapConfig;
use std::time::Duration;

#[test]
fn builder_requires_output_dir_and_profile_url() {
    // This should not compile if uncommented - testing compile-time guarantees
    // let config = SnapConfig::builder().build();

    // This should also not compile - missing profile_url
    // let config = SnapConfig::builder()
    //     .output_dir("/tmp/out")
    //     .build();

    // This SHOULD compile - both required fields provided
    let config = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://example.com/someone")
        .build()
        .unwrap();

    assert_eq!(config.output_dir(), std::path::Path::new("/tmp/out"));
    assert_eq!(config.profile_url(), "https://example.com/someone");
}

#[test]
fn optional_fields_have_defaults() {
    let config = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://example.com/someone")
        .build()
        .unwrap();

    assert!(!config.headless());
    assert!(config.remove_temp_artifacts());
    assert_eq!(config.stability_rounds(), 3);
    assert_eq!(config.stability_interval(), Duration::from_millis(500));
    assert_eq!(config.stability_timeout(), Duration::from_secs(15));
    assert_eq!(config.scroll_max_rounds(), 10);
    assert_eq!(config.feed_scroll_rounds(), 6);
    assert_eq!(config.scroll_no_growth_limit(), 3);
    assert_eq!(config.capture_timeout(), Duration::from_secs(180));
    assert_eq!(config.nav_timeout_secs(), 60);
    assert_eq!(config.cookie_domain(), ".facebook.com");
    assert!(!config.expander_patterns().is_empty());
}

#[test]
fn url_normalization_adds_a_scheme() {
    let cases = [
        ("example.com/someone", "https://example.com/someone"),
        ("http://example.com/x", "http://example.com/x"),
        ("https://example.com/x", "https://example.com/x"),
    ];
    for (input, expected) in cases {
        let config = SnapConfig::builder()
            .output_dir("/tmp/out")
            .profile_url(input)
            .build()
            .unwrap();
        assert_eq!(config.profile_url(), expected);
    }
}

#[test]
fn unparseable_urls_are_rejected() {
    let result = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://")
        .build();
    assert!(result.is_err());
}

#[test]
fn zero_round_settings_are_rejected() {
    let result = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://example.com/x")
        .stability_rounds(0)
        .build();
    assert!(result.is_err());

    let result = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://example.com/x")
        .scroll_no_growth_limit(0)
        .build();
    assert!(result.is_err());
}

#[test]
fn field_overrides_take_the_last_value() {
    let config = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://example.com/x")
        .capture_timeout_ms(1_000)
        .capture_timeout_ms(2_000)
        .headless(true)
        .headless(false)
        .build()
        .unwrap();

    assert_eq!(config.capture_timeout(), Duration::from_secs(2));
    assert!(!config.headless());
}

#[test]
fn derived_temp_directories_are_process_unique() {
    let config = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://example.com/x")
        .build()
        .unwrap();

    let pid = std::process::id().to_string();
    assert!(config.extension_dir().display().to_string().contains(&pid));
    assert!(config.user_data_dir().display().to_string().contains(&pid));

    let explicit = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://example.com/x")
        .extension_dir("/tmp/ext")
        .user_data_dir("/tmp/profile")
        .build()
        .unwrap();
    assert_eq!(explicit.extension_dir(), std::path::PathBuf::from("/tmp/ext"));
    assert_eq!(
        explicit.user_data_dir(),
        std::path::PathBuf::from("/tmp/profile")
    );
}

#[test]
fn config_round_trips_through_serde() {
    let config = SnapConfig::builder()
        .output_dir("/tmp/out")
        .profile_url("https://example.com/someone")
        .capture_timeout_ms(42_000)
        .build()
        .unwrap();

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("https://example.com/someone"));

    let decoded: SnapConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.profile_url(), config.profile_url());
    assert_eq!(decoded.capture_timeout(), Duration::from_secs(42));
}
