//! Run configuration.
//!
//! Provides the `SnapConfig` struct and its type-safe builder: every tunable
//! of a snapshot run lives here as an explicit value instead of mutable
//! module state.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, SnapConfigBuilder, WithOutputDir};
pub use types::SnapConfig;
