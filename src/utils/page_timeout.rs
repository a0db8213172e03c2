//! Timeout wrapper for page operations.
//!
//! Browser-control calls can hang on slow DNS, streaming content or a dead
//! renderer; every page operation the pipeline issues goes through an
//! explicit timeout so a single bad page cannot stall the run.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Run a page operation with an explicit timeout.
///
/// The error message distinguishes a timeout from an operation failure via
/// `operation_name`.
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {timeout_secs} seconds"
        )),
    }
}
