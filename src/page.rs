use async_trait::async_trait;
use std::time::Duration;

use crate::Result;

/// Minimal capability surface the extraction pipeline needs from a browser
/// page. Element enumeration happens on the HTML snapshot returned by
/// [`content`](PageDriver::content) rather than through live DOM handles,
/// which keeps the parsing side pure and lets tests drive the pipeline with
/// fixture HTML instead of a real engine.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url` and wait for the navigation to finish.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait for an element matching `selector` to appear, up to `timeout`.
    /// Times out with [`AppError::SelectorTimeout`](crate::AppError).
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Fixed pause for late-arriving dynamic content.
    async fn settle(&self, delay: Duration);

    /// Full HTML snapshot of the current page.
    async fn content(&self) -> Result<String>;
}
