use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Primitive page operations the fill logic is expressed in.
///
/// The core never touches the page directly: everything goes through this
/// capability interface (selector in, effect or observation out), so the
/// strategy logic can run against a fake driver without a real browser.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Poll until the selector resolves to an element, or time out.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    async fn hover(&self, selector: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    async fn focus(&self, selector: &str) -> Result<()>;

    /// Empty the element's current value, notifying the page.
    async fn clear(&self, selector: &str) -> Result<()>;

    /// Type text key by key with a per-character delay, so incremental
    /// filtering widgets see each keystroke.
    async fn type_text(&self, selector: &str, text: &str, delay_ms: u64) -> Result<()>;

    /// Set the value in one step, dispatching the standard notifications.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Check or uncheck a checkbox/radio, clicking only when the state differs.
    async fn set_checked(&self, selector: &str, checked: bool) -> Result<()>;

    /// Select a native option whose visible text equals `label`.
    /// Fails when no option matches.
    async fn select_by_label(&self, selector: &str, label: &str) -> Result<()>;

    /// Select a native option whose underlying value equals `value`.
    /// Fails when no option matches.
    async fn select_by_value(&self, selector: &str, value: &str) -> Result<()>;

    /// Raw query/effect escape hatch: run a script and return its JSON result.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Hand a local file to a file input.
    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<()>;

    /// Send a named key ("Tab", "Enter", "ArrowDown", ...) to the element.
    async fn press_key(&self, selector: &str, key: &str) -> Result<()>;
}
