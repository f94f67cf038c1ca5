use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::driver::PageDriver;
use super::js_string;

/// Manages browser lifecycle and implements the page-driver primitives over CDP.
pub struct BrowserManager {
    browser: Arc<Mutex<Option<Browser>>>,
    page: Arc<Mutex<Option<Page>>>,
    /// Lock to prevent concurrent browser launches.
    launch_lock: tokio::sync::Mutex<()>,
}

impl BrowserManager {
    pub fn new() -> Self {
        Self {
            browser: Arc::new(Mutex::new(None)),
            page: Arc::new(Mutex::new(None)),
            launch_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Launch Chrome and navigate to the form URL.
    pub async fn launch(&self, url: &str, headless: bool) -> Result<()> {
        let _launch_guard = self.launch_lock.lock().await;

        // Close any existing browser first
        self.close().await.ok();

        let mut config = BrowserConfig::builder().window_size(1366, 768);
        if !headless {
            config = config.with_head();
        }

        // Disable automation detection flags and extra windows
        config = config
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-default-apps")
            .arg("--disable-extensions");

        let config = config
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))?;

        // Bound the launch so a missing Chrome cannot hang the run
        let (browser, mut handler) = timeout(Duration::from_secs(30), Browser::launch(config))
            .await
            .map_err(|_| anyhow!("Browser launch timeout (30s) - Chrome may not be installed or is unresponsive"))?
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        // Drain browser events in the background
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                tracing::trace!("Browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page(url)
            .await
            .map_err(|e| anyhow!("Failed to open page: {}", e))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| anyhow!("Navigation to {} failed: {}", url, e))?;

        *self.browser.lock().await = Some(browser);
        *self.page.lock().await = Some(page);

        tracing::info!("Browser launched and navigated to {}", url);
        Ok(())
    }

    /// Current page URL.
    pub async fn current_url(&self) -> Result<String> {
        let page = self.page().await?;
        page.url()
            .await
            .map_err(|e| anyhow!("Failed to get URL: {}", e))?
            .ok_or_else(|| anyhow!("URL is None"))
    }

    /// Close the page and the browser.
    pub async fn close(&self) -> Result<()> {
        let mut page_guard = self.page.lock().await;
        let mut browser_guard = self.browser.lock().await;

        if let Some(page) = page_guard.take() {
            let _ = page.close().await;
        }
        if let Some(mut browser) = browser_guard.take() {
            let _ = browser.close().await;
        }

        tracing::info!("Browser closed");
        Ok(())
    }

    async fn page(&self) -> Result<Page> {
        self.page
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow!("No page available"))
    }
}

impl Default for BrowserManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageDriver for BrowserManager {
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let page = self.page().await?;
        let start = std::time::Instant::now();

        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() > timeout {
                return Err(anyhow!(
                    "Timeout waiting for element '{}' after {:?}",
                    selector,
                    timeout
                ));
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn hover(&self, selector: &str) -> Result<()> {
        let page = self.page().await?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|e| anyhow!("Failed to find element '{}': {}", selector, e))?;
        element
            .hover()
            .await
            .map_err(|e| anyhow!("Failed to hover over '{}': {}", selector, e))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let page = self.page().await?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|e| anyhow!("Failed to find element '{}': {}", selector, e))?;
        element
            .click()
            .await
            .map_err(|e| anyhow!("Failed to click '{}': {}", selector, e))?;
        Ok(())
    }

    async fn focus(&self, selector: &str) -> Result<()> {
        let page = self.page().await?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|e| anyhow!("Failed to find element '{}': {}", selector, e))?;
        element
            .focus()
            .await
            .map_err(|e| anyhow!("Failed to focus '{}': {}", selector, e))?;
        Ok(())
    }

    async fn clear(&self, selector: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.value = '';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_string(selector)
        );
        match self.evaluate(&script).await? {
            serde_json::Value::Bool(true) => Ok(()),
            _ => Err(anyhow!("Failed to clear '{}': element not found", selector)),
        }
    }

    async fn type_text(&self, selector: &str, text: &str, delay_ms: u64) -> Result<()> {
        let page = self.page().await?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|e| anyhow!("Failed to find element '{}': {}", selector, e))?;

        element
            .click()
            .await
            .map_err(|e| anyhow!("Failed to focus '{}': {}", selector, e))?;

        // Key by key so autocomplete widgets see every keystroke
        for ch in text.chars() {
            element
                .type_str(ch.to_string())
                .await
                .map_err(|e| anyhow!("Failed to type into '{}': {}", selector, e))?;
            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                el.value = {val};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_string(selector),
            val = js_string(value)
        );
        match self.evaluate(&script).await? {
            serde_json::Value::Bool(true) => Ok(()),
            _ => Err(anyhow!("Failed to fill '{}': element not found", selector)),
        }
    }

    async fn set_checked(&self, selector: &str, checked: bool) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                if (el.checked !== {want}) {{
                    el.click();
                    if (el.checked !== {want}) {{
                        el.checked = {want};
                        el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    }}
                }}
                return true;
            }})()"#,
            sel = js_string(selector),
            want = checked
        );
        match self.evaluate(&script).await? {
            serde_json::Value::Bool(true) => Ok(()),
            _ => Err(anyhow!("Checkbox '{}' not found", selector)),
        }
    }

    async fn select_by_label(&self, selector: &str, label: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const select = document.querySelector({sel});
                if (!select || !select.options) return false;
                const wanted = {val}.trim().toLowerCase();
                const match = Array.from(select.options)
                    .find(opt => opt.text.trim().toLowerCase() === wanted);
                if (!match) return false;
                select.value = match.value;
                select.selectedIndex = match.index;
                select.dispatchEvent(new Event('input', {{ bubbles: true }}));
                select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_string(selector),
            val = js_string(label)
        );
        match self.evaluate(&script).await? {
            serde_json::Value::Bool(true) => Ok(()),
            _ => Err(anyhow!("No option labeled '{}' in '{}'", label, selector)),
        }
    }

    async fn select_by_value(&self, selector: &str, value: &str) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const select = document.querySelector({sel});
                if (!select || !select.options) return false;
                const wanted = {val}.trim().toLowerCase();
                const match = Array.from(select.options)
                    .find(opt => opt.value.trim().toLowerCase() === wanted);
                if (!match) return false;
                select.value = match.value;
                select.selectedIndex = match.index;
                select.dispatchEvent(new Event('input', {{ bubbles: true }}));
                select.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sel = js_string(selector),
            val = js_string(value)
        );
        match self.evaluate(&script).await? {
            serde_json::Value::Bool(true) => Ok(()),
            _ => Err(anyhow!("No option valued '{}' in '{}'", value, selector)),
        }
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let page = self.page().await?;
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| anyhow!("Failed to evaluate script: {}", e))?;
        result
            .into_value()
            .map_err(|e| anyhow!("Failed to parse script result: {}", e))
    }

    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<()> {
        let page = self.page().await?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|e| anyhow!("Failed to find file input '{}': {}", selector, e))?;

        let params = SetFileInputFilesParams::builder()
            .files(vec![path.to_string_lossy().to_string()])
            .backend_node_id(element.backend_node_id)
            .build()
            .map_err(|e| anyhow!("Failed to build file input params: {}", e))?;

        page.execute(params)
            .await
            .map_err(|e| anyhow!("Failed to set file on '{}': {}", selector, e))?;
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> Result<()> {
        let page = self.page().await?;
        let element = page
            .find_element(selector)
            .await
            .map_err(|e| anyhow!("Failed to find element '{}': {}", selector, e))?;
        element
            .press_key(key)
            .await
            .map_err(|e| anyhow!("Failed to press '{}' on '{}': {}", key, selector, e))?;
        Ok(())
    }
}
