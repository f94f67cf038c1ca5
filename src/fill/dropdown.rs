use serde_json::Value;
use std::time::Duration;

use super::FillAttempt;
use crate::browser::driver::PageDriver;
use crate::browser::js_string;
use crate::models::{FieldDescriptor, FieldKind, FillStrategy};

const OPEN_SETTLE_MS: u64 = 500;
const FILTER_SETTLE_MS: u64 = 1500;
const CLICK_SETTLE_MS: u64 = 800;
const VERIFY_RETRY_MS: u64 = 500;
const POST_TAB_MS: u64 = 200;

/// How many leading characters are typed to trigger incremental filtering.
const FILTER_PREFIX_CHARS: usize = 15;

/// Drive a selection-like control to the desired value and verify the result.
///
/// Tries an ordered ladder of techniques, preferring the ones most likely to
/// produce a framework-correct state change (native selection, synthetic
/// change events) before resorting to raw key input that cannot be verified.
/// Never raises upward: failures are reported and the run continues.
pub async fn fill_dropdown(
    driver: &dyn PageDriver,
    field: &FieldDescriptor,
    value: &str,
) -> FillAttempt {
    let selector = field.selector.as_str();
    let native = field.kind == FieldKind::Select;

    if native {
        // Stage 1: native direct selection by label, then by underlying value,
        // confirmed by reading the selected option back and rejecting
        // placeholder-like text.
        if driver.select_by_label(selector, value).await.is_ok()
            && native_selection_confirmed(driver, selector).await
        {
            tracing::debug!("Selected {:?} by label on {}", value, selector);
            finish_with_tab(driver, selector).await;
            return FillAttempt::filled(FillStrategy::NativeSelect);
        }
        if driver.select_by_value(selector, value).await.is_ok()
            && native_selection_confirmed(driver, selector).await
        {
            tracing::debug!("Selected {:?} by value on {}", value, selector);
            finish_with_tab(driver, selector).await;
            return FillAttempt::filled(FillStrategy::NativeSelect);
        }

        // Stage 2: programmatic option scan with loose matching, dispatching
        // the change notifications the form logic listens for.
        if evaluates_true(driver, &option_scan_script(selector, value)).await {
            tracing::debug!("Selected {:?} via option scan on {}", value, selector);
            tokio::time::sleep(Duration::from_millis(OPEN_SETTLE_MS)).await;
            finish_with_tab(driver, selector).await;
            return FillAttempt::filled(FillStrategy::OptionScan);
        }
    }

    // Stage 3: open the panel, type to filter, click the matching option.
    if !native {
        let _ = driver.clear(selector).await;
    }

    let opened = open_panel(driver, selector).await;
    if !opened {
        tracing::warn!("Could not confirm option panel opened for {}", selector);
    }

    if native {
        tokio::time::sleep(Duration::from_millis(OPEN_SETTLE_MS)).await;
    } else {
        let _ = driver.clear(selector).await;
        let prefix: String = value.chars().take(FILTER_PREFIX_CHARS).collect();
        tracing::debug!("Typing filter term {:?} into {}", prefix, selector);
        let _ = driver.type_text(selector, &prefix, 100).await;
        tokio::time::sleep(Duration::from_millis(FILTER_SETTLE_MS)).await;
    }

    let mut strategy = None;

    if evaluates_true(driver, &visible_option_click_script(selector, value)).await {
        strategy = Some(FillStrategy::TypeAndPick);
    }

    // Stage 4: broaden to common dropdown containers.
    if strategy.is_none() {
        tokio::time::sleep(Duration::from_millis(VERIFY_RETRY_MS)).await;
        if evaluates_true(driver, &container_scan_script(value)).await {
            strategy = Some(FillStrategy::ContainerScan);
        }
    }

    // Stage 5: plain text lookup over option elements, exact then partial.
    if strategy.is_none() {
        let partial: String = value.chars().take(10).collect();
        if evaluates_true(driver, &text_locator_script(value)).await
            || evaluates_true(driver, &text_locator_script(&partial)).await
        {
            strategy = Some(FillStrategy::TextLocator);
        }
    }

    // Stage 6: keyboard fallback. This stage cannot verify its own outcome,
    // so success is explicitly reported as unverified.
    let Some(strategy) = strategy else {
        tracing::warn!("Falling back to keyboard selection for {}", selector);
        let down = driver.press_key(selector, "ArrowDown").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        let enter = driver.press_key(selector, "Enter").await;
        tokio::time::sleep(Duration::from_millis(VERIFY_RETRY_MS)).await;
        finish_with_tab(driver, selector).await;
        return if down.is_ok() && enter.is_ok() {
            FillAttempt::unverified(
                FillStrategy::Keyboard,
                "keyboard fallback cannot verify its outcome",
            )
        } else {
            FillAttempt::failed("all dropdown strategies exhausted")
        };
    };

    // Multi-signal verification, with one re-check after a settle delay.
    tokio::time::sleep(Duration::from_millis(CLICK_SETTLE_MS)).await;
    let attempt = if selection_verified(driver, selector, value).await {
        FillAttempt::filled(strategy)
    } else {
        tokio::time::sleep(Duration::from_millis(VERIFY_RETRY_MS)).await;
        if evaluates_true(driver, &final_check_script(selector)).await {
            FillAttempt::filled(strategy)
        } else {
            tracing::warn!(
                "Selection of {:?} on {} could not be verified, continuing",
                value,
                selector
            );
            FillAttempt::unverified(strategy, "verification inconclusive")
        }
    };

    finish_with_tab(driver, selector).await;
    attempt
}

/// Attempt to open the option panel: direct activation, JS activation, then
/// keyboard. "Opened" is detected by the appearance of option-like elements.
async fn open_panel(driver: &dyn PageDriver, selector: &str) -> bool {
    if driver.click(selector).await.is_ok() {
        tokio::time::sleep(Duration::from_millis(OPEN_SETTLE_MS)).await;
        if evaluates_true(driver, OPTIONS_OPEN_PROBE).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(OPEN_SETTLE_MS)).await;
    }

    if evaluates_true(driver, &js_activate_script(selector)).await {
        tokio::time::sleep(Duration::from_millis(OPEN_SETTLE_MS)).await;
        if evaluates_true(driver, OPTIONS_OPEN_PROBE).await {
            return true;
        }
    }

    if driver.focus(selector).await.is_ok() {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = driver.press_key(selector, "Space").await;
        tokio::time::sleep(Duration::from_millis(CLICK_SETTLE_MS)).await;
        if evaluates_true(driver, OPTIONS_OPEN_PROBE).await {
            return true;
        }
    }

    false
}

async fn finish_with_tab(driver: &dyn PageDriver, selector: &str) {
    let _ = driver.press_key(selector, "Tab").await;
    tokio::time::sleep(Duration::from_millis(POST_TAB_MS)).await;
}

async fn evaluates_true(driver: &dyn PageDriver, script: &str) -> bool {
    matches!(driver.evaluate(script).await, Ok(Value::Bool(true)))
}

/// Selected option text present and not placeholder-like.
async fn native_selection_confirmed(driver: &dyn PageDriver, selector: &str) -> bool {
    let script = format!(
        r#"(() => {{
            const select = document.querySelector({sel});
            if (!select || !select.options) return false;
            const text = select.options[select.selectedIndex]?.text || '';
            return !!text && !text.toLowerCase().includes('select');
        }})()"#,
        sel = js_string(selector)
    );
    evaluates_true(driver, &script).await
}

async fn selection_verified(driver: &dyn PageDriver, selector: &str, value: &str) -> bool {
    match driver.evaluate(&verification_script(selector, value)).await {
        Ok(result) => result
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        Err(e) => {
            tracing::warn!("Verification read-back failed for {}: {}", selector, e);
            false
        }
    }
}

/// Option-like elements visible anywhere on the page.
const OPTIONS_OPEN_PROBE: &str = r#"document.querySelectorAll('[role="option"], [role="listbox"], .dropdown-menu, .select-options').length > 0"#;

fn js_activate_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.focus(); el.click();
            return true;
        }})()"#,
        sel = js_string(selector)
    )
}

/// Case-insensitive exact/substring/prefix scan over a native select's
/// options. The prefix is compared over the first few characters to tolerate
/// truncated wording.
fn option_scan_script(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
            const select = document.querySelector({sel});
            if (!select || !select.options) return false;
            const val = {val}.toLowerCase().trim();
            const match = Array.from(select.options).find(opt => {{
                const text = opt.text.toLowerCase().trim();
                const optValue = opt.value.toLowerCase().trim();
                return text === val ||
                       optValue === val ||
                       text.includes(val) ||
                       val.includes(text) ||
                       text.startsWith(val.substring(0, Math.min(5, val.length)));
            }});
            if (!match) return false;
            select.value = match.value;
            select.selectedIndex = match.index;
            select.dispatchEvent(new Event('input', {{ bubbles: true }}));
            select.dispatchEvent(new Event('change', {{ bubbles: true }}));
            select.dispatchEvent(new Event('blur', {{ bubbles: true }}));
            return true;
        }})()"#,
        sel = js_string(selector),
        val = js_string(value)
    )
}

/// Exact, then substring/prefix match over visible `[role="option"]` elements.
/// Clicks the match, synthesizes the mouse events some frameworks require, and
/// mirrors the text into the backing input with input/change/blur.
fn visible_option_click_script(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
            const val = {val}.toLowerCase();
            const visible = Array.from(document.querySelectorAll('[role="option"]'))
                .filter(opt => opt.offsetParent !== null);
            let match = visible.find(opt => (opt.textContent || '').trim().toLowerCase() === val);
            if (!match) {{
                match = visible.find(opt => {{
                    const text = (opt.textContent || '').trim().toLowerCase();
                    return text.includes(val) ||
                           val.includes(text) ||
                           text.startsWith(val.substring(0, Math.min(5, val.length)));
                }});
            }}
            if (!match) return false;
            match.scrollIntoView({{ behavior: 'auto', block: 'center' }});
            match.click();
            match.dispatchEvent(new MouseEvent('mousedown', {{ bubbles: true, cancelable: true }}));
            match.dispatchEvent(new MouseEvent('mouseup', {{ bubbles: true, cancelable: true }}));
            match.dispatchEvent(new MouseEvent('click', {{ bubbles: true, cancelable: true }}));
            const input = document.querySelector({sel});
            if (input && input.tagName === 'INPUT') {{
                input.value = (match.textContent || '').trim();
                input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                input.dispatchEvent(new Event('change', {{ bubbles: true }}));
                input.dispatchEvent(new Event('blur', {{ bubbles: true }}));
            }}
            return true;
        }})()"#,
        sel = js_string(selector),
        val = js_string(value)
    )
}

/// Repeat the match-and-click logic inside common dropdown containers.
fn container_scan_script(value: &str) -> String {
    format!(
        r#"(() => {{
            const val = {val}.toLowerCase();
            const containers = [
                '[role="listbox"]',
                '.dropdown-menu',
                '.select-options',
                '.autocomplete-options',
                '[class*="dropdown"]',
                '[class*="select"]'
            ];
            for (const containerSel of containers) {{
                const container = document.querySelector(containerSel);
                if (!container) continue;
                const visible = Array.from(container.querySelectorAll('li, div, span, [role="option"]'))
                    .filter(opt => opt.offsetParent !== null);
                const match = visible.find(opt => {{
                    const text = (opt.textContent || '').trim().toLowerCase();
                    return text === val || text.includes(val) || val.includes(text);
                }});
                if (match) {{
                    match.scrollIntoView({{ behavior: 'auto', block: 'center' }});
                    match.click();
                    match.dispatchEvent(new MouseEvent('mousedown', {{ bubbles: true, cancelable: true }}));
                    match.dispatchEvent(new MouseEvent('mouseup', {{ bubbles: true, cancelable: true }}));
                    match.dispatchEvent(new MouseEvent('click', {{ bubbles: true, cancelable: true }}));
                    return true;
                }}
            }}
            return false;
        }})()"#,
        val = js_string(value)
    )
}

/// Find any option element containing the text and click it.
fn text_locator_script(value: &str) -> String {
    format!(
        r#"(() => {{
            const val = {val}.toLowerCase();
            const match = Array.from(document.querySelectorAll('[role="option"], [role="listbox"] li, .dropdown-option'))
                .filter(el => el.offsetParent !== null)
                .find(el => (el.textContent || '').toLowerCase().includes(val));
            if (!match) return false;
            match.scrollIntoView({{ behavior: 'auto', block: 'center' }});
            match.click();
            return true;
        }})()"#,
        val = js_string(value)
    )
}

/// Read back every signal the value might be stored in. The selection counts
/// as confirmed when the desired value appears, case-insensitively, as a
/// substring of the combined signal or vice versa. The bidirectional check can
/// false-positive on short values ("No"); that tolerance is intentional.
fn verification_script(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return {{ success: false }};
            const inputValue = el.value || '';
            const hidden = el.closest('div, span, label')?.querySelector('input[type="hidden"]');
            const hiddenValue = hidden ? (hidden.value || '') : '';
            let selectValue = '';
            if (el.tagName === 'SELECT') {{
                selectValue = el.options[el.selectedIndex]?.text || '';
            }}
            const container = el.closest('div, span, label, [class*="dropdown"], [class*="select"]');
            const containerText = container ? (container.textContent || '').trim() : '';
            const ariaLabel = el.getAttribute('aria-label') || '';
            const val = {val}.toLowerCase();
            const allText = [inputValue, hiddenValue, selectValue, containerText, ariaLabel]
                .filter(Boolean)
                .join(' ')
                .toLowerCase();
            const success = allText.includes(val) ||
                val.includes(allText.substring(0, Math.min(20, allText.length)));
            return {{ success }};
        }})()"#,
        sel = js_string(selector),
        val = js_string(value)
    )
}

/// Last re-check: the control holds anything that is not placeholder text.
fn final_check_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            const value = el.value ||
                (el.tagName === 'SELECT' ? (el.options[el.selectedIndex]?.text || '') : '') ||
                (el.textContent || '').trim();
            if (!value) return false;
            const lower = value.toLowerCase();
            return !lower.includes('select') && !lower.includes('choose');
        }})()"#,
        sel = js_string(selector)
    )
}
