use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use super::FillAttempt;
use crate::browser::driver::PageDriver;
use crate::browser::js_string;
use crate::files;
use crate::models::{FieldDescriptor, FillStrategy, ResolvedValue};

/// Clear-then-type into a plain input or textarea.
pub async fn fill_text(
    driver: &dyn PageDriver,
    field: &FieldDescriptor,
    value: &str,
    delay_ms: u64,
) -> FillAttempt {
    let selector = field.selector.as_str();
    if let Err(e) = driver.click(selector).await {
        return FillAttempt::failed(format!("could not focus input: {e}"));
    }
    let _ = driver.clear(selector).await;
    match driver.type_text(selector, value, delay_ms).await {
        Ok(()) => FillAttempt::filled(FillStrategy::Typed),
        Err(e) => FillAttempt::failed(format!("typing failed: {e}")),
    }
}

/// Strip a leading international dialing prefix ("+1 ", "+353-", ...) so the
/// number matches what domestic-format phone inputs expect.
pub fn strip_dialing_prefix(phone: &str) -> String {
    let Some(rest) = phone.strip_prefix('+') else {
        return phone.to_string();
    };
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return phone.to_string();
    }
    let rest = &rest[digits.min(3)..];
    rest.strip_prefix(['-', ' ']).unwrap_or(rest).to_string()
}

/// Phone inputs get a plain immediate fill, no per-key delays.
pub async fn fill_phone(driver: &dyn PageDriver, field: &FieldDescriptor, value: &str) -> FillAttempt {
    let stripped = strip_dialing_prefix(value);
    tracing::debug!("Phone value {:?} -> {:?}", value, stripped);
    match driver.fill(&field.selector, &stripped).await {
        Ok(()) => FillAttempt::filled(FillStrategy::Typed),
        Err(e) => FillAttempt::failed(format!("phone fill failed: {e}")),
    }
}

/// Check the radio whose value matches, falling back to label-substring match.
pub async fn fill_radio_group(
    driver: &dyn PageDriver,
    field: &FieldDescriptor,
    value: &str,
) -> FillAttempt {
    let radio_selector = format!(r#"input[name="{}"][value="{}"]"#, field.name, value);
    let _ = driver.hover(&radio_selector).await;

    let clicked = match driver.click(&radio_selector).await {
        Ok(()) => true,
        Err(_) => {
            let script = format!(
                r#"(() => {{
                    const radios = document.querySelectorAll('input[name=' + JSON.stringify({name}) + ']');
                    const val = {val}.toLowerCase();
                    for (const radio of radios) {{
                        const label = radio.closest('label')?.textContent?.trim() || '';
                        if (label.toLowerCase().includes(val)) {{
                            radio.click();
                            return true;
                        }}
                    }}
                    return false;
                }})()"#,
                name = js_string(&field.name),
                val = js_string(value)
            );
            matches!(driver.evaluate(&script).await, Ok(Value::Bool(true)))
        }
    };

    let _ = driver.press_key(&radio_selector, "Tab").await;
    if clicked {
        FillAttempt::filled(FillStrategy::Checked)
    } else {
        FillAttempt::failed(format!("no radio option matched {value:?}"))
    }
}

/// A lone checkbox: check for affirmative values, uncheck otherwise.
pub async fn fill_checkbox(driver: &dyn PageDriver, field: &FieldDescriptor, value: &str) -> FillAttempt {
    let want = matches!(value.to_lowercase().as_str(), "true" | "yes" | "1" | "on");
    let result = driver.set_checked(&field.selector, want).await;
    let _ = driver.press_key(&field.selector, "Tab").await;
    match result {
        Ok(()) => FillAttempt::filled(FillStrategy::Checked),
        Err(e) => FillAttempt::failed(format!("checkbox toggle failed: {e}")),
    }
}

/// Check every resolved option by value match, falling back to label-substring
/// match. A required group with nothing resolved auto-selects its first
/// available option rather than staying empty.
pub async fn fill_checkbox_group(
    driver: &dyn PageDriver,
    field: &FieldDescriptor,
    value: Option<&ResolvedValue>,
) -> FillAttempt {
    let mut values: Vec<String> = match value {
        Some(ResolvedValue::Options(options)) => options.clone(),
        Some(ResolvedValue::Text(text)) if !text.is_empty() => vec![text.clone()],
        _ => Vec::new(),
    };

    if values.is_empty() {
        if !field.required {
            return FillAttempt::skipped("no value for optional checkbox group");
        }
        // Prefer the declared option list; inspect the live group when none
        // was captured.
        if let Some(first) = field.options.first() {
            values.push(first.display().to_string());
        } else if let Ok(Value::String(first)) =
            driver.evaluate(&first_group_option_script(&field.name)).await
        {
            if !first.is_empty() {
                values.push(first);
            }
        }

        if values.is_empty() {
            // Last resort: check the first box in the group directly.
            return match driver.evaluate(&check_first_box_script(&field.name)).await {
                Ok(Value::Bool(true)) => FillAttempt::filled(FillStrategy::Checked),
                _ => FillAttempt::failed("required checkbox group has no reachable options"),
            };
        }
        tracing::info!(
            "Required checkbox group {:?} auto-selecting {:?}",
            field.question_text(),
            values
        );
    }

    let mut any_checked = false;
    for val in &values {
        let checkbox_selector = format!(r#"input[name="{}"][value="{}"]"#, field.name, val);
        if driver.set_checked(&checkbox_selector, true).await.is_ok() {
            any_checked = true;
            continue;
        }
        let script = label_match_check_script(&field.name, val);
        if matches!(driver.evaluate(&script).await, Ok(Value::Bool(true))) {
            any_checked = true;
        } else {
            tracing::warn!("Could not find checkbox option {:?}", val);
        }
    }

    if any_checked {
        FillAttempt::filled(FillStrategy::Checked)
    } else {
        FillAttempt::failed("no checkbox option matched")
    }
}

/// Accept a remote document location or an existing local path and hand it to
/// the file input. Upload success is inferred from the call not raising; some
/// hosting frameworks swap the control out afterwards, making read-back
/// verification unreliable.
pub async fn fill_file(driver: &dyn PageDriver, field: &FieldDescriptor, value: &str) -> FillAttempt {
    let (path, is_scratch) = if value.starts_with("http://") || value.starts_with("https://") {
        match files::download_document(value).await {
            Ok(path) => (path, true),
            Err(e) => {
                // Retrieval failure abandons this field; the run proceeds.
                return FillAttempt::failed(format!("document retrieval failed: {e}"));
            }
        }
    } else {
        let path = PathBuf::from(value);
        if !path.exists() {
            return FillAttempt::failed(format!("no such local document: {value}"));
        }
        (path, false)
    };

    // Hidden file inputs cannot receive files; reveal them for the upload.
    let _ = driver.evaluate(&reveal_file_input_script(&field.selector)).await;
    let result = driver.set_input_files(&field.selector, &path).await;
    let _ = driver.evaluate(&restore_file_input_script(&field.selector)).await;

    // Leave the form a moment to process before the scratch copy disappears.
    tokio::time::sleep(Duration::from_millis(500)).await;
    if is_scratch {
        files::schedule_cleanup(path);
    }

    match result {
        Ok(()) => {
            FillAttempt::filled(FillStrategy::Uploaded).with_detail("upload inferred from call success")
        }
        Err(e) => FillAttempt::failed(format!("upload failed: {e}")),
    }
}

fn first_group_option_script(name: &str) -> String {
    format!(
        r#"(() => {{
            const boxes = document.querySelectorAll('input[name=' + JSON.stringify({name}) + '][type="checkbox"]');
            if (boxes.length === 0) return '';
            const first = boxes[0];
            const label = document.querySelector('label[for=' + JSON.stringify(first.id) + ']')?.textContent?.trim();
            return label || first.value || '';
        }})()"#,
        name = js_string(name)
    )
}

fn check_first_box_script(name: &str) -> String {
    format!(
        r#"(() => {{
            const boxes = document.querySelectorAll('input[name=' + JSON.stringify({name}) + '][type="checkbox"]');
            if (boxes.length === 0) return false;
            boxes[0].checked = true;
            boxes[0].dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        name = js_string(name)
    )
}

fn label_match_check_script(name: &str, value: &str) -> String {
    format!(
        r#"(() => {{
            const boxes = document.querySelectorAll('input[name=' + JSON.stringify({name}) + '][type="checkbox"]');
            const val = {val}.toLowerCase();
            for (const box of boxes) {{
                const label = document.querySelector('label[for=' + JSON.stringify(box.id) + ']')?.textContent?.trim().toLowerCase() || '';
                const boxValue = (box.value || '').toLowerCase();
                if (label.includes(val) || val.includes(label) || boxValue === val || val.includes(boxValue)) {{
                    box.checked = true;
                    box.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return true;
                }}
            }}
            return false;
        }})()"#,
        name = js_string(name),
        val = js_string(value)
    )
}

fn reveal_file_input_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.__previousStyle = el.style.cssText;
            el.style.position = 'absolute';
            el.style.visibility = 'visible';
            el.style.opacity = '1';
            el.style.width = '1px';
            el.style.height = '1px';
            return true;
        }})()"#,
        sel = js_string(selector)
    )
}

fn restore_file_input_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el || el.__previousStyle === undefined) return false;
            el.style.cssText = el.__previousStyle;
            delete el.__previousStyle;
            return true;
        }})()"#,
        sel = js_string(selector)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_dialing_prefix() {
        assert_eq!(strip_dialing_prefix("+1-555-123-4567"), "555-123-4567");
        assert_eq!(strip_dialing_prefix("+353 87 123 4567"), "87 123 4567");
        assert_eq!(strip_dialing_prefix("+9251234567"), "51234567");
        assert_eq!(strip_dialing_prefix("555-123-4567"), "555-123-4567");
        assert_eq!(strip_dialing_prefix("+"), "+");
    }
}
