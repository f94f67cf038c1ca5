//! Shared test doubles: a scripted fake page driver that records every
//! primitive call and answers evaluate scripts from a substring-keyed table.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use formpilot::browser::PageDriver;
use formpilot::models::{FieldDescriptor, FieldKind, FieldOption, InferredPurpose};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    WaitFor(String),
    Hover(String),
    Click(String),
    Focus(String),
    Clear(String),
    Type { selector: String, text: String },
    Fill { selector: String, value: String },
    SetChecked { selector: String, checked: bool },
    SelectByLabel { selector: String, label: String },
    SelectByValue { selector: String, value: String },
    Evaluate(String),
    SetFiles { selector: String, path: PathBuf },
    PressKey { selector: String, key: String },
}

#[derive(Default)]
pub struct FakeDriver {
    calls: Mutex<Vec<Call>>,
    /// (value, label) pairs of the page's native select options.
    select_options: Vec<(String, String)>,
    /// Substring-keyed responses for evaluate scripts; first match wins,
    /// anything else answers `false`.
    script_responses: Vec<(String, Value)>,
    /// Selectors (by substring) that never become available.
    missing: Vec<String>,
    /// Selectors (by substring) whose click fails.
    unclickable: Vec<String>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_select_options(mut self, options: &[(&str, &str)]) -> Self {
        self.select_options = options
            .iter()
            .map(|(v, l)| (v.to_string(), l.to_string()))
            .collect();
        self
    }

    pub fn respond(mut self, script_marker: &str, value: Value) -> Self {
        self.script_responses.push((script_marker.to_string(), value));
        self
    }

    pub fn with_missing(mut self, selector_marker: &str) -> Self {
        self.missing.push(selector_marker.to_string());
        self
    }

    pub fn with_unclickable(mut self, selector_marker: &str) -> Self {
        self.unclickable.push(selector_marker.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn typed_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Type { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn pressed_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::PressKey { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn evaluated_scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Evaluate(script) => Some(script),
                _ => None,
            })
            .collect()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn selector_in(&self, selector: &str, markers: &[String]) -> bool {
        markers.iter().any(|m| selector.contains(m.as_str()))
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<()> {
        self.log(Call::WaitFor(selector.to_string()));
        if self.selector_in(selector, &self.missing) {
            Err(anyhow!("element '{}' never appeared", selector))
        } else {
            Ok(())
        }
    }

    async fn hover(&self, selector: &str) -> Result<()> {
        self.log(Call::Hover(selector.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.log(Call::Click(selector.to_string()));
        if self.selector_in(selector, &self.unclickable) {
            Err(anyhow!("element '{}' not clickable", selector))
        } else {
            Ok(())
        }
    }

    async fn focus(&self, selector: &str) -> Result<()> {
        self.log(Call::Focus(selector.to_string()));
        Ok(())
    }

    async fn clear(&self, selector: &str) -> Result<()> {
        self.log(Call::Clear(selector.to_string()));
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str, _delay_ms: u64) -> Result<()> {
        self.log(Call::Type {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.log(Call::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn set_checked(&self, selector: &str, checked: bool) -> Result<()> {
        self.log(Call::SetChecked {
            selector: selector.to_string(),
            checked,
        });
        Ok(())
    }

    async fn select_by_label(&self, selector: &str, label: &str) -> Result<()> {
        self.log(Call::SelectByLabel {
            selector: selector.to_string(),
            label: label.to_string(),
        });
        if self
            .select_options
            .iter()
            .any(|(_, l)| l.eq_ignore_ascii_case(label))
        {
            Ok(())
        } else {
            Err(anyhow!("no option labeled '{}'", label))
        }
    }

    async fn select_by_value(&self, selector: &str, value: &str) -> Result<()> {
        self.log(Call::SelectByValue {
            selector: selector.to_string(),
            value: value.to_string(),
        });
        if self
            .select_options
            .iter()
            .any(|(v, _)| v.eq_ignore_ascii_case(value))
        {
            Ok(())
        } else {
            Err(anyhow!("no option valued '{}'", value))
        }
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        self.log(Call::Evaluate(script.to_string()));
        for (marker, value) in &self.script_responses {
            if script.contains(marker.as_str()) {
                return Ok(value.clone());
            }
        }
        Ok(Value::Bool(false))
    }

    async fn set_input_files(&self, selector: &str, path: &Path) -> Result<()> {
        self.log(Call::SetFiles {
            selector: selector.to_string(),
            path: path.to_path_buf(),
        });
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> Result<()> {
        self.log(Call::PressKey {
            selector: selector.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }
}

/// Script markers for the strategy machine's evaluate calls, matched against
/// distinctive fragments of each script.
pub mod markers {
    /// Native read-back confirming a non-placeholder selection.
    pub const NATIVE_CONFIRM: &str = "!!text &&";
    /// Probe for option-like elements after an open attempt.
    pub const OPEN_PROBE: &str = ", .dropdown-menu, .select-options";
    /// Programmatic scan over native select options.
    pub const OPTION_SCAN: &str = "select.selectedIndex = match.index";
    /// Visible `[role="option"]` match-and-click.
    pub const VISIBLE_OPTION_CLICK: &str = "tagName === 'INPUT'";
    /// Broadened container scan.
    pub const CONTAINER_SCAN: &str = ".autocomplete-options";
    /// Text-content locator.
    pub const TEXT_LOCATOR: &str = ".dropdown-option";
    /// Multi-signal verification read-back.
    pub const VERIFICATION: &str = r#"input[type="hidden"]"#;
    /// Last-resort placeholder check.
    pub const FINAL_CHECK: &str = "'choose'";
    /// JS focus-and-click activation.
    pub const JS_ACTIVATE: &str = "el.focus(); el.click();";
}

pub fn descriptor(name: &str, label: &str, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor {
        selector: format!("#{}", name),
        name: name.to_string(),
        label: label.to_string(),
        placeholder: String::new(),
        data_qa: String::new(),
        kind,
        required: false,
        options: vec![],
        dropdown_like: false,
        purpose: InferredPurpose::Unmapped,
    }
}

pub fn option(value: &str, label: &str) -> FieldOption {
    FieldOption {
        value: value.to_string(),
        label: label.to_string(),
        checked: false,
    }
}
