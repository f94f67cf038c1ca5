pub mod driver;
pub mod inspector;
pub mod manager;

pub use driver::PageDriver;
pub use inspector::inspect_form;
pub use manager::BrowserManager;

/// Embed a Rust string as a JS string literal (quoted and escaped).
pub(crate) fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}
