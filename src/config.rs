use std::env;
use std::time::Duration;

/// Default generation back-end ladder, tried in order until one answers.
const DEFAULT_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

#[derive(Debug, Clone)]
pub struct Config {
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Ranked list of text-generation model ids (genai auto-detects the provider).
    pub generation_models: Vec<String>,
    /// Per-call budget for one generation back-end.
    pub generation_timeout: Duration,
    /// How long to wait for an element to become available before giving up on a field.
    pub element_timeout: Duration,
    /// Per-character delay when typing into inputs.
    pub type_delay_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            headless: env::var("FORMPILOT_HEADLESS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            generation_models: env::var("FORMPILOT_MODELS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .filter(|models: &Vec<String>| !models.is_empty())
                .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()),
            generation_timeout: Duration::from_millis(
                env::var("FORMPILOT_GENERATION_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10_000),
            ),
            element_timeout: Duration::from_millis(
                env::var("FORMPILOT_ELEMENT_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5_000),
            ),
            type_delay_ms: env::var("FORMPILOT_TYPE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            headless: false,
            generation_models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            generation_timeout: Duration::from_millis(10_000),
            element_timeout: Duration::from_millis(5_000),
            type_delay_ms: 50,
        }
    }
}
