use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field::InferredPurpose;

/// What happened to one field by the end of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillOutcome {
    /// Driven to the resolved value and confirmed by read-back.
    Filled,
    /// Driven, but the outcome could not be confirmed (keyboard fallback or
    /// inconclusive verification).
    Unverified,
    /// No value could be resolved, or the field was deliberately left alone.
    Skipped,
    /// An interaction or retrieval error; the run continued past it.
    Failed,
}

impl FillOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillOutcome::Filled => "filled",
            FillOutcome::Unverified => "unverified",
            FillOutcome::Skipped => "skipped",
            FillOutcome::Failed => "failed",
        }
    }
}

/// The technique that produced a fill, for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillStrategy {
    /// Native select driven by label or value.
    NativeSelect,
    /// Programmatic option scan over a native select.
    OptionScan,
    /// Open the panel, type to filter, click the matching option.
    TypeAndPick,
    /// Broadened search across common dropdown containers.
    ContainerScan,
    /// Text-content lookup across option elements.
    TextLocator,
    /// ArrowDown + Enter, success assumed.
    Keyboard,
    /// Cleared and typed into a plain input.
    Typed,
    /// Checkbox or radio interaction.
    Checked,
    /// File handed to the upload control.
    Uploaded,
}

impl FillStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillStrategy::NativeSelect => "native_select",
            FillStrategy::OptionScan => "option_scan",
            FillStrategy::TypeAndPick => "type_and_pick",
            FillStrategy::ContainerScan => "container_scan",
            FillStrategy::TextLocator => "text_locator",
            FillStrategy::Keyboard => "keyboard",
            FillStrategy::Typed => "typed",
            FillStrategy::Checked => "checked",
            FillStrategy::Uploaded => "uploaded",
        }
    }
}

/// Per-field trace entry: what was attempted, with what answer, and how it ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldReport {
    pub label: String,
    pub purpose: InferredPurpose,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub outcome: FillOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<FillStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FieldReport {
    pub fn new(label: impl Into<String>, purpose: InferredPurpose, outcome: FillOutcome) -> Self {
        Self {
            label: label.into(),
            purpose,
            value: None,
            outcome,
            strategy: None,
            detail: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_strategy(mut self, strategy: FillStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// The audit record for one form-filling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub id: String,
    pub url: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub fields: Vec<FieldReport>,
}

impl RunReport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            started_at: Utc::now(),
            finished_at: None,
            fields: Vec::new(),
        }
    }

    pub fn push(&mut self, report: FieldReport) {
        self.fields.push(report);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn count(&self, outcome: FillOutcome) -> usize {
        self.fields.iter().filter(|f| f.outcome == outcome).count()
    }

    /// One-line digest for the end-of-run log.
    pub fn summary(&self) -> String {
        format!(
            "{} fields: {} filled, {} unverified, {} skipped, {} failed",
            self.fields.len(),
            self.count(FillOutcome::Filled),
            self.count(FillOutcome::Unverified),
            self.count(FillOutcome::Skipped),
            self.count(FillOutcome::Failed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = RunReport::new("https://example.com/jobs/1");
        report.push(FieldReport::new("First Name", InferredPurpose::FirstName, FillOutcome::Filled));
        report.push(FieldReport::new("County", InferredPurpose::Unmapped, FillOutcome::Unverified));
        report.push(FieldReport::new("LinkedIn", InferredPurpose::LinkedinUrl, FillOutcome::Skipped));
        report.finish();

        assert_eq!(report.count(FillOutcome::Filled), 1);
        assert_eq!(report.count(FillOutcome::Unverified), 1);
        assert_eq!(report.count(FillOutcome::Skipped), 1);
        assert_eq!(report.count(FillOutcome::Failed), 0);
        assert!(report.finished_at.is_some());
        assert!(report.summary().contains("3 fields"));
    }
}
