pub mod dropdown;
pub mod inputs;

use std::time::Duration;

use crate::browser::driver::PageDriver;
use crate::config::Config;
use crate::models::{
    CandidateProfile, FieldDescriptor, FieldKind, FieldReport, FillOutcome, FillStrategy,
    ResolvedValue, RunReport,
};
use crate::resolver::{conditional, fill_order, AnswerMemory, ValueResolver};

/// Result of driving one field: the outcome plus how it was achieved.
#[derive(Debug, Clone)]
pub struct FillAttempt {
    pub outcome: FillOutcome,
    pub strategy: Option<FillStrategy>,
    pub detail: Option<String>,
}

impl FillAttempt {
    pub fn filled(strategy: FillStrategy) -> Self {
        Self {
            outcome: FillOutcome::Filled,
            strategy: Some(strategy),
            detail: None,
        }
    }

    pub fn unverified(strategy: FillStrategy, detail: impl Into<String>) -> Self {
        Self {
            outcome: FillOutcome::Unverified,
            strategy: Some(strategy),
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self {
            outcome: FillOutcome::Skipped,
            strategy: None,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            outcome: FillOutcome::Failed,
            strategy: None,
            detail: Some(detail.into()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Sequences resolution and filling across all fields of one loaded view.
///
/// Per-field failures never abort the run: every field ends as an entry in the
/// run report, filled, unverified, skipped, or failed.
pub struct FormFiller<'a> {
    driver: &'a dyn PageDriver,
    resolver: ValueResolver,
    config: Config,
}

impl<'a> FormFiller<'a> {
    pub fn new(driver: &'a dyn PageDriver, resolver: ValueResolver, config: Config) -> Self {
        Self {
            driver,
            resolver,
            config,
        }
    }

    /// Resolve all answers (generation calls batched up front), then fill
    /// fields one at a time, plain inputs before riskier controls.
    pub async fn fill(
        &self,
        url: &str,
        fields: &[FieldDescriptor],
        profile: &CandidateProfile,
    ) -> RunReport {
        let mut report = RunReport::new(url);
        tracing::info!("Filling {} form fields", fields.len());

        let resolved = self.resolver.resolve_all(fields, profile).await;
        let mut memory = AnswerMemory::default();

        for index in fill_order(fields) {
            let field = &fields[index];
            let mut value = resolved.get(&index).cloned();

            // Conditional fields hang off earlier answers; an override
            // replaces whatever the tiers produced, exactly once.
            if let Some(override_value) = conditional::conditional_override(field, &memory) {
                value = Some(ResolvedValue::Text(override_value));
            }

            // A required checkbox group must never end the run empty.
            if field.kind == FieldKind::CheckboxGroup
                && field.required
                && value.as_ref().map(|v| v.is_empty()).unwrap_or(true)
            {
                let attempt = self.fill_one(field, None).await;
                self.record(&mut report, field, None, attempt);
                continue;
            }

            let name = field.name.to_lowercase();
            if name.contains("captcha") || name.contains("g-recaptcha") || name.contains("hidden") {
                self.record(
                    &mut report,
                    field,
                    None,
                    FillAttempt::skipped("bot-check or bookkeeping control"),
                );
                continue;
            }
            if field.label.is_empty() && field.placeholder.is_empty() && value.is_none() {
                self.record(&mut report, field, None, FillAttempt::skipped("unlabeled, no value"));
                continue;
            }

            let Some(value) = value.filter(|v| !v.is_empty()) else {
                self.record(&mut report, field, None, FillAttempt::skipped("no value available"));
                continue;
            };

            // Remember the answer under the literal label text for later
            // conditional fields.
            let memory_key = if field.label.is_empty() {
                field.name.as_str()
            } else {
                field.label.as_str()
            };
            memory.record(memory_key, value.display());

            let attempt = self.fill_one(field, Some(&value)).await;
            self.record(&mut report, field, Some(&value), attempt);
        }

        report.finish();
        tracing::info!("Form filling complete: {}", report.summary());
        report
    }

    /// Drive one field to its value. Interaction failures are contained here.
    async fn fill_one(&self, field: &FieldDescriptor, value: Option<&ResolvedValue>) -> FillAttempt {
        if let Err(e) = self
            .driver
            .wait_for(&field.selector, self.config.element_timeout)
            .await
        {
            return FillAttempt::failed(format!("element not available: {e}"));
        }

        // File inputs are often hidden, skip hover for them
        if field.kind != FieldKind::File {
            let _ = self.driver.hover(&field.selector).await;
        }

        let text = value.map(|v| v.display()).unwrap_or_default();

        let attempt = if field.kind == FieldKind::CheckboxGroup {
            inputs::fill_checkbox_group(self.driver, field, value).await
        } else if self.routes_to_dropdown(field) {
            dropdown::fill_dropdown(self.driver, field, &text).await
        } else {
            match field.kind {
                FieldKind::Text | FieldKind::Email | FieldKind::Url | FieldKind::Number => {
                    inputs::fill_text(self.driver, field, &text, self.config.type_delay_ms).await
                }
                FieldKind::Textarea => inputs::fill_text(self.driver, field, &text, 30).await,
                FieldKind::Tel => inputs::fill_phone(self.driver, field, &text).await,
                FieldKind::Radio | FieldKind::RadioGroup => {
                    inputs::fill_radio_group(self.driver, field, &text).await
                }
                FieldKind::Checkbox => inputs::fill_checkbox(self.driver, field, &text).await,
                FieldKind::File => inputs::fill_file(self.driver, field, &text).await,
                // Select and CheckboxGroup are handled above
                _ => dropdown::fill_dropdown(self.driver, field, &text).await,
            }
        };

        // Brief settle between interactions; quick kinds need less
        let settle = match field.kind {
            FieldKind::Tel | FieldKind::Email | FieldKind::Number => 100,
            _ => 500,
        };
        tokio::time::sleep(Duration::from_millis(settle)).await;

        attempt
    }

    /// All selection widgets go through the strategy ladder, as do text
    /// controls whose label suggests a disguised dropdown. Phone fields never
    /// do, whatever their markup claims.
    fn routes_to_dropdown(&self, field: &FieldDescriptor) -> bool {
        let identifier = format!("{} {}", field.label, field.name).to_lowercase();
        let is_phone = field.kind == FieldKind::Tel
            || ["phone", "telephone", "mobile"].iter().any(|kw| identifier.contains(kw));
        if is_phone {
            return false;
        }
        if field.kind == FieldKind::Select || field.dropdown_like {
            return true;
        }
        field.kind == FieldKind::Text
            && ["yes", "no", "ireland", "county", "sponsorship", "visa", "authorization"]
                .iter()
                .any(|kw| identifier.contains(kw))
    }

    fn record(
        &self,
        report: &mut RunReport,
        field: &FieldDescriptor,
        value: Option<&ResolvedValue>,
        attempt: FillAttempt,
    ) {
        let label = field.question_text();
        match attempt.outcome {
            FillOutcome::Filled => tracing::info!(
                "{} -> {:?} via {} ({:?})",
                attempt.outcome.as_str(),
                value.map(|v| v.display()).unwrap_or_default(),
                attempt.strategy.map(|s| s.as_str()).unwrap_or("-"),
                label
            ),
            FillOutcome::Unverified => tracing::warn!(
                "unverified fill of {:?} ({})",
                label,
                attempt.detail.as_deref().unwrap_or("-")
            ),
            FillOutcome::Skipped => tracing::info!(
                "skipped {:?} ({})",
                label,
                attempt.detail.as_deref().unwrap_or("-")
            ),
            FillOutcome::Failed => tracing::warn!(
                "failed to fill {:?} ({})",
                label,
                attempt.detail.as_deref().unwrap_or("-")
            ),
        }

        let mut entry = FieldReport::new(label, field.purpose, attempt.outcome);
        if let Some(value) = value {
            entry = entry.with_value(value.display());
        }
        if let Some(strategy) = attempt.strategy {
            entry = entry.with_strategy(strategy);
        }
        if let Some(detail) = attempt.detail {
            entry = entry.with_detail(detail);
        }
        report.push(entry);
    }
}
