pub mod registry;

pub use registry::{PatternRegistry, PatternRule, ValueDeriver};

use std::sync::Arc;

use crate::models::{FieldDescriptor, FieldKind, InferredPurpose};

/// Result of classifying one field: the inferred purpose plus the index of the
/// registry rule that won, so callers can tell equal-purpose rules apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub purpose: InferredPurpose,
    pub rule: Option<usize>,
}

impl Classification {
    fn unmapped() -> Self {
        Self {
            purpose: InferredPurpose::Unmapped,
            rule: None,
        }
    }
}

/// Maps raw field identifiers to a closed set of purposes using the injected
/// rule table. Anything unrecognized is tagged `Unmapped` rather than guessed.
pub struct Classifier {
    registry: Arc<PatternRegistry>,
}

impl Classifier {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    /// Scan identifiers (name, label, placeholder, auxiliary tag, in that
    /// order) against the registry. Only a strictly higher priority displaces
    /// the running best, so identifier order and registry order break ties.
    pub fn classify(&self, field: &FieldDescriptor) -> Classification {
        let mut best: Option<usize> = None;
        let mut best_priority = i32::MIN;

        for identifier in field.identifiers() {
            for (index, rule) in self.registry.rules().iter().enumerate() {
                if rule.priority > best_priority && rule.matches(&identifier) {
                    best_priority = rule.priority;
                    best = Some(index);
                }
            }
        }

        // Upload controls get an explicit document check that beats the scan.
        if field.kind == FieldKind::File {
            let text = field.identifier_text();
            if text.contains("resume") || text.contains("cv") {
                return Classification {
                    purpose: InferredPurpose::Resume,
                    rule: None,
                };
            }
            if text.contains("cover letter")
                || text.contains("cover_letter")
                || text.contains("cover-letter")
                || text.contains("coverletter")
            {
                return Classification {
                    purpose: InferredPurpose::CoverLetter,
                    rule: None,
                };
            }
        }

        match best {
            Some(index) => Classification {
                purpose: self.registry.rules()[index].purpose,
                rule: Some(index),
            },
            None => Classification::unmapped(),
        }
    }

    /// Re-type a generically declared control from corroborating keywords.
    /// Affects which fill technique is chosen later, not the purpose.
    pub fn refine_kind(field: &FieldDescriptor) -> FieldKind {
        if field.kind != FieldKind::Text {
            return field.kind;
        }
        let text = format!("{} {} {}", field.name, field.label, field.placeholder).to_lowercase();
        if text.contains("email") {
            FieldKind::Email
        } else if text.contains("phone") || text.contains("tel") || text.contains("mobile") {
            FieldKind::Tel
        } else if ["salary", "year", "experience", "gpa", "number", "days"]
            .iter()
            .any(|kw| text.contains(kw))
        {
            FieldKind::Number
        } else if ["url", "link", "website", "linkedin", "github", "portfolio"]
            .iter()
            .any(|kw| text.contains(kw))
        {
            FieldKind::Url
        } else {
            FieldKind::Text
        }
    }

    /// Classify every descriptor in place: attach purposes, refine generic
    /// kinds, and strip trailing required-markers from labels.
    pub fn annotate(&self, fields: &mut [FieldDescriptor]) {
        let mut mapped = 0usize;
        for field in fields.iter_mut() {
            field.kind = Self::refine_kind(field);
            field.purpose = self.classify(field).purpose;
            field.label = clean_label(&field.label);
            if !field.purpose.is_unmapped() {
                mapped += 1;
            }
        }
        tracing::info!("Classified {}/{} fields to known purposes", mapped, fields.len());
    }
}

/// Strip trailing required-markers ("*", "✱") and surrounding whitespace.
fn clean_label(label: &str) -> String {
    label
        .trim_end_matches(|c: char| c.is_whitespace() || c == '*' || c == '✱')
        .trim()
        .to_string()
}
