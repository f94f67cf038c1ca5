use super::AnswerMemory;
use crate::models::FieldDescriptor;

/// Explicit answer for a conditional follow-up whose precondition failed.
pub const NOT_APPLICABLE_ANSWER: &str = "Not applicable - I do not live in Ireland";

/// Re-examine a conditional ("If yes, ...") field against answers already
/// placed. When the prior question it hangs off was answered negatively, the
/// follow-up is overridden to an explicit not-applicable string instead of
/// being left blank.
///
/// This is a narrow, pattern-specific mechanism, not an expression evaluator:
/// it recognizes the county-within-Ireland follow-up correlated with an
/// "are you located in Ireland" style question.
pub fn conditional_override(field: &FieldDescriptor, memory: &AnswerMemory) -> Option<String> {
    let label = field.label.to_lowercase();

    let conditional = label.contains("if yes")
        || (label.contains("if") && label.contains("yes"))
        || label.contains("conditional")
        || label.contains("depends on");
    if !conditional {
        return None;
    }

    let county_follow_up = (label.contains("county") && label.contains("ireland"))
        || (label.contains("if") && label.contains("yes") && label.contains("county"));
    if !county_follow_up {
        return None;
    }

    for (prior_label, answer) in memory.iter() {
        let prior = prior_label.to_lowercase();
        if prior.contains("ireland") && prior.contains("located") {
            let answer = answer.to_lowercase();
            if answer == "no" || answer == "false" {
                tracing::info!(
                    "Conditional field {:?} overridden: prior answer to {:?} was negative",
                    field.label,
                    prior_label
                );
                return Some(NOT_APPLICABLE_ANSWER.to_string());
            }
        }
    }

    None
}
