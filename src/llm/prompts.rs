use crate::llm::client::AnswerRequest;

/// System prompt for answering a single application-form question.
pub const ANSWER_SYSTEM_PROMPT: &str = "You are helping fill out a job application form. \
Based on the candidate's profile data, provide an appropriate answer to the question. \
Return ONLY the answer text, nothing else.";

/// Format one answer request for the generation back-end.
pub fn format_answer_request(request: &AnswerRequest) -> String {
    let mut prompt = format!(
        r#"QUESTION: "{}"
FIELD TYPE: {}
REQUIRED: {}

CANDIDATE PROFILE:
{}

"#,
        request.question,
        request.kind.as_str(),
        if request.required { "Yes" } else { "No" },
        serde_json::to_string_pretty(&request.profile_context).unwrap_or_default(),
    );

    match &request.options {
        Some(options) if !options.is_empty() => {
            prompt.push_str("AVAILABLE OPTIONS (select one):\n");
            for (i, option) in options.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, option));
            }
            prompt.push_str(
                r#"
INSTRUCTIONS:
- Choose the BEST MATCHING option from the list above
- Return ONLY the option text exactly as it appears in the list
- If no good match exists, choose the closest option
- For Yes/No questions, choose "Yes" for positive attributes (work authorization, willing to relocate) unless the profile says otherwise
- For eligibility questions, default to "Yes" or "Authorized"
"#,
            );
        }
        _ => {
            prompt.push_str(
                r#"INSTRUCTIONS:
- Provide a concise, professional answer (1-3 sentences max for text fields)
- Use first person ("I", "My", "Me")
- Be specific and authentic based on the profile data
- If asking about location/address, provide the location from the profile
- If asking about experience, use the years of experience
- If asking "why this company", use the profile's motivation text or generate a professional response
- If asking about availability, use the start date or say "Immediately available" or "2 weeks notice"
- For Yes/No questions, answer "Yes" for positive attributes unless the profile indicates otherwise
- NEVER use "N/A", "Not provided", or leave blank - always provide a thoughtful answer
- If data is missing, make a reasonable inference based on the profile context
"#,
            );
        }
    }

    prompt.push_str("\nReturn ONLY the answer text, nothing else.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldKind;
    use serde_json::json;

    #[test]
    fn test_option_list_rendered_verbatim() {
        let request = AnswerRequest {
            question: "Are you authorized to work in the US?".into(),
            kind: FieldKind::Select,
            required: true,
            profile_context: json!({"name": "John Doe"}),
            options: Some(vec!["Yes".into(), "No".into()]),
        };
        let prompt = format_answer_request(&request);
        assert!(prompt.contains("AVAILABLE OPTIONS"));
        assert!(prompt.contains("1. Yes"));
        assert!(prompt.contains("2. No"));
        assert!(prompt.contains("exactly as it appears"));
    }

    #[test]
    fn test_free_text_forbids_placeholders() {
        let request = AnswerRequest {
            question: "Why do you want to join us?".into(),
            kind: FieldKind::Textarea,
            required: false,
            profile_context: json!({}),
            options: None,
        };
        let prompt = format_answer_request(&request);
        assert!(prompt.contains("first person"));
        assert!(prompt.contains("NEVER use \"N/A\""));
        assert!(!prompt.contains("AVAILABLE OPTIONS"));
    }
}
