use crate::models::{CandidateProfile, FieldDescriptor, FieldKind};

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

/// Local pattern-based defaults keyed on label keywords; the last resort after
/// direct mapping and generation. `None` means the field gets skipped.
pub fn fallback_value(field: &FieldDescriptor, profile: &CandidateProfile) -> Option<String> {
    let label = field.question_text().to_lowercase();

    // Location questions
    if contains_any(&label, &["ireland", "located", "location", "county"])
        || (label.contains("where") && contains_any(&label, &["live", "based"]))
    {
        let in_ireland = profile.country.as_deref() == Some("Ireland");
        if label.contains("ireland") && !label.contains("county") {
            return Some(yes_no(in_ireland));
        }
        if label.contains("county") && in_ireland {
            return profile
                .city
                .clone()
                .or_else(|| profile.state.clone())
                .or_else(|| Some("Dublin".to_string()));
        }
        let location = profile.location();
        return if location.is_empty() { None } else { Some(location) };
    }

    // Yes/No eligibility questions on selection controls default to positive
    if matches!(field.kind, FieldKind::Select | FieldKind::RadioGroup) {
        if contains_any(&label, &["require", "need"]) && contains_any(&label, &["sponsor", "visa"]) {
            return Some(yes_no(profile.requires_sponsorship));
        }
        if contains_any(&label, &["eligible", "authorized", "willing", "able", "can", "have"]) {
            return Some("Yes".to_string());
        }
    }

    // Experience
    if contains_any(&label, &["experience", "years", "how long"]) {
        if let Some(years) = profile.years_of_experience {
            return Some(years.to_string());
        }
    }

    // Education
    if contains_any(&label, &["education", "degree", "university", "school", "college"]) {
        if contains_any(&label, &["degree", "qualification"]) {
            return Some(
                profile
                    .highest_degree
                    .clone()
                    .unwrap_or_else(|| "Bachelor's Degree".to_string()),
            );
        }
        if contains_any(&label, &["university", "school", "college"]) {
            return profile.university.clone();
        }
    }

    // Skills
    if contains_any(&label, &["skill", "technology", "expertise", "proficient"]) {
        return profile.technical_skills.clone();
    }

    // Availability / start date
    if contains_any(&label, &["available", "start", "notice"])
        || (label.contains("when") && label.contains("begin"))
    {
        return Some(
            profile
                .available_start_date
                .clone()
                .unwrap_or_else(|| "Immediately available".to_string()),
        );
    }

    // Motivation ("why us") questions
    if contains_any(&label, &["why", "interest", "motivated", "excited", "drawn"]) {
        return Some(profile.why_this_company.clone().unwrap_or_else(|| {
            format!(
                "I'm excited about this opportunity because it aligns with my {} years of experience in {}.",
                profile
                    .years_of_experience
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "extensive".to_string()),
                profile
                    .current_job_title
                    .clone()
                    .unwrap_or_else(|| "my field".to_string()),
            )
        }));
    }

    // Self-description questions get a sentence assembled from the profile
    if contains_any(&label, &["about", "describe", "introduce"])
        || (label.contains("tell") && label.contains("about"))
    {
        let mut parts = Vec::new();
        if let Some(title) = &profile.current_job_title {
            parts.push(format!("I'm a {title}"));
        }
        if let Some(company) = &profile.current_company {
            parts.push(format!("at {company}"));
        }
        if let Some(years) = profile.years_of_experience {
            parts.push(format!("with {years} years of experience"));
        }
        if let Some(skills) = &profile.technical_skills {
            if let Some(first) = skills.split(',').next() {
                parts.push(format!("specializing in {}", first.trim()));
            }
        }
        if parts.is_empty() {
            return None;
        }
        return Some(format!("{}.", parts.join(" ")));
    }

    None
}
