pub mod conditional;
pub mod heuristics;

use dashmap::DashMap;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

use crate::classifier::PatternRegistry;
use crate::llm::{AnswerRequest, AnswerSource};
use crate::models::{CandidateProfile, FieldDescriptor, InferredPurpose, ResolvedValue};

/// Answers already placed during this run, keyed by the literal label text
/// seen. Two differently-labeled fields asking the same underlying question do
/// not share memory. Lives for one form-fill call.
#[derive(Debug, Default)]
pub struct AnswerMemory {
    answers: Vec<(String, String)>,
}

impl AnswerMemory {
    pub fn record(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        if label.is_empty() {
            return;
        }
        self.answers.push((label, value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Identifiers suggesting a bot-prevention challenge or hidden bookkeeping
/// control; these are never answered.
pub fn is_bot_check(field: &FieldDescriptor) -> bool {
    let name = field.name.to_lowercase();
    name.contains("captcha")
        || name.contains("g-recaptcha")
        || name.contains("hidden")
        || (field.label.is_empty() && field.placeholder.is_empty())
}

/// Turns an inferred purpose (or its absence) into a concrete answer through
/// direct profile lookup, external generation, and heuristic fallback, in that
/// order, stopping at the first tier that yields a non-empty answer.
pub struct ValueResolver {
    registry: Arc<PatternRegistry>,
    source: Option<Arc<dyn AnswerSource>>,
}

impl ValueResolver {
    pub fn new(registry: Arc<PatternRegistry>, source: Option<Arc<dyn AnswerSource>>) -> Self {
        Self { registry, source }
    }

    /// Tier 1: fixed purpose-to-profile mapping, preferring a registry
    /// deriver when the matched rule carries one.
    pub fn direct(&self, field: &FieldDescriptor, profile: &CandidateProfile) -> Option<ResolvedValue> {
        if let Some(derived) = self.registry.derived_value(field.purpose, profile) {
            if !derived.is_empty() {
                return Some(ResolvedValue::Text(derived));
            }
        }
        direct_value(field.purpose, profile).map(ResolvedValue::Text)
    }

    /// Resolve every field up front. Generation calls are network-bound and
    /// independent, so all of them across the form are dispatched concurrently
    /// and joined before any field is filled.
    pub async fn resolve_all(
        &self,
        fields: &[FieldDescriptor],
        profile: &CandidateProfile,
    ) -> HashMap<usize, ResolvedValue> {
        // Written concurrently during the generation phase; keys are field
        // indices, so concurrent writers never target the same entry.
        let resolved: DashMap<usize, ResolvedValue> = DashMap::new();
        let mut pending = Vec::new();

        for (index, field) in fields.iter().enumerate() {
            if let Some(value) = self.direct(field, profile) {
                if !value.is_empty() {
                    resolved.insert(index, value);
                    continue;
                }
            }

            if is_bot_check(field) {
                tracing::debug!("Skipping bot-check/hidden field {:?}", field.name);
                continue;
            }

            // Generation is worth a network call only for required fields or
            // ones with a descriptive label; everything else waits for the
            // heuristic tier at most.
            if field.required || field.question_text().trim().len() > 3 {
                pending.push(self.resolve_pending(index, field, profile, &resolved));
            }
        }

        if !pending.is_empty() {
            tracing::info!("Waiting for {} generated answer(s)...", pending.len());
        }
        join_all(pending).await;

        resolved.into_iter().collect()
    }

    /// Tier 2 then tier 3 for one field, settling into the shared map.
    async fn resolve_pending(
        &self,
        index: usize,
        field: &FieldDescriptor,
        profile: &CandidateProfile,
        resolved: &DashMap<usize, ResolvedValue>,
    ) {
        let generated = match &self.source {
            Some(source) => {
                let options = field.option_texts();
                let request = AnswerRequest {
                    question: field.question_text().to_string(),
                    kind: field.kind,
                    required: field.required,
                    profile_context: profile.generation_context(),
                    options: if options.is_empty() { None } else { Some(options) },
                };
                match source.generate(&request).await {
                    Ok(answer) if !answer.trim().is_empty() => Some(answer.trim().to_string()),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!("Generation failed for {:?}: {}", field.question_text(), e);
                        None
                    }
                }
            }
            None => None,
        };

        let value = generated.or_else(|| heuristics::fallback_value(field, profile));
        if let Some(value) = value {
            if !value.is_empty() {
                resolved.insert(index, ResolvedValue::Text(value));
            }
        }
    }
}

/// The fixed tier-1 lookup from purpose to profile attribute. `Unmapped`
/// never has a direct mapping. Categories candidates may decline default to
/// an explicit "prefer not to answer" value rather than staying blank.
pub fn direct_value(purpose: InferredPurpose, profile: &CandidateProfile) -> Option<String> {
    use InferredPurpose::*;

    let non_empty = |s: &str| {
        if s.is_empty() {
            None
        } else {
            Some(s.to_string())
        }
    };

    match purpose {
        FirstName => non_empty(&profile.first_name),
        LastName => non_empty(&profile.last_name),
        FullName => non_empty(&profile.full_name()),
        Email => non_empty(&profile.email),
        Phone => non_empty(&profile.phone),
        Address => profile.address.clone(),
        City => profile.city.clone(),
        State => profile.state.clone(),
        ZipCode => profile.zip_code.clone(),
        Country => profile.country.clone(),
        CurrentCompany => profile.current_company.clone(),
        CurrentJobTitle => profile.current_job_title.clone(),
        YearsOfExperience => profile.years_of_experience.map(|y| y.to_string()),
        LinkedinUrl => profile.linkedin_url.clone(),
        GithubUrl => profile.github_url.clone(),
        PortfolioUrl => profile.portfolio_url.clone(),
        WebsiteUrl => profile.website_url.clone().or_else(|| profile.portfolio_url.clone()),
        HighestDegree => profile.highest_degree.clone(),
        University => profile.university.clone(),
        GraduationYear => profile.graduation_year.map(|y| y.to_string()),
        FieldOfStudy => profile.field_of_study.clone(),
        Gpa => profile.gpa.clone(),
        ExpectedSalary => profile.expected_salary.clone(),
        CurrentSalary => profile.current_salary.clone(),
        NoticePeriod => profile.notice_period.clone(),
        WorkAuthorization => profile.work_authorization.clone(),
        RequiresSponsorship => Some(if profile.requires_sponsorship { "Yes" } else { "No" }.to_string()),
        WillingToRelocate => Some(if profile.willing_to_relocate { "Yes" } else { "No" }.to_string()),
        PreferredWorkLocation => profile.preferred_work_location.clone(),
        AvailableStartDate => profile.available_start_date.clone(),
        TechnicalSkills => profile.technical_skills.clone(),
        Certifications => profile.certifications.clone(),
        Resume => profile.resume_url.clone(),
        CoverLetter => profile.cover_letter_url.clone(),
        WhyThisCompany => profile.why_this_company.clone(),
        CareerGoals => profile.career_goals.clone(),
        ReferralSource => profile.referral_source.clone(),
        HearAboutUs => Some(
            profile
                .referral_source
                .clone()
                .unwrap_or_else(|| "Online Job Board".to_string()),
        ),
        VeteranStatus => Some(
            profile
                .veteran_status
                .clone()
                .unwrap_or_else(|| "I don't wish to answer".to_string()),
        ),
        DisabilityStatus => Some(
            profile
                .disability_status
                .clone()
                .unwrap_or_else(|| "I don't wish to answer".to_string()),
        ),
        Gender => Some(
            profile
                .gender
                .clone()
                .unwrap_or_else(|| "Prefer not to say".to_string()),
        ),
        Race => Some(
            profile
                .race
                .clone()
                .unwrap_or_else(|| "Prefer not to say".to_string()),
        ),
        Unmapped => None,
    }
}

/// Stable fill order: plain single-line inputs first, riskier controls
/// (selection widgets, groups, uploads) after, relative order preserved
/// within each class.
pub fn fill_order(fields: &[FieldDescriptor]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fields.len()).collect();
    order.sort_by_key(|&i| !fields[i].kind.is_basic_input());
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldKind, FieldOption};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingSource {
        calls: AtomicUsize,
        reply: Option<String>,
        last_request: Mutex<Option<AnswerRequest>>,
    }

    impl CountingSource {
        fn replying(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Some(reply.to_string()),
                last_request: Mutex::new(None),
            }
        }

        fn unreachable() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: None,
                last_request: Mutex::new(None),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnswerSource for CountingSource {
        async fn generate(&self, request: &AnswerRequest) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(anyhow!("back-end unreachable")),
            }
        }
    }

    fn profile() -> CandidateProfile {
        CandidateProfile {
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@example.com".into(),
            phone: "+1-555-123-4567".into(),
            city: Some("San Francisco".into()),
            country: Some("United States".into()),
            years_of_experience: Some(5),
            ..Default::default()
        }
    }

    fn field(name: &str, label: &str, kind: FieldKind, purpose: InferredPurpose) -> FieldDescriptor {
        FieldDescriptor {
            selector: format!("#{name}"),
            name: name.into(),
            label: label.into(),
            placeholder: String::new(),
            data_qa: String::new(),
            kind,
            required: false,
            options: vec![],
            dropdown_like: false,
            purpose,
        }
    }

    fn resolver(source: Option<Arc<dyn AnswerSource>>) -> ValueResolver {
        ValueResolver::new(Arc::new(PatternRegistry::standard()), source)
    }

    #[tokio::test]
    async fn test_direct_mapping_never_invokes_generation() {
        let source = Arc::new(CountingSource::replying("should not be used"));
        let resolver = resolver(Some(source.clone()));
        let fields = vec![field("email", "Email", FieldKind::Email, InferredPurpose::Email)];

        let resolved = resolver.resolve_all(&fields, &profile()).await;
        assert_eq!(
            resolved.get(&0),
            Some(&ResolvedValue::text("john.doe@example.com"))
        );
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_generation_falls_through_to_heuristics() {
        let source = Arc::new(CountingSource::unreachable());
        let resolver = resolver(Some(source.clone()));
        let mut f = field("q_loc", "Where are you currently based?", FieldKind::Text, InferredPurpose::Unmapped);
        f.required = true;

        let resolved = resolver.resolve_all(&[f], &profile()).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(
            resolved.get(&0),
            Some(&ResolvedValue::text("San Francisco, United States"))
        );
    }

    #[tokio::test]
    async fn test_generation_receives_option_list() {
        let source = Arc::new(CountingSource::replying("Authorized"));
        let resolver = resolver(Some(source.clone()));
        let mut f = field(
            "q_auth",
            "Work authorization status",
            FieldKind::Select,
            InferredPurpose::Unmapped,
        );
        f.options = vec![
            FieldOption { value: "auth".into(), label: "Authorized".into(), checked: false },
            FieldOption { value: "not".into(), label: "Not authorized".into(), checked: false },
        ];

        let resolved = resolver.resolve_all(&[f], &profile()).await;
        assert_eq!(resolved.get(&0), Some(&ResolvedValue::text("Authorized")));
        let request = source.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            request.options.as_deref(),
            Some(&["Authorized".to_string(), "Not authorized".to_string()][..])
        );
        assert!(request.required);
    }

    #[tokio::test]
    async fn test_short_label_optional_field_not_generated() {
        let source = Arc::new(CountingSource::replying("noise"));
        let resolver = resolver(Some(source.clone()));
        let f = field("q1", "ok", FieldKind::Text, InferredPurpose::Unmapped);

        let resolved = resolver.resolve_all(&[f], &profile()).await;
        assert!(resolved.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_bot_check_fields_never_answered() {
        let source = Arc::new(CountingSource::replying("noise"));
        let resolver = resolver(Some(source.clone()));
        let mut f = field(
            "g-recaptcha-response",
            "Please verify you are human",
            FieldKind::Text,
            InferredPurpose::Unmapped,
        );
        f.required = true;

        let resolved = resolver.resolve_all(&[f], &profile()).await;
        assert!(resolved.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_mapped_purpose_without_profile_value_tries_later_tiers() {
        // LinkedIn purpose with no profile URL: tier 1 yields nothing, tier 2
        // is unreachable, tier 3 has no keyword match, so the field is skipped.
        let source = Arc::new(CountingSource::unreachable());
        let resolver = resolver(Some(source.clone()));
        let f = field(
            "urls[LinkedIn]",
            "LinkedIn Profile URL",
            FieldKind::Url,
            InferredPurpose::LinkedinUrl,
        );

        let resolved = resolver.resolve_all(&[f], &profile()).await;
        assert_eq!(source.calls(), 1);
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_demographic_defaults_decline_politely() {
        let p = profile();
        assert_eq!(
            direct_value(InferredPurpose::Gender, &p).as_deref(),
            Some("Prefer not to say")
        );
        assert_eq!(
            direct_value(InferredPurpose::VeteranStatus, &p).as_deref(),
            Some("I don't wish to answer")
        );
        assert_eq!(direct_value(InferredPurpose::Unmapped, &p), None);
    }

    #[test]
    fn test_fill_order_puts_basic_inputs_first() {
        let fields = vec![
            field("country", "Country", FieldKind::Select, InferredPurpose::Country),
            field("first", "First Name", FieldKind::Text, InferredPurpose::FirstName),
            field("resume", "Resume", FieldKind::File, InferredPurpose::Resume),
            field("phone", "Phone", FieldKind::Tel, InferredPurpose::Phone),
        ];
        assert_eq!(fill_order(&fields), vec![1, 3, 0, 2]);
    }
}
