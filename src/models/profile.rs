use serde::{Deserialize, Serialize};
use serde_json::json;

/// Flat record of candidate attributes, supplied whole once per run and
/// read-only afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub current_company: Option<String>,
    #[serde(default)]
    pub current_job_title: Option<String>,
    #[serde(default)]
    pub years_of_experience: Option<u32>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub highest_degree: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<u32>,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub gpa: Option<String>,
    #[serde(default)]
    pub expected_salary: Option<String>,
    #[serde(default)]
    pub current_salary: Option<String>,
    #[serde(default)]
    pub notice_period: Option<String>,
    #[serde(default)]
    pub work_authorization: Option<String>,
    #[serde(default)]
    pub requires_sponsorship: bool,
    #[serde(default)]
    pub willing_to_relocate: bool,
    #[serde(default)]
    pub preferred_work_location: Option<String>,
    #[serde(default)]
    pub available_start_date: Option<String>,
    #[serde(default)]
    pub technical_skills: Option<String>,
    #[serde(default)]
    pub certifications: Option<String>,
    /// Remote location or local path of the resume document.
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter_url: Option<String>,
    #[serde(default)]
    pub why_this_company: Option<String>,
    #[serde(default)]
    pub career_goals: Option<String>,
    #[serde(default)]
    pub referral_source: Option<String>,
    #[serde(default)]
    pub veteran_status: Option<String>,
    #[serde(default)]
    pub disability_status: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub race: Option<String>,
}

impl CandidateProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// "City, State, Country" with missing parts dropped.
    pub fn location(&self) -> String {
        [&self.city, &self.state, &self.country]
            .iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Structured context handed to the generation back-end alongside a question.
    pub fn generation_context(&self) -> serde_json::Value {
        json!({
            "name": self.full_name(),
            "firstName": self.first_name,
            "lastName": self.last_name,
            "email": self.email,
            "phone": self.phone,
            "location": self.location(),
            "currentJob": self.current_job_title,
            "currentCompany": self.current_company,
            "experience": self.years_of_experience,
            "skills": self.technical_skills,
            "education": self.highest_degree.as_ref().map(|degree| {
                format!(
                    "{} in {}",
                    degree,
                    self.field_of_study.as_deref().unwrap_or("N/A")
                )
            }),
            "university": self.university,
            "linkedin": self.linkedin_url,
            "github": self.github_url,
            "portfolio": self.portfolio_url,
            "workAuth": self.work_authorization,
            "sponsorship": self.requires_sponsorship,
            "relocate": self.willing_to_relocate,
            "salary": self.expected_salary,
            "startDate": self.available_start_date,
            "whyCompany": self.why_this_company,
            "careerGoals": self.career_goals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_trims() {
        let profile = CandidateProfile {
            first_name: "John".into(),
            last_name: "Doe".into(),
            ..Default::default()
        };
        assert_eq!(profile.full_name(), "John Doe");
    }

    #[test]
    fn test_location_drops_missing_parts() {
        let profile = CandidateProfile {
            city: Some("Dublin".into()),
            country: Some("Ireland".into()),
            ..Default::default()
        };
        assert_eq!(profile.location(), "Dublin, Ireland");
    }

    #[test]
    fn test_profile_accepts_camel_case_json() {
        let profile: CandidateProfile = serde_json::from_str(
            r#"{"firstName":"John","lastName":"Doe","email":"john.doe@example.com","phone":"+1-555-123-4567","requiresSponsorship":false}"#,
        )
        .unwrap();
        assert_eq!(profile.first_name, "John");
        assert!(!profile.requires_sponsorship);
    }
}
