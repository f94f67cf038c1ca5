use regex::Regex;

use crate::models::{CandidateProfile, InferredPurpose};

/// Derives a value straight off the profile for rules whose answer is a
/// projection rather than a single attribute.
pub type ValueDeriver = fn(&CandidateProfile) -> Option<String>;

/// One identifier-recognition rule: any pattern matching promotes the field to
/// the rule's purpose, with priority as the tie-break weight (higher wins).
pub struct PatternRule {
    patterns: Vec<Regex>,
    pub purpose: InferredPurpose,
    pub priority: i32,
    pub derive: Option<ValueDeriver>,
}

impl PatternRule {
    fn new(patterns: &[&str], purpose: InferredPurpose, priority: i32) -> Self {
        Self {
            patterns: patterns.iter().map(|p| compile(p)).collect(),
            purpose,
            priority,
            derive: None,
        }
    }

    fn with_deriver(mut self, derive: ValueDeriver) -> Self {
        self.derive = Some(derive);
        self
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(identifier))
    }
}

fn compile(pattern: &str) -> Regex {
    // All rules are case-insensitive; identifiers are lower-cased anyway.
    Regex::new(&format!("(?i){pattern}")).expect("built-in field pattern")
}

fn yes_no(flag: bool) -> Option<String> {
    Some(if flag { "Yes" } else { "No" }.to_string())
}

/// Ordered, immutable rule table. Constructed explicitly and handed to the
/// classifier, so tests can substitute their own.
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

impl PatternRegistry {
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// First deriver registered for a purpose, if any rule carries one.
    pub fn derived_value(
        &self,
        purpose: InferredPurpose,
        profile: &CandidateProfile,
    ) -> Option<String> {
        self.rules
            .iter()
            .find(|rule| rule.purpose == purpose && rule.derive.is_some())
            .and_then(|rule| rule.derive.and_then(|f| f(profile)))
    }

    pub fn from_rules(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// The standard job-application rule set.
    pub fn standard() -> Self {
        use InferredPurpose::*;

        let rules = vec![
            // Personal information
            PatternRule::new(
                &[
                    r"^first[\s_-]?name$",
                    r"^fname$",
                    r"^first$",
                    r"firstname",
                    r"inputfirst",
                    r"name\[first\]",
                ],
                FirstName,
                100,
            ),
            // Preferred name defaults to first name
            PatternRule::new(
                &[
                    r"^preferred[\s_-]?first[\s_-]?name$",
                    r"^preferred[\s_-]?name$",
                    r"^pref[\s_-]?first[\s_-]?name$",
                    r"^nickname$",
                    r"^preferred$",
                ],
                FirstName,
                95,
            ),
            PatternRule::new(
                &[
                    r"^last[\s_-]?name$",
                    r"^lname$",
                    r"^last$",
                    r"lastname",
                    r"inputlast",
                    r"name\[last\]",
                    r"surname",
                ],
                LastName,
                100,
            ),
            PatternRule::new(
                &[
                    r"^(full[\s_-]?name|name)$",
                    r"^your[\s_-]?name$",
                    r"^applicant[\s_-]?name$",
                ],
                FullName,
                80,
            )
            .with_deriver(|profile| Some(profile.full_name())),
            // Contact
            PatternRule::new(
                &[r"^email$", r"^e-?mail", r"^email[\s_-]?address$", r"inputemail", r"email\["],
                Email,
                100,
            ),
            PatternRule::new(
                &[
                    r"^phone$",
                    r"^telephone$",
                    r"^mobile$",
                    r"^phone[\s_-]?(number|no)",
                    r"^contact[\s_-]?number$",
                    r"inputphone",
                    r"^tel$",
                ],
                Phone,
                100,
            ),
            // Location
            PatternRule::new(
                &[r"^address$", r"^street[\s_-]?address$", r"^address[\s_-]?line"],
                Address,
                100,
            ),
            PatternRule::new(&[r"^city$", r"town"], City, 100),
            PatternRule::new(&[r"^state$", r"^province$", r"^region$"], State, 100),
            PatternRule::new(
                &[r"^(zip|postal)[\s_-]?code$", r"^postcode$", r"^zip$"],
                ZipCode,
                100,
            ),
            PatternRule::new(&[r"^country$", r"^nation$"], Country, 100),
            // Professional
            PatternRule::new(
                &[
                    r"current[\s_-]?(job[\s_-]?)?title",
                    r"^job[\s_-]?title$",
                    r"^title$",
                    r"^position$",
                    r"^role$",
                ],
                CurrentJobTitle,
                90,
            ),
            PatternRule::new(
                &[
                    r"current[\s_-]?company",
                    r"current[\s_-]?employer",
                    r"^company$",
                    r"^employer$",
                    r"^organization$",
                    r"^org$",
                ],
                CurrentCompany,
                90,
            ),
            PatternRule::new(
                &[
                    r"years?[\s_-]?(of[\s_-]?)?experience",
                    r"experience[\s_-]?years",
                    r"total[\s_-]?experience",
                ],
                YearsOfExperience,
                90,
            ),
            // Social / professional links
            PatternRule::new(
                &[
                    r"linkedin",
                    r"linked[\s_-]?in",
                    r"^li[\s_-]?profile",
                    r"urls?\[linkedin\]",
                    r"question_\d+.*linkedin",
                ],
                LinkedinUrl,
                100,
            ),
            PatternRule::new(&[r"github", r"git[\s_-]?hub", r"urls?\[github\]"], GithubUrl, 100),
            PatternRule::new(
                &[
                    r"portfolio",
                    r"personal[\s_-]?website",
                    r"^website$",
                    r"urls?\[(portfolio|other|website)\]",
                ],
                PortfolioUrl,
                90,
            ),
            // Education
            PatternRule::new(
                &[
                    r"^degree$",
                    r"education[\s_-]?level",
                    r"highest[\s_-]?degree",
                    r"qualification",
                ],
                HighestDegree,
                90,
            ),
            PatternRule::new(
                &[r"field[\s_-]?of[\s_-]?study", r"major", r"specialization", r"course"],
                FieldOfStudy,
                90,
            ),
            PatternRule::new(
                &[r"university", r"college", r"school", r"institution"],
                University,
                85,
            ),
            PatternRule::new(
                &[
                    r"graduation[\s_-]?year",
                    r"year[\s_-]?(of[\s_-]?)?graduation",
                    r"completed[\s_-]?year",
                ],
                GraduationYear,
                90,
            ),
            PatternRule::new(&[r"\bgpa\b", r"grade[\s_-]?point"], Gpa, 90),
            // Work authorization
            PatternRule::new(
                &[
                    r"work[\s_-]?authorization",
                    r"legally[\s_-]?authorized",
                    r"authorized[\s_-]?to[\s_-]?work",
                    r"eligible[\s_-]?to[\s_-]?work",
                ],
                WorkAuthorization,
                95,
            ),
            PatternRule::new(
                &[
                    r"require.*sponsor",
                    r"visa[\s_-]?sponsor",
                    r"need.*sponsor",
                    r"employment.*sponsor",
                ],
                RequiresSponsorship,
                95,
            )
            .with_deriver(|profile| yes_no(profile.requires_sponsorship)),
            // Relocation
            PatternRule::new(
                &[
                    r"willing[\s_-]?to[\s_-]?relocate",
                    r"able[\s_-]?to[\s_-]?relocate",
                    r"open[\s_-]?to[\s_-]?relocation",
                ],
                WillingToRelocate,
                95,
            )
            .with_deriver(|profile| yes_no(profile.willing_to_relocate)),
            PatternRule::new(
                &[r"location[\s_-]?preference", r"preferred[\s_-]?location"],
                PreferredWorkLocation,
                85,
            ),
            // Salary
            PatternRule::new(
                &[
                    r"expected[\s_-]?salary",
                    r"desired[\s_-]?salary",
                    r"salary[\s_-]?expectation",
                    r"compensation",
                ],
                ExpectedSalary,
                90,
            ),
            PatternRule::new(&[r"current[\s_-]?salary", r"present[\s_-]?salary"], CurrentSalary, 90),
            // Availability
            PatternRule::new(
                &[
                    r"notice[\s_-]?period",
                    r"availability",
                    r"start[\s_-]?date",
                    r"joining[\s_-]?date",
                    r"when[\s_-]?can[\s_-]?you[\s_-]?start",
                ],
                AvailableStartDate,
                85,
            ),
            // Additional information
            PatternRule::new(
                &[
                    r"cover[\s_-]?letter",
                    r"additional[\s_-]?information",
                    r"comments",
                    r"message",
                    r"tell[\s_-]?us[\s_-]?(more|about)",
                    r"why[\s_-]?",
                ],
                WhyThisCompany,
                70,
            ),
            // Diversity / EEO
            PatternRule::new(&[r"gender", r"\bsex\b"], Gender, 80),
            PatternRule::new(&[r"veteran", r"military"], VeteranStatus, 80),
            PatternRule::new(&[r"disability", r"disabled"], DisabilityStatus, 80),
            PatternRule::new(&[r"race", r"racial", r"ethnicity", r"ethnic"], Race, 80),
            // Skills
            PatternRule::new(
                &[r"technical[\s_-]?skills", r"skills", r"technologies"],
                TechnicalSkills,
                75,
            ),
            PatternRule::new(&[r"certifications?"], Certifications, 75),
            // Referral
            PatternRule::new(
                &[
                    r"hear[\s_-]?about[\s_-]?us",
                    r"how[\s_-]?did[\s_-]?you[\s_-]?hear",
                    r"referral",
                    r"referred[\s_-]?by",
                ],
                ReferralSource,
                70,
            ),
        ];

        Self { rules }
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_compiles() {
        let registry = PatternRegistry::standard();
        assert!(registry.rules().len() > 30);
    }

    #[test]
    fn test_rule_matching_is_case_insensitive() {
        let registry = PatternRegistry::standard();
        let first = &registry.rules()[0];
        assert!(first.matches("First_Name"));
        assert!(first.matches("fname"));
        assert!(!first.matches("company"));
    }

    #[test]
    fn test_deriver_projects_boolean_flags() {
        let registry = PatternRegistry::standard();
        let profile = CandidateProfile {
            requires_sponsorship: true,
            ..Default::default()
        };
        assert_eq!(
            registry.derived_value(InferredPurpose::RequiresSponsorship, &profile),
            Some("Yes".to_string())
        );
        assert_eq!(
            registry.derived_value(InferredPurpose::WillingToRelocate, &profile),
            Some("No".to_string())
        );
        // No deriver registered for plain attribute purposes.
        assert_eq!(registry.derived_value(InferredPurpose::Email, &profile), None);
    }
}
