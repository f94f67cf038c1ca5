use serde::{Deserialize, Serialize};

/// Declared kind of a form control, after inspection and re-typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Number,
    Url,
    Textarea,
    Select,
    Radio,
    RadioGroup,
    Checkbox,
    CheckboxGroup,
    File,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Tel => "tel",
            FieldKind::Number => "number",
            FieldKind::Url => "url",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::RadioGroup => "radio-group",
            FieldKind::Checkbox => "checkbox",
            FieldKind::CheckboxGroup => "checkbox-group",
            FieldKind::File => "file",
        }
    }

    /// Plain single-line or free-text inputs are filled before riskier controls.
    pub fn is_basic_input(&self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::Tel
                | FieldKind::Email
                | FieldKind::Url
                | FieldKind::Number
                | FieldKind::Textarea
        )
    }
}

/// One choice exposed by a select, radio group, or checkbox group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldOption {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub checked: bool,
}

impl FieldOption {
    /// The human-readable text for this option, falling back to its value.
    pub fn display(&self) -> &str {
        if self.label.is_empty() {
            &self.value
        } else {
            &self.label
        }
    }
}

/// What a form field is believed to be asking about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InferredPurpose {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    Address,
    City,
    State,
    ZipCode,
    Country,
    CurrentCompany,
    CurrentJobTitle,
    YearsOfExperience,
    LinkedinUrl,
    GithubUrl,
    PortfolioUrl,
    WebsiteUrl,
    HighestDegree,
    University,
    GraduationYear,
    FieldOfStudy,
    Gpa,
    ExpectedSalary,
    CurrentSalary,
    NoticePeriod,
    WorkAuthorization,
    RequiresSponsorship,
    WillingToRelocate,
    PreferredWorkLocation,
    AvailableStartDate,
    TechnicalSkills,
    Certifications,
    Resume,
    CoverLetter,
    WhyThisCompany,
    CareerGoals,
    ReferralSource,
    HearAboutUs,
    VeteranStatus,
    DisabilityStatus,
    Gender,
    Race,
    /// No rule recognized the field; the resolver's fallback tiers take over.
    #[default]
    Unmapped,
}

impl InferredPurpose {
    pub fn is_unmapped(&self) -> bool {
        matches!(self, InferredPurpose::Unmapped)
    }
}

/// Raw observation of one form control, extracted once per run.
///
/// Radio buttons and checkboxes sharing a name arrive pre-grouped as a single
/// descriptor carrying the group's option list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub selector: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub data_qa: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    /// Combobox-like widget whose option panel needs the interaction ladder.
    #[serde(default)]
    pub dropdown_like: bool,
    /// Attached by the classifier; never mutated afterward.
    #[serde(default)]
    pub purpose: InferredPurpose,
}

impl FieldDescriptor {
    /// Identifier strings in classification order: name, label, placeholder,
    /// auxiliary tag. Lower-cased, empties skipped.
    pub fn identifiers(&self) -> Vec<String> {
        [&self.name, &self.label, &self.placeholder, &self.data_qa]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect()
    }

    /// All identifier text joined, for keyword scans.
    pub fn identifier_text(&self) -> String {
        self.identifiers().join(" ")
    }

    /// The question text shown to the candidate, best-effort.
    pub fn question_text(&self) -> &str {
        if !self.label.is_empty() {
            &self.label
        } else if !self.placeholder.is_empty() {
            &self.placeholder
        } else {
            &self.name
        }
    }

    /// Option display texts, for generation requests and auto-selection.
    pub fn option_texts(&self) -> Vec<String> {
        self.options.iter().map(|o| o.display().to_string()).collect()
    }
}

/// The final answer to place into one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Text(String),
    /// Multi-select answers, one entry per option to check.
    Options(Vec<String>),
}

impl ResolvedValue {
    pub fn text(value: impl Into<String>) -> Self {
        ResolvedValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ResolvedValue::Text(s) => s.is_empty(),
            ResolvedValue::Options(v) => v.is_empty(),
        }
    }

    /// Stringified form, as remembered for conditional logic and reporting.
    pub fn display(&self) -> String {
        match self {
            ResolvedValue::Text(s) => s.clone(),
            ResolvedValue::Options(v) => v.join(", "),
        }
    }
}

impl From<&str> for ResolvedValue {
    fn from(value: &str) -> Self {
        ResolvedValue::Text(value.to_string())
    }
}

impl From<String> for ResolvedValue {
    fn from(value: String) -> Self {
        ResolvedValue::Text(value)
    }
}
