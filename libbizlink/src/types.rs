//! Core domain types for Bizlink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use zeroize::Zeroize;

use crate::error::{BizlinkError, Result};
use crate::validation;

/// Bearer token issued by the backend
///
/// Zeroed on drop and redacted from debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

impl Drop for AuthToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyRole {
    Admin,
    User,
}

/// A company account as returned by `/api/companies` and the auth endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub role: Option<CompanyRole>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Short company reference embedded in announcements and projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub industry: Option<String>,
}

/// The four profile fields replaced wholesale by `set_company_info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub email: String,
    pub industry: String,
    pub description: String,
}

impl From<&Company> for CompanyInfo {
    fn from(company: &Company) -> Self {
        Self {
            name: company.name.clone(),
            email: company.email.clone(),
            industry: company.industry.clone(),
            description: company.description.clone(),
        }
    }
}

impl CompanyInfo {
    /// Check the profile edit form: every field must be non-blank
    pub fn validate(&self) -> Result<()> {
        let fields = [
            (&self.name, "Company name is required"),
            (&self.industry, "Industry is required"),
            (&self.email, "Email is required"),
            (&self.description, "Company description is required"),
        ];

        for (value, message) in fields {
            if value.trim().is_empty() {
                return Err(BizlinkError::InvalidInput(message.to_string()));
            }
        }

        Ok(())
    }
}

/// Body of `PUT /api/companies/me` and `PUT /api/companies/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<CompanyInfo> for UpdateCompanyRequest {
    fn from(info: CompanyInfo) -> Self {
        Self {
            name: Some(info.name),
            industry: Some(info.industry),
            email: Some(info.email),
            description: Some(info.description),
            ..Self::default()
        }
    }
}

/// Body of `POST /api/auth/register`
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub description: String,
    pub industry: String,
    pub founded_year: i32,
    pub services: Vec<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .field("name", &self.name)
            .field("industry", &self.industry)
            .field("founded_year", &self.founded_year)
            .finish_non_exhaustive()
    }
}

/// Optional company details collected by the second registration step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyRegistration {
    pub name: String,
    pub description: String,
    pub industry: String,
    pub founded_year: Option<i32>,
    pub services: Vec<String>,
}

/// Successful login/registration: the issued token and the company account
#[derive(Debug, Clone)]
pub struct AuthPayload {
    pub token: AuthToken,
    pub company: Company,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    #[default]
    Search,
    Offer,
}

impl std::fmt::Display for AnnouncementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnouncementKind::Search => write!(f, "search"),
            AnnouncementKind::Offer => write!(f, "offer"),
        }
    }
}

impl std::str::FromStr for AnnouncementKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "search" => Ok(AnnouncementKind::Search),
            "offer" => Ok(AnnouncementKind::Offer),
            _ => Err(format!(
                "Invalid announcement type: '{}'. Valid options: search, offer",
                s
            )),
        }
    }
}

/// A company-posted listing
///
/// This is the single wire shape for announcements; the backend field
/// `listOfRequirementsOrServices` maps to `requirements`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    #[serde(rename = "listOfRequirementsOrServices", default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub company: Option<CompanySummary>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Announcement {
    /// Owning company, from either the flat id or the embedded summary
    pub fn owner_id(&self) -> Option<i64> {
        self.company_id
            .or_else(|| self.company.as_ref().map(|company| company.id))
    }
}

/// Body of `POST /api/announcements` and `PUT /api/announcements/:id`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementInput {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    #[serde(rename = "listOfRequirementsOrServices")]
    pub requirements: Vec<String>,
}

/// Announcement creation form
///
/// Holds at most `MAX_REQUIREMENTS` entries of at most
/// `MAX_REQUIREMENT_WORDS` words each. A rejected addition leaves the list
/// untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnouncementDraft {
    pub title: String,
    pub description: String,
    pub kind: AnnouncementKind,
    requirements: Vec<String>,
}

impl AnnouncementDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>, kind: AnnouncementKind) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind,
            requirements: Vec::new(),
        }
    }

    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    pub fn can_add_requirement(&self) -> bool {
        self.requirements.len() < validation::MAX_REQUIREMENTS
    }

    /// Append a requirement/service bullet (trimmed)
    pub fn add_requirement(&mut self, requirement: &str) -> Result<()> {
        let requirement = requirement.trim();
        validation::validate_requirement(requirement)?;

        if !self.can_add_requirement() {
            return Err(BizlinkError::InvalidInput(format!(
                "At most {} requirements or services are allowed",
                validation::MAX_REQUIREMENTS
            )));
        }

        self.requirements.push(requirement.to_string());
        Ok(())
    }

    /// Remove the bullet at `index`; out-of-range indexes are ignored
    pub fn remove_requirement(&mut self, index: usize) -> Option<String> {
        (index < self.requirements.len()).then(|| self.requirements.remove(index))
    }

    /// Validate and convert into a request body
    pub fn into_input(self) -> Result<AnnouncementInput> {
        if self.title.trim().is_empty() {
            return Err(BizlinkError::InvalidInput("Title is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(BizlinkError::InvalidInput(
                "Description is required".to_string(),
            ));
        }

        Ok(AnnouncementInput {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            kind: self.kind,
            requirements: self.requirements,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStage {
    Planning,
    Development,
    BetaTest,
    AlphaTest,
    Production,
}

impl ProjectStage {
    pub const ALL: [ProjectStage; 5] = [
        ProjectStage::Planning,
        ProjectStage::Development,
        ProjectStage::BetaTest,
        ProjectStage::AlphaTest,
        ProjectStage::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStage::Planning => "planning",
            ProjectStage::Development => "development",
            ProjectStage::BetaTest => "beta_test",
            ProjectStage::AlphaTest => "alpha_test",
            ProjectStage::Production => "production",
        }
    }
}

impl std::fmt::Display for ProjectStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        ProjectStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid project stage: '{}'. Valid options: planning, development, beta_test, alpha_test, production",
                    s
                )
            })
    }
}

/// Accept either a bare company name or an embedded `{id, name}` object
fn company_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CompanyRef {
        Name(String),
        Summary(CompanySummary),
    }

    Ok(match CompanyRef::deserialize(deserializer)? {
        CompanyRef::Name(name) => name,
        CompanyRef::Summary(summary) => summary.name,
    })
}

/// A partner project between a customer and an executor company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub description: String,
    pub stage: ProjectStage,
    #[serde(deserialize_with = "company_name")]
    pub customer_company: String,
    #[serde(deserialize_with = "company_name")]
    pub executor_company: String,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub expected_result: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Advance `updated_at`; it never moves backwards nor below `created_at`
    fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at).max(self.created_at);
    }

    pub fn update_stage(&mut self, stage: ProjectStage) {
        self.stage = stage;
        self.touch();
    }

    pub fn update_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.touch();
    }

    pub fn add_function(&mut self, function: impl Into<String>) {
        self.functions.push(function.into());
        self.touch();
    }

    /// Remove the first matching entry; returns false (and leaves
    /// `updated_at` alone) when nothing matched
    pub fn remove_function(&mut self, function: &str) -> bool {
        match self.functions.iter().position(|f| f == function) {
            Some(index) => {
                self.functions.remove(index);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Editable fields as a request body
    pub fn to_input(&self) -> ProjectInput {
        ProjectInput {
            name: self.name.clone(),
            status: self.status.clone(),
            description: self.description.clone(),
            stage: self.stage,
            customer_company: self.customer_company.clone(),
            executor_company: self.executor_company.clone(),
            functions: self.functions.clone(),
            expected_result: self.expected_result.clone(),
        }
    }
}

/// Body of `POST /api/projects` and `PUT /api/projects/:id`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub name: String,
    pub status: String,
    pub description: String,
    pub stage: ProjectStage,
    pub customer_company: String,
    pub executor_company: String,
    pub functions: Vec<String>,
    pub expected_result: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSource {
    pub id: Option<String>,
    pub name: String,
}

/// One article from the news aggregation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub source: NewsSource,
    pub author: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub content: Option<String>,
}

impl NewsArticle {
    pub fn has_image(&self) -> bool {
        self.url_to_image
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}
