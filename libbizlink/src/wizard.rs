//! Two-step registration wizard
//!
//! `Credentials` collects email and passwords, `CompanyDetails` collects the
//! company profile. `next()` moves forward once the first step is filled in,
//! `back()` returns without losing anything, and `submit()` hands the
//! collected data to [`crate::context::AppContext::register`].

use crate::error::{BizlinkError, Result};
use crate::types::CompanyRegistration;
use crate::validation::{self, MISSING_FIELDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Credentials,
    CompanyDetails,
}

/// Everything `AppContext::register` needs
#[derive(Clone, PartialEq)]
pub struct RegistrationSubmission {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub company: CompanyRegistration,
}

impl std::fmt::Debug for RegistrationSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationSubmission")
            .field("email", &self.email)
            .field("company", &self.company)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct RegistrationWizard {
    step: WizardStep,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub company: CompanyRegistration,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Credentials,
            email: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            company: CompanyRegistration::default(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Leave the credentials step
    ///
    /// Requires all three fields and matching passwords. Calling it on the
    /// details step does nothing.
    pub fn next(&mut self) -> Result<()> {
        if self.step == WizardStep::CompanyDetails {
            return Ok(());
        }

        if [&self.email, &self.password, &self.confirm_password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(BizlinkError::InvalidInput(MISSING_FIELDS.to_string()));
        }

        validation::validate_password_match(&self.password, &self.confirm_password)?;

        self.step = WizardStep::CompanyDetails;
        Ok(())
    }

    pub fn back(&mut self) {
        self.step = WizardStep::Credentials;
    }

    /// Finish the wizard; only valid on the details step with name,
    /// industry and description filled in
    pub fn submit(&self) -> Result<RegistrationSubmission> {
        if self.step != WizardStep::CompanyDetails {
            return Err(BizlinkError::InvalidInput(
                "Complete the account step before submitting".to_string(),
            ));
        }

        if [
            &self.company.name,
            &self.company.industry,
            &self.company.description,
        ]
        .iter()
        .any(|field| field.trim().is_empty())
        {
            return Err(BizlinkError::InvalidInput(MISSING_FIELDS.to_string()));
        }

        Ok(RegistrationSubmission {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
            company: CompanyRegistration {
                name: self.company.name.trim().to_string(),
                description: self.company.description.trim().to_string(),
                industry: self.company.industry.trim().to_string(),
                founded_year: self.company.founded_year,
                services: self.company.services.clone(),
            },
        })
    }
}
