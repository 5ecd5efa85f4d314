//! Local input validation
//!
//! Everything here runs before any network call. Failures are reported as
//! `BizlinkError::InvalidInput` carrying the exact message shown to users.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{BizlinkError, Result};

pub const INVALID_EMAIL: &str = "Invalid email format";
pub const WEAK_PASSWORD: &str =
    "Password must be at least 8 characters long and contain both letters and numbers";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const MISSING_FIELDS: &str = "Please fill in all fields";

/// Maximum bullets on one announcement
pub const MAX_REQUIREMENTS: usize = 5;

/// Maximum whitespace-separated words per bullet
pub const MAX_REQUIREMENT_WORDS: usize = 20;

const MIN_PASSWORD_LENGTH: usize = 8;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    // local@domain.tld with no whitespace and exactly one '@'
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("email pattern: {e}"))
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// At least 8 characters, ASCII letters and digits only, with at least one
/// of each
pub fn is_valid_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LENGTH
        && password.chars().all(|c| c.is_ascii_alphanumeric())
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn validate_email(email: &str) -> Result<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(BizlinkError::InvalidInput(INVALID_EMAIL.to_string()))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if is_valid_password(password) {
        Ok(())
    } else {
        Err(BizlinkError::InvalidInput(WEAK_PASSWORD.to_string()))
    }
}

pub fn validate_password_match(password: &str, confirm_password: &str) -> Result<()> {
    if password == confirm_password {
        Ok(())
    } else {
        Err(BizlinkError::InvalidInput(PASSWORD_MISMATCH.to_string()))
    }
}

/// Credential checks shared by login and registration
pub fn validate_credentials(email: &str, password: &str) -> Result<()> {
    validate_email(email)?;
    validate_password(password)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Check one announcement requirement/service bullet (already trimmed)
pub fn validate_requirement(requirement: &str) -> Result<()> {
    if requirement.is_empty() {
        return Err(BizlinkError::InvalidInput(
            "Requirement cannot be empty".to_string(),
        ));
    }

    let words = word_count(requirement);
    if words > MAX_REQUIREMENT_WORDS {
        return Err(BizlinkError::InvalidInput(format!(
            "Each requirement must be at most {} words (got {})",
            MAX_REQUIREMENT_WORDS, words
        )));
    }

    Ok(())
}

/// Check a requirement list received from the backend against the same
/// bounds the draft enforces; the error names the first violation
pub fn check_requirement_bounds(requirements: &[String]) -> std::result::Result<(), String> {
    if requirements.len() > MAX_REQUIREMENTS {
        return Err(format!(
            "{} requirements exceed the limit of {}",
            requirements.len(),
            MAX_REQUIREMENTS
        ));
    }

    match requirements
        .iter()
        .position(|r| word_count(r) > MAX_REQUIREMENT_WORDS)
    {
        Some(index) => Err(format!(
            "requirement {} exceeds {} words",
            index + 1,
            MAX_REQUIREMENT_WORDS
        )),
        None => Ok(()),
    }
}
