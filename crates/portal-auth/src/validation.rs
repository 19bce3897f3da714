//! Local checks run before any credential leaves the process.

use crate::ErrorMessage;
use portal_api::Registration;
use regex::Regex;
use std::sync::OnceLock;

pub const MIN_PASSWORD_LEN: usize = 8;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

/// At least [`MIN_PASSWORD_LEN`] characters with a letter and a digit.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ErrorMessage> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ErrorMessage::VALIDATION_REQUIRED_FIELD);
    }
    if !is_valid_email(email) {
        return Err(ErrorMessage::VALIDATION_INVALID_EMAIL);
    }
    Ok(())
}

pub fn validate_registration(registration: &Registration) -> Result<(), ErrorMessage> {
    let required = [
        registration.name.as_str(),
        registration.email.as_str(),
        registration.company.as_str(),
    ];
    if required.iter().any(|v| v.trim().is_empty()) || registration.password.is_empty() {
        return Err(ErrorMessage::VALIDATION_REQUIRED_FIELD);
    }
    if !is_valid_email(&registration.email) {
        return Err(ErrorMessage::VALIDATION_INVALID_EMAIL);
    }
    if !is_strong_password(&registration.password) {
        return Err(ErrorMessage::VALIDATION_WEAK_PASSWORD);
    }
    Ok(())
}
