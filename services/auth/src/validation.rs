//! Input validation utilities for account creation

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ValidationError;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::new("username", "Username is required"));
    }

    if username.len() < 3 {
        return Err(ValidationError::new(
            "username",
            "Username must be at least 3 characters long",
        ));
    }

    if username.len() > 32 {
        return Err(ValidationError::new(
            "username",
            "Username must be at most 32 characters long",
        ));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(ValidationError::new(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }

    if email.len() > 254 {
        return Err(ValidationError::new(
            "email",
            "Email must be at most 254 characters long",
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ValidationError::new("email", "Invalid email format"));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("password", "Password is required"));
    }

    if password.chars().count() < 8 {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters long",
        ));
    }

    if password.chars().count() > 128 {
        return Err(ValidationError::new(
            "password",
            "Password must be at most 128 characters long",
        ));
    }

    Ok(())
}

/// Validate every field of a signup request, reporting the first failure
pub fn validate_signup(username: &str, password: &str, email: &str) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_password(password)?;
    validate_email(email)
}

/// Require a non-blank free-text field
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, format!("{} is required", field)));
    }
    Ok(())
}
