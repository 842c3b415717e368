/// Request field validators
///
/// Shape checks run by the HTTP layer before a request reaches the auth
/// service:
/// 1. Length limits on every field
/// 2. Lower-case, well formed email addresses
/// 3. Ten-digit contact numbers
/// 4. Names without control characters

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 50;
const MAX_PASSWORD_LENGTH: usize = 128; // bcrypt only reads 72 bytes anyway

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)+$").unwrap();
    static ref CONTACT_NUMBER_REGEX: Regex = Regex::new(r"^[0-9]{10}$").unwrap();
}

/// Validates an email address and returns it trimmed
///
/// Only lower-case addresses are accepted.
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_string())
}

/// Validates a display name and returns it trimmed
pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }

    let length = trimmed.chars().count();
    if length < MIN_NAME_LENGTH {
        return Err(ValidationError::TooShort("name", MIN_NAME_LENGTH));
    }

    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("name", MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent("name"));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_contact_number(contact_number: &str) -> Result<String, ValidationError> {
    let trimmed = contact_number.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("contact number"));
    }

    if !CONTACT_NUMBER_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("contact number"));
    }

    Ok(trimmed.to_string())
}

/// Presence and length check only; strength is judged by the auth service
pub fn is_present_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("user@example.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
        assert_eq!(is_valid_email("  jane@example.com ").unwrap(), "jane@example.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
        assert!(is_valid_email("user@localhost").is_err());
    }

    #[test]
    fn test_uppercase_email_rejected() {
        assert_eq!(
            is_valid_email("Jane@Example.com"),
            Err(ValidationError::InvalidFormat("email"))
        );
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        assert!(is_valid_email("a@b").is_err()); // Too short
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("Jane Doe").is_ok());
        assert!(is_valid_name("Jean-Pierre").is_ok());
        assert!(is_valid_name("O'Brien").is_ok());
    }

    #[test]
    fn test_name_length_limits() {
        assert!(is_valid_name("").is_err());
        assert!(is_valid_name("J").is_err());
        assert!(is_valid_name(&"a".repeat(51)).is_err());
        assert!(is_valid_name(&"a".repeat(50)).is_ok());
    }

    #[test]
    fn test_control_characters() {
        assert!(is_valid_name("Name\0with\0null").is_err());
        assert!(is_valid_name("Line\nbreak").is_err());
    }

    #[test]
    fn test_contact_number() {
        assert!(is_valid_contact_number("9876543210").is_ok());
        assert!(is_valid_contact_number("987654321").is_err());
        assert!(is_valid_contact_number("98765432101").is_err());
        assert!(is_valid_contact_number("98765abcde").is_err());
        assert!(is_valid_contact_number("").is_err());
    }

    #[test]
    fn test_password_presence() {
        assert!(is_present_password("x").is_ok());
        assert!(is_present_password("").is_err());
        assert!(is_present_password(&"a".repeat(129)).is_err());
    }
}
