//! Shared validation utilities
//!
//! ```rust,ignore
//! validate_name(&command.name, 64)?;
//! validate_email(&command.email)?;
//! validate_password(&command.password)?;
//! ```

use thiserror::Error;

use super::password::MAX_PASSWORD_LENGTH;

/// Minimum password length accepted at creation.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("{field} is required and cannot be empty")]
    Required { field: &'static str },

    #[error("{field} must be at most {max_length} characters")]
    TooLong {
        field: &'static str,
        max_length: usize,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailValidationError {
    #[error("Email is required")]
    Required,

    #[error("Email must be at most 255 characters")]
    TooLong,

    #[error("Email address is not valid")]
    InvalidFormat,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordValidationError {
    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    TooShort,

    #[error("Password must be at most {} characters", MAX_PASSWORD_LENGTH)]
    TooLong,
}

/// Validate a required text field
///
/// # Rules
/// - Must not be empty (after trimming whitespace)
/// - Must not exceed max_length characters
pub fn validate_name(
    value: &str,
    field: &'static str,
    max_length: usize,
) -> Result<(), NameValidationError> {
    if value.trim().is_empty() {
        return Err(NameValidationError::Required { field });
    }

    if value.chars().count() > max_length {
        return Err(NameValidationError::TooLong { field, max_length });
    }

    Ok(())
}

/// Validate an email address
///
/// Structural check only: one `@`, a non-empty local part, and a dotted
/// domain without whitespace.
pub fn validate_email(email: &str) -> Result<(), EmailValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(EmailValidationError::Required);
    }

    if email.len() > 255 {
        return Err(EmailValidationError::TooLong);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(EmailValidationError::InvalidFormat);
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');

    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(EmailValidationError::InvalidFormat);
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), PasswordValidationError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("ops-admins", "Name", 64).is_ok());
        assert_eq!(
            validate_name("   ", "Name", 64),
            Err(NameValidationError::Required { field: "Name" })
        );
        assert_eq!(
            validate_name(&"a".repeat(65), "Name", 64),
            Err(NameValidationError::TooLong {
                field: "Name",
                max_length: 64
            })
        );
    }

    #[test]
    fn test_validate_email() {
        for valid in ["ops@example.com", "first.last@sub.example.org"] {
            assert!(validate_email(valid).is_ok(), "{valid}");
        }

        assert_eq!(validate_email(""), Err(EmailValidationError::Required));
        for invalid in ["no-at-sign", "@example.com", "a@localhost", "a@b@c.com", "a b@c.com", "a@.com"] {
            assert_eq!(
                validate_email(invalid),
                Err(EmailValidationError::InvalidFormat),
                "{invalid}"
            );
        }
    }

    #[test]
    fn test_validate_password() {
        assert_eq!(validate_password("short"), Err(PasswordValidationError::TooShort));
        assert!(validate_password("long enough").is_ok());
        assert_eq!(
            validate_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)),
            Err(PasswordValidationError::TooLong)
        );
    }
}
