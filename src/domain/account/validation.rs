//! Account field validation

use thiserror::Error;

/// Errors that can occur while validating account fields
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountValidationError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Username is too short. Minimum length is {0} characters")]
    UsernameTooShort(usize),

    #[error("Username exceeds maximum length of {0} characters")]
    UsernameTooLong(usize),

    #[error("Username must start with a letter")]
    InvalidUsernameStart,

    #[error("Username contains invalid character: '{0}'. Only letters, digits, '_', '.' and '-' are allowed")]
    InvalidUsernameCharacter(char),

    #[error("Email address is malformed: '{0}'")]
    InvalidEmail(String),

    #[error("Email address exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Mobile number must have between {min} and {max} digits")]
    InvalidMobileLength { min: usize, max: usize },

    #[error("Mobile number contains invalid character: '{0}'")]
    InvalidMobileCharacter(char),

    #[error("Credential is too short. Minimum length is {0} characters")]
    CredentialTooShort(usize),

    #[error("Credential exceeds maximum length of {0} characters")]
    CredentialTooLong(usize),
}

const MIN_USERNAME_LENGTH: usize = 3;
pub(crate) const MAX_USERNAME_LENGTH: usize = 64;
pub(crate) const MAX_EMAIL_LENGTH: usize = 256;
const MIN_MOBILE_DIGITS: usize = 7;
const MAX_MOBILE_DIGITS: usize = 15;
const MIN_CREDENTIAL_LENGTH: usize = 4;
const MAX_CREDENTIAL_LENGTH: usize = 128;

/// Validate a username
///
/// Rules:
/// - 3 to 64 characters
/// - Must start with an ASCII letter
/// - Only ASCII letters, digits, underscores, dots and hyphens
pub fn validate_username(username: &str) -> Result<(), AccountValidationError> {
    let Some(first) = username.chars().next() else {
        return Err(AccountValidationError::EmptyUsername);
    };

    if username.len() < MIN_USERNAME_LENGTH {
        return Err(AccountValidationError::UsernameTooShort(MIN_USERNAME_LENGTH));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(AccountValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    if !first.is_ascii_alphabetic() {
        return Err(AccountValidationError::InvalidUsernameStart);
    }

    for c in username.chars() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '.' | '-') {
            return Err(AccountValidationError::InvalidUsernameCharacter(c));
        }
    }

    Ok(())
}

/// Validate an email address
///
/// This is a shape check only: one `@`, non-empty local part, and a domain
/// containing a dot that neither starts nor ends the domain. At most 256
/// characters.
pub fn validate_email(email: &str) -> Result<(), AccountValidationError> {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(AccountValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    let invalid = || AccountValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;

    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

/// Validate a mobile number: optional leading `+`, then 7 to 15 digits
pub fn validate_mobile(mobile: &str) -> Result<(), AccountValidationError> {
    let digits = mobile.strip_prefix('+').unwrap_or(mobile);

    if let Some(c) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(AccountValidationError::InvalidMobileCharacter(c));
    }

    if !(MIN_MOBILE_DIGITS..=MAX_MOBILE_DIGITS).contains(&digits.len()) {
        return Err(AccountValidationError::InvalidMobileLength {
            min: MIN_MOBILE_DIGITS,
            max: MAX_MOBILE_DIGITS,
        });
    }

    Ok(())
}

/// Validate a plaintext credential before it is hashed
pub fn validate_credential(credential: &str) -> Result<(), AccountValidationError> {
    let length = credential.chars().count();

    if length < MIN_CREDENTIAL_LENGTH {
        return Err(AccountValidationError::CredentialTooShort(MIN_CREDENTIAL_LENGTH));
    }

    if length > MAX_CREDENTIAL_LENGTH {
        return Err(AccountValidationError::CredentialTooLong(MAX_CREDENTIAL_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("owner").is_ok());
        assert!(validate_username("Illegible_Owner").is_ok());
        assert!(validate_username("jane.doe-2").is_ok());
    }

    #[test]
    fn test_empty_username() {
        assert_eq!(validate_username(""), Err(AccountValidationError::EmptyUsername));
    }

    #[test]
    fn test_username_length_bounds() {
        assert_eq!(
            validate_username("ab"),
            Err(AccountValidationError::UsernameTooShort(3))
        );
        assert_eq!(
            validate_username(&"a".repeat(65)),
            Err(AccountValidationError::UsernameTooLong(64))
        );
        assert!(validate_username(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn test_username_must_start_with_letter() {
        assert_eq!(
            validate_username("1owner"),
            Err(AccountValidationError::InvalidUsernameStart)
        );
        assert_eq!(
            validate_username("_owner"),
            Err(AccountValidationError::InvalidUsernameStart)
        );
    }

    #[test]
    fn test_username_invalid_character() {
        assert_eq!(
            validate_username("own er"),
            Err(AccountValidationError::InvalidUsernameCharacter(' '))
        );
        assert_eq!(
            validate_username("owner@home"),
            Err(AccountValidationError::InvalidUsernameCharacter('@'))
        );
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("owner@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("owner").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("owner@localhost").is_err());
        assert!(validate_email("owner@@example.com").is_err());
        assert!(validate_email("owner@.com").is_err());
        assert!(validate_email("own er@example.com").is_err());
    }

    #[test]
    fn test_email_length_matches_column_width() {
        let longest = format!("{}@x.io", "a".repeat(MAX_EMAIL_LENGTH - 5));
        assert_eq!(longest.len(), MAX_EMAIL_LENGTH);
        assert!(validate_email(&longest).is_ok());

        let too_long = format!("{}@x.io", "a".repeat(300));
        assert_eq!(
            validate_email(&too_long),
            Err(AccountValidationError::EmailTooLong(MAX_EMAIL_LENGTH))
        );
    }

    #[test]
    fn test_mobile_validation() {
        assert!(validate_mobile("09301234567").is_ok());
        assert!(validate_mobile("+989301234567").is_ok());

        assert_eq!(
            validate_mobile("12345"),
            Err(AccountValidationError::InvalidMobileLength { min: 7, max: 15 })
        );
        assert_eq!(
            validate_mobile("0930-123-4567"),
            Err(AccountValidationError::InvalidMobileCharacter('-'))
        );
        assert!(validate_mobile("+").is_err());
    }

    #[test]
    fn test_credential_validation() {
        assert!(validate_credential("owner").is_ok());
        assert_eq!(
            validate_credential("abc"),
            Err(AccountValidationError::CredentialTooShort(4))
        );
        assert_eq!(
            validate_credential(&"x".repeat(129)),
            Err(AccountValidationError::CredentialTooLong(128))
        );
    }
}
