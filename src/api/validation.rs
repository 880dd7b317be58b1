//! Client-side checks run before any credentials leave the process.

use super::ApiError;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Check an email address has the shape `local@domain.tld`.
///
/// The local part allows letters, digits and `._%+-`; the domain allows
/// letters, digits, `.` and `-`, and must end in an alphabetic label of at
/// least two characters.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

/// Check password strength, returning the first rule it breaks.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let rule = if password.chars().count() < MIN_PASSWORD_LEN {
        "Password must be at least 8 characters long"
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        "Password must contain at least one uppercase letter"
    } else if !password.chars().any(|c| c.is_ascii_lowercase()) {
        "Password must contain at least one lowercase letter"
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        "Password must contain at least one digit"
    } else {
        return Ok(());
    };
    Err(ApiError::Validation(rule.to_string()))
}

/// Registration form as entered by the user.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Validate a registration form before it is submitted.
///
/// Checks run in the order a user would fix them: missing fields, password
/// confirmation, email format, then password strength.
pub fn validate_registration(form: &RegistrationForm) -> Result<(), ApiError> {
    let required = [
        &form.email,
        &form.password,
        &form.first_name,
        &form.last_name,
    ];
    if required.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::Validation("All fields are required".to_string()));
    }
    if form.password != form.confirm_password {
        return Err(ApiError::Validation("Passwords do not match".to_string()));
    }
    if !is_valid_email(form.email.trim()) {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }
    validate_password(&form.password)
}
