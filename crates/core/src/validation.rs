//! Input validation rules for account fields.
//!
//! These mirror the constraints enforced on the signup and password
//! forms. Each function returns `Ok(())` or a human-readable message
//! suitable for a 400 response body.

/// Minimum username length.
pub const USERNAME_MIN: usize = 5;
/// Maximum username length.
pub const USERNAME_MAX: usize = 20;
/// Minimum password length.
pub const PASSWORD_MIN: usize = 8;
/// Maximum password length.
pub const PASSWORD_MAX: usize = 255;
/// Maximum email length.
pub const EMAIL_MAX: usize = 255;

/// Validate a username: 5-20 characters, letters, digits, and underscores only.
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < USERNAME_MIN {
        return Err(format!(
            "Username must be at least {USERNAME_MIN} characters long"
        ));
    }
    if len > USERNAME_MAX {
        return Err(format!(
            "Username must be at most {USERNAME_MAX} characters long"
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err("Username must only contain letters, numbers, and underscores".to_string());
    }
    Ok(())
}

/// Validate password strength: 8-255 characters with at least one
/// lowercase letter, one uppercase letter, and one digit.
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        return Err(format!(
            "Password must be at least {PASSWORD_MIN} characters long"
        ));
    }
    if len > PASSWORD_MAX {
        return Err(format!(
            "Password must be at most {PASSWORD_MAX} characters long"
        ));
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(
            "Password must contain at least one lowercase letter, one uppercase letter, and one number"
                .to_string(),
        );
    }
    Ok(())
}

/// Validate an email address shape: a single `@` with a non-empty local
/// part and a dotted domain, at most 255 characters.
///
/// Intentionally permissive; the address is never used for delivery,
/// only as a unique directory attribute.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.chars().count() > EMAIL_MAX {
        return Err(format!("Email must be at most {EMAIL_MAX} characters long"));
    }
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}
